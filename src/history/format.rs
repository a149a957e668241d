use super::entry::{FieldChange, FieldName, HistoryEntry};

/// Characters of a sensitive value shown in unredacted previews.
pub const PREVIEW_CHARS: usize = 20;
pub const EMPTY_PLACEHOLDER: &str = "(empty)";
pub const REDACTED_DESCRIPTION: &str = "internal notes";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// One line per entry, oldest first. Timestamps render in UTC.
pub fn format_for_display(history: &[HistoryEntry], redact_sensitive: bool) -> Vec<String> {
    history
        .iter()
        .map(|entry| format_entry(entry, redact_sensitive))
        .collect()
}

pub fn format_entry(entry: &HistoryEntry, redact_sensitive: bool) -> String {
    let date = entry.changed_at.format(DATE_FORMAT);
    let time = entry.changed_at.format(TIME_FORMAT);

    let descriptions: Vec<String> = entry
        .changes
        .iter()
        .filter_map(|change| describe(change, redact_sensitive))
        .collect();

    if descriptions.is_empty() {
        return format!("{} made changes on {} at {}", entry.changed_by_name, date, time);
    }

    format!(
        "{} changed {} on {} at {}",
        entry.changed_by_name,
        join_descriptions(&descriptions),
        date,
        time
    )
}

fn describe(change: &FieldChange, redact_sensitive: bool) -> Option<String> {
    match change.field {
        FieldName::Risk => Some(format!(
            "risk from '{}' to '{}'",
            change.old_value, change.new_value
        )),
        FieldName::SensitiveInfo if redact_sensitive => Some(REDACTED_DESCRIPTION.to_string()),
        FieldName::SensitiveInfo => Some(format!(
            "{} from '{}' to '{}'",
            REDACTED_DESCRIPTION,
            preview(&change.old_value),
            preview(&change.new_value)
        )),
        FieldName::Other(_) => None,
    }
}

fn preview(value: &str) -> String {
    if value.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }

    let mut chars = value.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// "a", "a and b", "a, b and c"
fn join_descriptions(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    const SECRET_OLD: &str = "supplier under federal investigation";
    const SECRET_NEW: &str = "cleared by counsel";

    fn entry(changes: Vec<FieldChange>) -> HistoryEntry {
        HistoryEntry {
            changed_by_id: Uuid::new_v4(),
            changed_by_name: "Director One".to_string(),
            changed_at: Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap(),
            changes,
        }
    }

    fn change(field: FieldName, old: &str, new: &str) -> FieldChange {
        FieldChange { field, old_value: old.into(), new_value: new.into() }
    }

    #[test]
    fn risk_line_uses_fixed_date_format() {
        let lines = format_for_display(&[entry(vec![change(FieldName::Risk, "LOW", "HIGH")])], false);
        assert_eq!(
            lines,
            vec!["Director One changed risk from 'LOW' to 'HIGH' on 2024-03-09 at 07:05:03"]
        );
    }

    #[test]
    fn redacted_output_never_leaks_sensitive_text() {
        let history = [entry(vec![
            change(FieldName::Risk, "NONE", "MEDIUM"),
            change(FieldName::SensitiveInfo, SECRET_OLD, SECRET_NEW),
        ])];

        let lines = format_for_display(&history, true);
        assert_eq!(
            lines[0],
            "Director One changed risk from 'NONE' to 'MEDIUM' and internal notes on 2024-03-09 at 07:05:03"
        );
        for line in &lines {
            assert!(!line.contains("supplier"));
            assert!(!line.contains("counsel"));
        }
    }

    #[test]
    fn unredacted_output_shows_truncated_previews() {
        let history = [entry(vec![change(FieldName::SensitiveInfo, SECRET_OLD, SECRET_NEW)])];
        let lines = format_for_display(&history, false);
        assert_eq!(
            lines[0],
            "Director One changed internal notes from 'supplier under feder...' to 'cleared by counsel' on 2024-03-09 at 07:05:03"
        );
    }

    #[test]
    fn empty_values_use_placeholder() {
        let history = [entry(vec![change(FieldName::SensitiveInfo, "", "new note")])];
        assert!(format_for_display(&history, false)[0].contains("from '(empty)' to 'new note'"));
    }

    #[test]
    fn untracked_only_entries_fall_back() {
        let history = [entry(vec![change(FieldName::Other("title".into()), "a", "b")])];
        assert_eq!(
            format_for_display(&history, false),
            vec!["Director One made changes on 2024-03-09 at 07:05:03"]
        );
    }

    #[test]
    fn preserves_stored_order() {
        let mut first = entry(vec![change(FieldName::Risk, "NONE", "LOW")]);
        first.changed_by_name = "First".into();
        let mut second = entry(vec![change(FieldName::Risk, "LOW", "HIGH")]);
        second.changed_by_name = "Second".into();

        let lines = format_for_display(&[first, second], true);
        assert!(lines[0].starts_with("First "));
        assert!(lines[1].starts_with("Second "));
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let accented = "é".repeat(25);
        let shown = preview(&accented);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn joins_three_descriptions() {
        let parts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(join_descriptions(&parts), "a, b and c");
    }
}
