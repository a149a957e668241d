use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::entry::{FieldChange, FieldName, HistoryEntry};
use crate::database::models::SubmissionData;
use crate::types::RiskLevel;

/// A proposed old/new pair for one field, not yet compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedChange {
    pub field: FieldName,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Ordered set of proposed field changes for one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<ProposedChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(
        mut self,
        field: FieldName,
        old_value: Option<impl Into<String>>,
        new_value: Option<impl Into<String>>,
    ) -> Self {
        self.changes.push(ProposedChange {
            field,
            old_value: old_value.map(Into::into),
            new_value: new_value.map(Into::into),
        });
        self
    }

    pub fn risk(self, old: RiskLevel, new: RiskLevel) -> Self {
        self.field(FieldName::Risk, Some(old.as_str()), Some(new.as_str()))
    }

    pub fn sensitive_info(self, old: Option<&str>, new: Option<&str>) -> Self {
        self.field(FieldName::SensitiveInfo, old, new)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProposedChange> {
        self.changes.iter()
    }
}

/// Trims a value and folds blank strings into "absent".
pub fn normalize(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Diffs tracked fields and appends history entries.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    tracked: Vec<FieldName>,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::with_fields([FieldName::Risk, FieldName::SensitiveInfo])
    }
}

impl HistoryLedger {
    pub fn with_fields(fields: impl IntoIterator<Item = FieldName>) -> Self {
        Self { tracked: fields.into_iter().collect() }
    }

    pub fn tracks(&self, field: &FieldName) -> bool {
        self.tracked.contains(field)
    }

    /// Field-level changes that actually differ, in the order supplied.
    /// Untracked fields are ignored.
    pub fn diff(&self, changes: &ChangeSet) -> Vec<FieldChange> {
        changes
            .iter()
            .filter(|proposed| self.tracks(&proposed.field))
            .filter_map(|proposed| {
                let old = normalize(proposed.old_value.as_deref());
                let new = normalize(proposed.new_value.as_deref());
                (old != new).then(|| FieldChange {
                    field: proposed.field.clone(),
                    old_value: old.unwrap_or_default().to_string(),
                    new_value: new.unwrap_or_default().to_string(),
                })
            })
            .collect()
    }

    pub fn apply_change(
        &self,
        payload: SubmissionData,
        actor_id: Uuid,
        actor_name: &str,
        changes: &ChangeSet,
    ) -> SubmissionData {
        self.apply_change_at(payload, actor_id, actor_name, changes, Utc::now())
    }

    /// Appends one entry covering every differing field, or hands the payload
    /// back untouched when nothing differs. Other payload keys are preserved.
    pub fn apply_change_at(
        &self,
        mut payload: SubmissionData,
        actor_id: Uuid,
        actor_name: &str,
        changes: &ChangeSet,
        at: DateTime<Utc>,
    ) -> SubmissionData {
        let recorded = self.diff(changes);
        if recorded.is_empty() {
            return payload;
        }

        payload.history.push(HistoryEntry {
            changed_by_id: actor_id,
            changed_by_name: actor_name.to_string(),
            changed_at: at,
            changes: recorded,
        });
        payload
    }
}
