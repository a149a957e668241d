use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::SubmissionListing;
use crate::history::{format_for_display, HistoryEntry};
use crate::permissions::{self, PermissionContext};
use crate::services::TagGroup;
use crate::types::RiskLevel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A submission as one particular viewer may see it.
///
/// `sensitive_info` and the raw `history` entries are only present when the
/// viewer may read sensitive data; `history_display` is always present and
/// redacted otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionView {
    pub id: Uuid,
    pub tag_name: String,
    pub risk: RiskLevel,
    pub organization_id: Uuid,
    pub organization_name: String,
    pub author: AuthorView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
    pub history_display: Vec<String>,
    pub can_view_sensitive: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionView {
    pub fn for_viewer(listing: &SubmissionListing, ctx: &PermissionContext) -> Self {
        let submission = &listing.submission;
        let can_view_sensitive = permissions::can_view_sensitive(ctx);
        let history = &submission.data.history;

        Self {
            id: submission.id,
            tag_name: submission.tag_name.clone(),
            risk: submission.risk,
            organization_id: submission.organization_id,
            organization_name: listing.organization_name.clone(),
            author: AuthorView {
                id: submission.user_id,
                name: listing.author_name.clone(),
                email: listing.author_email.clone(),
            },
            sensitive_info: submission
                .data
                .sensitive_info
                .clone()
                .filter(|_| can_view_sensitive),
            history: can_view_sensitive.then(|| history.clone()),
            history_display: format_for_display(history, !can_view_sensitive),
            can_view_sensitive,
            can_edit: permissions::can_edit(ctx),
            can_delete: permissions::can_delete(ctx),
            version: submission.version,
            created_at: submission.created_at,
            updated_at: submission.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagGroupView {
    pub tag_name: String,
    pub has_risk_mismatch: bool,
    pub submission_count: usize,
    pub submissions: Vec<SubmissionView>,
}

impl TagGroupView {
    pub fn new(group: &TagGroup, views: Vec<SubmissionView>) -> Self {
        Self {
            tag_name: group.tag_name.clone(),
            has_risk_mismatch: group.has_risk_mismatch,
            submission_count: group.submissions.len(),
            submissions: views,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewSubmission, Submission, SubmissionData};
    use crate::history::{ChangeSet, HistoryLedger};
    use crate::types::Role;

    const SECRET: &str = "vendor flagged by compliance team";

    fn listing() -> SubmissionListing {
        let author = Uuid::new_v4();
        let org = Uuid::new_v4();
        let data = HistoryLedger::default().apply_change(
            SubmissionData::with_sensitive_info(Some(SECRET)),
            author,
            "Director One",
            &ChangeSet::new().sensitive_info(None, Some(SECRET)),
        );
        let submission = Submission::from(NewSubmission {
            user_id: author,
            organization_id: org,
            tag_name: "SUB-001".into(),
            risk: RiskLevel::High,
            data,
        });
        SubmissionListing {
            author_organization_id: org,
            submission,
            author_name: "Director One".into(),
            author_email: "director1@company1.com".into(),
            organization_name: "Company1".into(),
        }
    }

    fn viewer(role: Role, listing: &SubmissionListing, own: bool) -> PermissionContext {
        PermissionContext {
            actor_role: role,
            actor_user_id: if own { listing.submission.user_id } else { Uuid::new_v4() },
            actor_org_id: listing.submission.organization_id,
            resource_owner_user_id: listing.submission.user_id,
            resource_owner_org_id: listing.submission.organization_id,
        }
    }

    #[test]
    fn analyst_view_is_redacted() {
        let listing = listing();
        let view = SubmissionView::for_viewer(&listing, &viewer(Role::Analyst, &listing, false));
        assert!(view.sensitive_info.is_none());
        assert!(view.history.is_none());
        assert!(!view.can_edit && !view.can_delete);

        let body = serde_json::to_string(&view).unwrap();
        assert!(!body.contains("compliance"));
        assert!(view.history_display[0].contains("internal notes"));
    }

    #[test]
    fn director_view_includes_sensitive_data() {
        let listing = listing();
        let view = SubmissionView::for_viewer(&listing, &viewer(Role::Director, &listing, false));
        assert_eq!(view.sensitive_info.as_deref(), Some(SECRET));
        assert_eq!(view.history.as_ref().map(Vec::len), Some(1));
        assert!(view.history_display[0].contains("'vendor flagged by co...'"));
        assert!(view.can_edit && view.can_delete);
    }
}
