use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::history::HistoryEntry;
use crate::types::RiskLevel;

/// Structured payload stored in the submission's `data` column.
///
/// Keys other than `sensitive_info` and `history` are carried through
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive_info: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubmissionData {
    pub fn with_sensitive_info(sensitive_info: Option<&str>) -> Self {
        Self {
            sensitive_info: crate::history::ledger::normalize(sensitive_info).map(str::to_string),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Copied from the author's organization at creation; not re-validated.
    pub organization_id: Uuid,
    pub tag_name: String,
    pub risk: RiskLevel,
    pub data: SubmissionData,
    /// Optimistic concurrency token, bumped on every write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub tag_name: String,
    pub risk: RiskLevel,
    pub data: SubmissionData,
}

impl From<NewSubmission> for Submission {
    fn from(new: NewSubmission) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            organization_id: new.organization_id,
            tag_name: new.tag_name,
            risk: new.risk,
            data: new.data,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A submission joined with its author and organization names.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionListing {
    pub submission: Submission,
    pub author_name: String,
    pub author_email: String,
    /// The author's current organization.
    pub author_organization_id: Uuid,
    pub organization_name: String,
}
