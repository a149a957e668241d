//! Submission lifecycle: permission gate, history ledger, guarded persistence.
//!
//! Every mutation is authorized before anything is diffed or written. Updates
//! that change nothing return the stored record without a write.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::OrgScope;
use crate::database::models::{NewSubmission, SubmissionData, SubmissionListing};
use crate::database::store::{StoreError, SubmissionFilter, SubmissionStore, SubmissionUpdate};
use crate::history::ledger::normalize;
use crate::history::{ChangeSet, HistoryLedger};
use crate::middleware::AuthUser;
use crate::permissions::{self, Capability, PermissionContext};
use crate::types::RiskLevel;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SubmissionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => SubmissionError::NotFound(msg),
            StoreError::Conflict(msg) => SubmissionError::Conflict(msg),
            other => SubmissionError::Store(other),
        }
    }
}

pub type SubmissionResult<T> = Result<T, SubmissionError>;

#[derive(Debug, Clone, Default)]
pub struct CreateSubmission {
    pub tag_name: String,
    pub risk: Option<RiskLevel>,
    pub sensitive_info: Option<String>,
}

/// Fields left as `None` are not touched. `sensitive_info: Some(None)` clears
/// the annotation.
#[derive(Debug, Clone, Default)]
pub struct UpdateSubmission {
    pub risk: Option<RiskLevel>,
    pub sensitive_info: Option<Option<String>>,
}

/// All organizations' submissions sharing one tag.
#[derive(Debug, Clone)]
pub struct TagGroup {
    pub tag_name: String,
    pub submissions: Vec<SubmissionListing>,
    pub has_risk_mismatch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskMismatch {
    pub tag_name: String,
    pub risk_levels: Vec<RiskLevel>,
    pub submission_count: usize,
    pub organizations: Vec<String>,
}

pub struct SubmissionService {
    store: Arc<dyn SubmissionStore>,
    ledger: HistoryLedger,
    org_scope: OrgScope,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn SubmissionStore>, org_scope: OrgScope) -> Self {
        Self {
            store,
            ledger: HistoryLedger::default(),
            org_scope,
        }
    }

    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.store
    }

    /// Builds the evaluator input for `actor` against a stored submission.
    pub fn permission_context(&self, actor: &AuthUser, listing: &SubmissionListing) -> PermissionContext {
        let resource_owner_org_id = match self.org_scope {
            OrgScope::Recorded => listing.submission.organization_id,
            OrgScope::Owner => listing.author_organization_id,
        };
        PermissionContext {
            actor_role: actor.role,
            actor_user_id: actor.user_id,
            actor_org_id: actor.organization_id,
            resource_owner_user_id: listing.submission.user_id,
            resource_owner_org_id,
        }
    }

    pub async fn list(&self, filter: &SubmissionFilter) -> SubmissionResult<Vec<SubmissionListing>> {
        Ok(self.store.list_submissions(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> SubmissionResult<SubmissionListing> {
        self.store.get_submission(id).await.map_err(|err| match err {
            StoreError::NotFound(_) => SubmissionError::NotFound("Submission not found".into()),
            other => other.into(),
        })
    }

    pub async fn create(&self, actor: &AuthUser, request: CreateSubmission) -> SubmissionResult<SubmissionListing> {
        let tag_name = request.tag_name.trim();
        if tag_name.is_empty() {
            return Err(SubmissionError::Validation("Tag name is required".into()));
        }

        let sensitive_info = normalize(request.sensitive_info.as_deref());
        if sensitive_info.is_some() && !permissions::can_set_sensitive_info(actor.role) {
            warn!("{} ({}) tried to attach sensitive info", actor.email, actor.role.as_str());
            return Err(SubmissionError::Forbidden("Analysts cannot add sensitive information".into()));
        }

        // The organization is copied from the author's stored membership.
        let author = self.store.get_user(actor.user_id).await.map_err(|err| match err {
            StoreError::NotFound(_) => SubmissionError::Forbidden("Unknown user".into()),
            other => other.into(),
        })?;
        if author.organization_id != actor.organization_id {
            warn!("Session organization for {} differs from stored membership", actor.email);
        }

        if let Some(existing) = self.store.find_submission_by_tag(author.organization_id, tag_name).await? {
            return Err(SubmissionError::Conflict(format!(
                "Your organization already has a submission tagged '{}' (by {}, id {})",
                tag_name, existing.author_name, existing.submission.id
            )));
        }

        let created = self
            .store
            .create_submission(NewSubmission {
                user_id: author.id,
                organization_id: author.organization_id,
                tag_name: tag_name.to_string(),
                risk: request.risk.unwrap_or_default(),
                data: SubmissionData::with_sensitive_info(sensitive_info),
            })
            .await?;

        info!("{} created submission {} tagged '{}'", actor.email, created.id, created.tag_name);
        self.get(created.id).await
    }

    pub async fn update(
        &self,
        actor: &AuthUser,
        id: Uuid,
        request: UpdateSubmission,
    ) -> SubmissionResult<SubmissionListing> {
        let current = self.get(id).await?;
        let ctx = self.permission_context(actor, &current);
        if !permissions::authorize(Capability::Edit, &ctx) {
            warn!("{} denied edit on submission {}", actor.email, id);
            return Err(SubmissionError::Forbidden("Insufficient permissions".into()));
        }

        let stored = &current.submission;
        let old_sensitive = stored.data.sensitive_info.as_deref();
        let mut changes = ChangeSet::new();

        let new_risk = request.risk.unwrap_or(stored.risk);
        if request.risk.is_some() {
            changes = changes.risk(stored.risk, new_risk);
        }

        // An omitted field keeps the stored value byte for byte.
        let new_sensitive = match &request.sensitive_info {
            Some(value) => {
                let value = normalize(value.as_deref());
                if value != normalize(old_sensitive) && !permissions::can_set_sensitive_info(actor.role) {
                    warn!("{} denied sensitive info change on submission {}", actor.email, id);
                    return Err(SubmissionError::Forbidden("Analysts cannot change sensitive information".into()));
                }
                changes = changes.sensitive_info(old_sensitive, value);
                value.map(str::to_string)
            }
            None => stored.data.sensitive_info.clone(),
        };

        let mut data = self.ledger.apply_change(stored.data.clone(), actor.user_id, &actor.name, &changes);
        data.sensitive_info = new_sensitive;

        if new_risk == stored.risk && data == stored.data {
            debug!("No-op update on submission {}", id);
            return Ok(current);
        }

        self.store
            .update_submission(
                id,
                SubmissionUpdate {
                    risk: new_risk,
                    data,
                    expected_version: stored.version,
                },
            )
            .await
            .map_err(|err| {
                if let StoreError::Conflict(msg) = &err {
                    warn!("Lost update race on submission {}: {}", id, msg);
                }
                SubmissionError::from(err)
            })?;

        info!("{} updated submission {}", actor.email, id);
        self.get(id).await
    }

    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> SubmissionResult<()> {
        let current = self.get(id).await?;
        let ctx = self.permission_context(actor, &current);
        if !permissions::authorize(Capability::Delete, &ctx) {
            warn!("{} denied delete on submission {}", actor.email, id);
            return Err(SubmissionError::Forbidden("Insufficient permissions".into()));
        }

        self.store.delete_submission(id).await?;
        info!("{} deleted submission {}", actor.email, id);
        Ok(())
    }

    pub async fn by_tag(&self, tag_name: &str) -> SubmissionResult<TagGroup> {
        let tag_name = tag_name.trim();
        let filter = SubmissionFilter {
            tag_name: Some(tag_name.to_string()),
            ..Default::default()
        };
        let submissions = self.store.list_submissions(&filter).await?;
        if submissions.is_empty() {
            return Err(SubmissionError::NotFound(format!("No submissions tagged '{}'", tag_name)));
        }

        let has_risk_mismatch = has_risk_mismatch(&submissions);
        Ok(TagGroup {
            tag_name: tag_name.to_string(),
            submissions,
            has_risk_mismatch,
        })
    }

    pub async fn mismatches(&self) -> SubmissionResult<Vec<RiskMismatch>> {
        let all = self.store.list_submissions(&SubmissionFilter::default()).await?;
        Ok(find_risk_mismatches(&all))
    }
}

/// More than one submission and more than one distinct risk.
pub fn has_risk_mismatch(submissions: &[SubmissionListing]) -> bool {
    let risks: BTreeSet<&str> = submissions.iter().map(|s| s.submission.risk.as_str()).collect();
    submissions.len() > 1 && risks.len() > 1
}

/// Groups by tag and keeps the tags whose submissions disagree on risk,
/// sorted by tag name.
pub fn find_risk_mismatches(submissions: &[SubmissionListing]) -> Vec<RiskMismatch> {
    let mut by_tag: BTreeMap<&str, Vec<&SubmissionListing>> = BTreeMap::new();
    for listing in submissions {
        by_tag.entry(listing.submission.tag_name.as_str()).or_default().push(listing);
    }

    by_tag
        .into_iter()
        .filter_map(|(tag_name, group)| {
            let risk_levels: Vec<RiskLevel> = RiskLevel::ALL
                .into_iter()
                .filter(|risk| group.iter().any(|s| s.submission.risk == *risk))
                .collect();
            if group.len() < 2 || risk_levels.len() < 2 {
                return None;
            }
            let organizations: BTreeSet<String> =
                group.iter().map(|s| s.organization_name.clone()).collect();
            Some(RiskMismatch {
                tag_name: tag_name.to_string(),
                risk_levels,
                submission_count: group.len(),
                organizations: organizations.into_iter().collect(),
            })
        })
        .collect()
}
