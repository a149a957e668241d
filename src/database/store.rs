use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    NewSubmission, NewUser, Organization, Submission, SubmissionData, SubmissionListing, User,
};
use crate::types::RiskLevel;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Listing filter. Empty filter lists everything.
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub organization_id: Option<Uuid>,
    pub tag_name: Option<String>,
}

/// Values written by a guarded update.
#[derive(Debug, Clone)]
pub struct SubmissionUpdate {
    pub risk: RiskLevel,
    pub data: SubmissionData,
    /// Version the caller read; the write fails with `Conflict` if it moved.
    pub expected_version: i64,
}

/// Persistence collaborator for the submission service.
///
/// Listings are ordered newest first with the id as a stable tie-break.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn create_organization(&self, name: &str) -> StoreResult<Organization>;
    async fn find_organization_by_name(&self, name: &str) -> StoreResult<Option<Organization>>;

    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn get_user(&self, id: Uuid) -> StoreResult<User>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn list_submissions(&self, filter: &SubmissionFilter) -> StoreResult<Vec<SubmissionListing>>;
    async fn get_submission(&self, id: Uuid) -> StoreResult<SubmissionListing>;
    async fn find_submission_by_tag(
        &self,
        organization_id: Uuid,
        tag_name: &str,
    ) -> StoreResult<Option<SubmissionListing>>;
    async fn create_submission(&self, submission: NewSubmission) -> StoreResult<Submission>;
    async fn update_submission(&self, id: Uuid, update: SubmissionUpdate) -> StoreResult<Submission>;
    async fn delete_submission(&self, id: Uuid) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
