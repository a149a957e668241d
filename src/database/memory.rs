//! In-memory submission store.
//!
//! Used for local development and tests. State lives in `HashMap`s behind
//! `tokio::sync::RwLock` and is lost on restart. Guarded updates compare the
//! stored version under the write lock, so concurrent writers behave like the
//! Postgres backend.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    NewSubmission, NewUser, Organization, Submission, SubmissionListing, User,
};
use super::store::{StoreError, StoreResult, SubmissionFilter, SubmissionStore, SubmissionUpdate};

#[derive(Default)]
struct State {
    organizations: HashMap<Uuid, Organization>,
    users: HashMap<Uuid, User>,
    submissions: HashMap<Uuid, Submission>,
}

impl State {
    fn listing(&self, submission: &Submission) -> StoreResult<SubmissionListing> {
        let author = self
            .users
            .get(&submission.user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", submission.user_id)))?;
        let organization = self
            .organizations
            .get(&submission.organization_id)
            .ok_or_else(|| StoreError::NotFound(format!("organization {}", submission.organization_id)))?;

        Ok(SubmissionListing {
            submission: submission.clone(),
            author_name: author.name.clone(),
            author_email: author.email.clone(),
            author_organization_id: author.organization_id,
            organization_name: organization.name.clone(),
        })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves a user to another organization. Existing submissions keep the
    /// organization recorded at creation.
    pub async fn reassign_user(&self, user_id: Uuid, organization_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))?;
        user.organization_id = organization_id;
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn create_organization(&self, name: &str) -> StoreResult<Organization> {
        let mut state = self.state.write().await;
        if state.organizations.values().any(|o| o.name == name) {
            return Err(StoreError::Conflict(format!("organization '{}' already exists", name)));
        }
        let organization = Organization::new(name);
        state.organizations.insert(organization.id, organization.clone());
        Ok(organization)
    }

    async fn find_organization_by_name(&self, name: &str) -> StoreResult<Option<Organization>> {
        let state = self.state.read().await;
        Ok(state.organizations.values().find(|o| o.name == name).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if !state.organizations.contains_key(&user.organization_id) {
            return Err(StoreError::NotFound(format!("organization {}", user.organization_id)));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("user with email '{}' already exists", user.email)));
        }
        let user = User::from(user);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        self.state
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_submissions(&self, filter: &SubmissionFilter) -> StoreResult<Vec<SubmissionListing>> {
        let state = self.state.read().await;
        let mut submissions: Vec<&Submission> = state
            .submissions
            .values()
            .filter(|s| filter.organization_id.map_or(true, |org| s.organization_id == org))
            .filter(|s| filter.tag_name.as_deref().map_or(true, |tag| s.tag_name == tag))
            .collect();
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        submissions.into_iter().map(|s| state.listing(s)).collect()
    }

    async fn get_submission(&self, id: Uuid) -> StoreResult<SubmissionListing> {
        let state = self.state.read().await;
        let submission = state
            .submissions
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("submission {}", id)))?;
        state.listing(submission)
    }

    async fn find_submission_by_tag(
        &self,
        organization_id: Uuid,
        tag_name: &str,
    ) -> StoreResult<Option<SubmissionListing>> {
        let state = self.state.read().await;
        state
            .submissions
            .values()
            .find(|s| s.organization_id == organization_id && s.tag_name == tag_name)
            .map(|s| state.listing(s))
            .transpose()
    }

    async fn create_submission(&self, submission: NewSubmission) -> StoreResult<Submission> {
        let mut state = self.state.write().await;
        let duplicate = state
            .submissions
            .values()
            .any(|s| s.organization_id == submission.organization_id && s.tag_name == submission.tag_name);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "organization already has a submission tagged '{}'",
                submission.tag_name
            )));
        }
        let submission = Submission::from(submission);
        state.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn update_submission(&self, id: Uuid, update: SubmissionUpdate) -> StoreResult<Submission> {
        let mut state = self.state.write().await;
        let submission = state
            .submissions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("submission {}", id)))?;

        if submission.version != update.expected_version {
            return Err(StoreError::Conflict(format!(
                "submission {} was modified concurrently (expected version {}, found {})",
                id, update.expected_version, submission.version
            )));
        }

        submission.risk = update.risk;
        submission.data = update.data;
        submission.version += 1;
        submission.updated_at = Utc::now();
        Ok(submission.clone())
    }

    async fn delete_submission(&self, id: Uuid) -> StoreResult<()> {
        self.state
            .write()
            .await
            .submissions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("submission {}", id)))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::SubmissionData;
    use crate::types::{RiskLevel, Role};

    async fn seeded() -> (InMemoryStore, Organization, User) {
        let store = InMemoryStore::new();
        let org = store.create_organization("Company1").await.unwrap();
        let user = store
            .create_user(NewUser {
                name: "Analyst One".into(),
                email: "analyst1@company1.com".into(),
                credential_hash: None,
                role: Role::Analyst,
                organization_id: org.id,
            })
            .await
            .unwrap();
        (store, org, user)
    }

    fn new_submission(user: &User, tag: &str) -> NewSubmission {
        NewSubmission {
            user_id: user.id,
            organization_id: user.organization_id,
            tag_name: tag.into(),
            risk: RiskLevel::Low,
            data: SubmissionData::default(),
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_tag_within_org() {
        let (store, _, user) = seeded().await;
        store.create_submission(new_submission(&user, "acme")).await.unwrap();

        let err = store.create_submission(new_submission(&user, "acme")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn guarded_update_detects_stale_version() {
        let (store, _, user) = seeded().await;
        let created = store.create_submission(new_submission(&user, "acme")).await.unwrap();

        let first = store
            .update_submission(
                created.id,
                SubmissionUpdate { risk: RiskLevel::High, data: created.data.clone(), expected_version: created.version },
            )
            .await
            .unwrap();
        assert_eq!(first.version, created.version + 1);

        let stale = store
            .update_submission(
                created.id,
                SubmissionUpdate { risk: RiskLevel::None, data: created.data.clone(), expected_version: created.version },
            )
            .await
            .unwrap_err();
        assert!(matches!(stale, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn listing_joins_author_and_organization() {
        let (store, org, user) = seeded().await;
        store.create_submission(new_submission(&user, "acme")).await.unwrap();

        let listings = store.list_submissions(&SubmissionFilter::default()).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].author_name, "Analyst One");
        assert_eq!(listings[0].organization_name, org.name);

        let other_tag = SubmissionFilter { tag_name: Some("other".into()), ..Default::default() };
        assert!(store.list_submissions(&other_tag).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let (store, _, _) = seeded().await;
        let err = store.delete_submission(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
