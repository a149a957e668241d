//! Postgres-backed submission store.
//!
//! Risk and role are stored as their wire strings. The structured payload
//! lives in a `jsonb` column so unknown keys survive every read-modify-write.
//! Updates are guarded by the `version` column: the write only lands when the
//! version the caller read is still current.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    NewSubmission, NewUser, Organization, Submission, SubmissionData, SubmissionListing, User,
};
use super::store::{StoreError, StoreResult, SubmissionFilter, SubmissionStore, SubmissionUpdate};
use crate::types::{RiskLevel, Role};

/// Idempotent DDL applied when `DATABASE_ENSURE_SCHEMA` is set.
pub const SCHEMA_SQL: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS organizations (
        id uuid PRIMARY KEY,
        name text NOT NULL UNIQUE,
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS users (
        id uuid PRIMARY KEY,
        name text NOT NULL,
        email text NOT NULL UNIQUE,
        credential_hash text,
        role text NOT NULL,
        organization_id uuid NOT NULL REFERENCES organizations(id),
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS submissions (
        id uuid PRIMARY KEY,
        user_id uuid NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        organization_id uuid NOT NULL REFERENCES organizations(id),
        tag_name text NOT NULL,
        risk text NOT NULL DEFAULT 'NONE',
        data jsonb NOT NULL DEFAULT '{}'::jsonb,
        version bigint NOT NULL DEFAULT 1,
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now(),
        UNIQUE (organization_id, tag_name)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS submissions_tag_name_idx ON submissions (tag_name)"#,
];

const SUBMISSION_COLUMNS: &str =
    "id, user_id, organization_id, tag_name, risk, data, version, created_at, updated_at";

const LISTING_SELECT: &str = r#"
    SELECT s.id, s.user_id, s.organization_id, s.tag_name, s.risk, s.data, s.version,
           s.created_at, s.updated_at,
           u.name AS author_name, u.email AS author_email,
           u.organization_id AS author_organization_id,
           o.name AS organization_name
    FROM submissions s
    JOIN users u ON u.id = s.user_id
    JOIN organizations o ON o.id = s.organization_id
"#;

#[derive(Debug, Clone, FromRow)]
struct DbUser {
    id: Uuid,
    name: String,
    email: String,
    credential_hash: Option<String>,
    role: String,
    organization_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbSubmission {
    id: Uuid,
    user_id: Uuid,
    organization_id: Uuid,
    tag_name: String,
    risk: String,
    data: Json<SubmissionData>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbListing {
    #[sqlx(flatten)]
    submission: DbSubmission,
    author_name: String,
    author_email: String,
    author_organization_id: Uuid,
    organization_name: String,
}

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA_SQL {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ensured");
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for PostgresStore {
    async fn create_organization(&self, name: &str) -> StoreResult<Organization> {
        let organization = Organization::new(name);
        sqlx::query(
            "INSERT INTO organizations (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| conflict_or(err, format!("organization '{}' already exists", name)))?;
        Ok(organization)
    }

    async fn find_organization_by_name(&self, name: &str) -> StoreResult<Option<Organization>> {
        Ok(sqlx::query_as::<_, Organization>(
            "SELECT id, name, created_at, updated_at FROM organizations WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let user = User::from(user);
        sqlx::query(
            r#"INSERT INTO users (id, name, email, credential_hash, role, organization_id, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.credential_hash)
        .bind(user.role.as_str())
        .bind(user.organization_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| conflict_or(err, format!("user with email '{}' already exists", user.email)))?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        let row = sqlx::query_as::<_, DbUser>(
            r#"SELECT id, name, email, credential_hash, role, organization_id, created_at, updated_at
               FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        user_from_db(row)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, DbUser>(
            r#"SELECT id, name, email, credential_hash, role, organization_id, created_at, updated_at
               FROM users WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(user_from_db)
        .transpose()
    }

    async fn list_submissions(&self, filter: &SubmissionFilter) -> StoreResult<Vec<SubmissionListing>> {
        let query = format!(
            "{} WHERE ($1::uuid IS NULL OR s.organization_id = $1) \
               AND ($2::text IS NULL OR s.tag_name = $2) \
             ORDER BY s.created_at DESC, s.id ASC",
            LISTING_SELECT
        );
        sqlx::query_as::<_, DbListing>(&query)
            .bind(filter.organization_id)
            .bind(filter.tag_name.as_deref())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(listing_from_db)
            .collect()
    }

    async fn get_submission(&self, id: Uuid) -> StoreResult<SubmissionListing> {
        let query = format!("{} WHERE s.id = $1", LISTING_SELECT);
        let row = sqlx::query_as::<_, DbListing>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("submission {}", id)))?;
        listing_from_db(row)
    }

    async fn find_submission_by_tag(
        &self,
        organization_id: Uuid,
        tag_name: &str,
    ) -> StoreResult<Option<SubmissionListing>> {
        let query = format!("{} WHERE s.organization_id = $1 AND s.tag_name = $2", LISTING_SELECT);
        sqlx::query_as::<_, DbListing>(&query)
            .bind(organization_id)
            .bind(tag_name)
            .fetch_optional(&self.pool)
            .await?
            .map(listing_from_db)
            .transpose()
    }

    async fn create_submission(&self, submission: NewSubmission) -> StoreResult<Submission> {
        let submission = Submission::from(submission);
        sqlx::query(&format!(
            "INSERT INTO submissions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            SUBMISSION_COLUMNS
        ))
        .bind(submission.id)
        .bind(submission.user_id)
        .bind(submission.organization_id)
        .bind(&submission.tag_name)
        .bind(submission.risk.as_str())
        .bind(Json(&submission.data))
        .bind(submission.version)
        .bind(submission.created_at)
        .bind(submission.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            conflict_or(
                err,
                format!("organization already has a submission tagged '{}'", submission.tag_name),
            )
        })?;
        Ok(submission)
    }

    async fn update_submission(&self, id: Uuid, update: SubmissionUpdate) -> StoreResult<Submission> {
        let updated = sqlx::query_as::<_, DbSubmission>(&format!(
            r#"UPDATE submissions
               SET risk = $3, data = $4, version = version + 1, updated_at = now()
               WHERE id = $1 AND version = $2
               RETURNING {}"#,
            SUBMISSION_COLUMNS
        ))
        .bind(id)
        .bind(update.expected_version)
        .bind(update.risk.as_str())
        .bind(Json(&update.data))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return submission_from_db(row);
        }

        // Zero rows: either the row is gone or someone else bumped the version.
        let current: Option<i64> = sqlx::query_scalar("SELECT version FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match current {
            None => Err(StoreError::NotFound(format!("submission {}", id))),
            Some(found) => Err(StoreError::Conflict(format!(
                "submission {} was modified concurrently (expected version {}, found {})",
                id, update.expected_version, found
            ))),
        }
    }

    async fn delete_submission(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("submission {}", id)));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        DatabaseManager::health_check(&self.pool).await.map_err(|err| match err {
            DatabaseError::Sqlx(err) => StoreError::Database(err),
            other => StoreError::Unexpected(other.into()),
        })
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}

fn conflict_or(err: sqlx::Error, message: String) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Conflict(message)
    } else {
        StoreError::Database(err)
    }
}

fn user_from_db(row: DbUser) -> StoreResult<User> {
    let role: Role = row
        .role
        .parse()
        .map_err(|err| StoreError::Unexpected(anyhow!("user {}: {}", row.id, err)))?;
    Ok(User {
        id: row.id,
        name: row.name,
        email: row.email,
        credential_hash: row.credential_hash,
        role,
        organization_id: row.organization_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn submission_from_db(row: DbSubmission) -> StoreResult<Submission> {
    let risk: RiskLevel = row
        .risk
        .parse()
        .map_err(|err| StoreError::Unexpected(anyhow!("submission {}: {}", row.id, err)))?;
    Ok(Submission {
        id: row.id,
        user_id: row.user_id,
        organization_id: row.organization_id,
        tag_name: row.tag_name,
        risk,
        data: row.data.0,
        version: row.version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn listing_from_db(row: DbListing) -> StoreResult<SubmissionListing> {
    Ok(SubmissionListing {
        submission: submission_from_db(row.submission)?,
        author_name: row.author_name,
        author_email: row.author_email,
        author_organization_id: row.author_organization_id,
        organization_name: row.organization_name,
    })
}
