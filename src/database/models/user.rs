use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Role;

/// A member of exactly one organization. Membership is never transferred
/// by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Managed by the external authentication provider.
    #[serde(skip_serializing)]
    pub credential_hash: Option<String>,
    pub role: Role,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub credential_hash: Option<String>,
    pub role: Role,
    pub organization_id: Uuid,
}

impl From<NewUser> for User {
    fn from(new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            credential_hash: new.credential_hash,
            role: new.role,
            organization_id: new.organization_id,
            created_at: now,
            updated_at: now,
        }
    }
}
