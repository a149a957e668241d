use axum::Extension;
use serde::Serialize;

use crate::middleware::{ApiResponse, AuthUser};
use crate::permissions;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    #[serde(flatten)]
    pub user: AuthUser,
    pub role_name: &'static str,
    pub can_set_sensitive_info: bool,
}

/// GET /api/auth/whoami - session resolved from the bearer token
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResponse<WhoAmI> {
    ApiResponse::success(WhoAmI {
        role_name: user.role.display_name(),
        can_set_sensitive_info: permissions::can_set_sensitive_info(user.role),
        user,
    })
}
