use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET / - service info
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Risk Tracker API",
            "version": version,
            "description": "Multi-tenant submission tracker with role-scoped edits and audit history",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/whoami (protected)",
                "submissions": "/api/submissions[/:id] (protected)",
                "tags": "/api/submissions/tags/:tag (protected)",
                "mismatches": "/api/submissions/mismatches (protected)",
            }
        }
    }))
}

/// GET /health - store liveness
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state.service.store();

    if let Err(e) = store.health_check().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable(format!(
            "{} store unavailable",
            store.backend_name()
        )));
    }

    Ok(Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "database": store.backend_name()
        }
    })))
}
