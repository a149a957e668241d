use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::store::SubmissionStore;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::SubmissionService;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SubmissionService>,
    pub jwt_secret: Arc<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn SubmissionStore>, config: &AppConfig) -> Self {
        Self {
            service: Arc::new(SubmissionService::new(store, config.submissions.org_scope)),
            jwt_secret: Arc::new(config.security.jwt_secret.clone()),
        }
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected API
        .merge(api_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    let router = match cors_layer(config) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn api_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, submissions};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/submissions", get(submissions::list).post(submissions::create))
        .route("/api/submissions/mismatches", get(submissions::mismatches))
        .route("/api/submissions/tags/:tag", get(submissions::by_tag))
        .route(
            "/api/submissions/:id",
            get(submissions::show)
                .put(submissions::update)
                .delete(submissions::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    if config.security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
