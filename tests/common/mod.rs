#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use risk_tracker::auth::{generate_jwt, Claims};
use risk_tracker::config::{AppConfig, OrgScope};
use risk_tracker::database::seed::{seed_demo_data, SeedReport};
use risk_tracker::database::InMemoryStore;
use risk_tracker::{router, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
    pub seed: SeedReport,
    pub config: AppConfig,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn code(&self) -> Option<&str> {
        self.body["code"].as_str()
    }
}

/// Router over a freshly seeded in-memory store.
pub async fn spawn_app() -> Result<TestApp> {
    spawn_app_with_scope(OrgScope::Recorded).await
}

pub async fn spawn_app_with_scope(org_scope: OrgScope) -> Result<TestApp> {
    spawn_app_with(|config| config.submissions.org_scope = org_scope).await
}

/// Router over a seeded store with `configure` applied to the test config.
pub async fn spawn_app_with(configure: impl FnOnce(&mut AppConfig)) -> Result<TestApp> {
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    config.api.enable_request_logging = false;
    configure(&mut config);

    let store = InMemoryStore::new();
    let seed = seed_demo_data(&store).await.context("seeding failed")?;
    let state = AppState::new(Arc::new(store.clone()), &config);

    Ok(TestApp {
        router: router(state, &config),
        store,
        seed,
        config,
    })
}

impl TestApp {
    pub fn token_for(&self, email: &str) -> Result<String> {
        let user = self.seed.user(email).with_context(|| format!("no seeded user {}", email))?;
        let org = self
            .seed
            .organizations
            .values()
            .find(|o| o.id == user.organization_id)
            .context("seeded user without organization")?;
        Ok(generate_jwt(&Claims::new(user, org.name.clone(), 1), TEST_SECRET)?)
    }

    pub fn user_id(&self, email: &str) -> Result<Uuid> {
        Ok(self.seed.user(email).context("unknown user")?.id)
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    /// Sends a hand-built request, for bodies `request` cannot express.
    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| {
                format!("non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })?
        };

        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<TestResponse> {
        self.request(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<TestResponse> {
        self.request(Method::DELETE, path, Some(token), None).await
    }

    /// Creates a submission as `email` and returns its id.
    pub async fn create_submission(&self, email: &str, body: Value) -> Result<String> {
        let token = self.token_for(email)?;
        let res = self.post("/api/submissions", &token, body).await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "create failed: {} {}", res.status, res.body);
        res.data()["id"]
            .as_str()
            .map(str::to_string)
            .context("created submission without id")
    }
}
