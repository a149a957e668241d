use sqlx::PgPool;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use risk_tracker::config::{self, AppConfig};
use risk_tracker::database::{seed, DatabaseManager, InMemoryStore, PostgresStore, SubmissionStore};
use risk_tracker::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("risk_tracker=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Risk Tracker in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let (store, pool) = build_store(config).await?;
    if config.submissions.seed_demo_data {
        let report = seed::seed_demo_data(store.as_ref()).await?;
        for user in report.users.values() {
            tracing::info!("Demo user {} ({}) id={} org={}", user.email, user.role.as_str(), user.id, user.organization_id);
        }
    }

    let app = router(AppState::new(store, config), config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Risk Tracker listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        DatabaseManager::close(&pool).await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

/// The pool is returned alongside the store so it can be closed on shutdown.
async fn build_store(config: &AppConfig) -> anyhow::Result<(Arc<dyn SubmissionStore>, Option<PgPool>)> {
    if config.database.url.is_none() {
        tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
        return Ok((Arc::new(InMemoryStore::new()), None));
    }

    let pool = DatabaseManager::connect(&config.database).await?;
    let store = PostgresStore::new(pool.clone());
    if config.database.ensure_schema {
        store.ensure_schema().await?;
    }
    Ok((Arc::new(store), Some(pool)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
