use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use learnhub::logging::init_tracing;
use learnhub::metrics::{init_metrics, metrics_router};
use learnhub::router::init_router;
use learnhub::state::init_app_state;
use learnhub_config::AppConfig;
use learnhub_db::run_migrations;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing().context("Failed to initialize logging")?;
    let metrics_handle = init_metrics()?;

    let state = init_app_state(&config)
        .await
        .context("Failed to connect to database")?;

    if config.server.run_migrations {
        run_migrations(&state.db)
            .await
            .context("Failed to run migrations")?;
    }

    config
        .upload
        .ensure_dirs()
        .await
        .context("Failed to create upload directories")?;

    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            limiter.prune();
        }
    });

    let mut app = init_router(state);
    if let Some(handle) = metrics_handle {
        app = app.merge(metrics_router(handle));
    }

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    tracing::info!(%address, "Server running");
    tracing::info!("Swagger UI available at /swagger-ui, Scalar at /scalar");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
