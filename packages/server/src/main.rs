use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::state::AppState;
use server::verification::{DisabledVerifier, HumanVerifier, TurnstileVerifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = server::database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    server::seed::ensure_constraints(&db)
        .await
        .context("Failed to create vote constraints")?;
    server::seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;
    info!("Database ready");

    let verifier: Arc<dyn HumanVerifier> = if config.verification.enabled {
        Arc::new(
            TurnstileVerifier::new(&config.verification)
                .context("Failed to build verification client")?,
        )
    } else {
        warn!("Vote verification is disabled");
        Arc::new(DisabledVerifier)
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config: Arc::new(config),
        verifier,
    };

    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    info!("API docs at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
