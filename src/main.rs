use tracing_subscriber::EnvFilter;

use taskdesk_gate::{config, is_production, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up GATE_PORT, GATE_PERMISSIONS_FILE, etc.
    let _ = dotenvy::dotenv();

    let config = config::config();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())))
        .init();

    tracing::info!("Starting TaskDesk gate in {:?} mode", config.environment);
    if is_production!() && config.session.accept_bearer_header {
        tracing::warn!("Bearer tokens are accepted in production; cookies are the expected session source");
    }

    let state = AppState::from_config(config.clone())?;
    server::serve(state).await
}
