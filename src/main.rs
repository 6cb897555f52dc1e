use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_shared::HealthService;
use carepoint_core::{
    appointment_minutes_from_env_value, load_seed_users, CoreConfig, CoreServices,
};

/// Main entry point for the CarePoint server
///
/// Resolves configuration from the environment once, bootstraps staff accounts and serves the
/// REST API with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `CAREPOINT_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CAREPOINT_ADMIN_API_KEY`: API key of the bootstrap admin account (optional)
/// - `CAREPOINT_SEED_USERS`: path to a YAML file of staff accounts to create at startup (optional)
/// - `CAREPOINT_APPOINTMENT_MINUTES`: default appointment length in minutes (default: 30)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configuration value is invalid or the seed file cannot be read,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("carepoint_run=info".parse()?)
                .add_directive("carepoint_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("CAREPOINT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let appointment_minutes =
        appointment_minutes_from_env_value(std::env::var("CAREPOINT_APPOINTMENT_MINUTES").ok())?;
    let cfg = Arc::new(CoreConfig::new(
        std::env::var("CAREPOINT_ADMIN_API_KEY").ok(),
        appointment_minutes,
    )?);

    let seed_users = match std::env::var("CAREPOINT_SEED_USERS").ok().map(PathBuf::from) {
        Some(path) => {
            tracing::info!("Loading seed users from {}", path.display());
            load_seed_users(&path)?
        }
        None => Vec::new(),
    };

    let services = CoreServices::new(cfg);
    let accounts = services.bootstrap(seed_users)?;
    tracing::info!(accounts, "Staff accounts ready");

    let health = HealthService::check_health();
    tracing::info!("++ Starting CarePoint REST on {} ({})", rest_addr, health.message);

    let app = api_rest::router(services);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
    }
    tracing::info!("-- Shutting down CarePoint REST");
}
