//! MODL Relayer binary.

use modl_relayer::{create_router, AppState, Config};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal in containers.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MODL Relayer");

    let config: Config = config::Config::builder()
        .add_source(config::File::with_name("relayer").required(false))
        .add_source(config::Environment::with_prefix("RELAYER"))
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| {
            error!(error = %e, "FATAL: Config error, fix env vars or relayer.toml");
            e
        })?;

    info!(rpc = %config.rpc_url, hub = %config.relay_hub_address, eip1559 = config.eip1559, "Configuration loaded");

    let bind_address = config.bind_address.clone();
    let state = match AppState::new(config).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!(error = %e, "FATAL: Failed to initialize relayer");
            return Err(e.into());
        }
    };

    let app = create_router(state);

    info!(address = %bind_address, "Listening");

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Relayer shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
