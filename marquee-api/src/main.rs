use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use marquee_api::{app, sweeper, AppState};
use marquee_store::{Config, ReservationClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,marquee_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    let client = ReservationClient::new(&config.reservation_service.base_url, config.request_timeout())
        .context("Failed to build reservation service client")?;
    tracing::info!("Reservation service at {}", config.reservation_service.base_url);

    let screen_config = config.screen_config();
    let idle_timeout = screen_config.idle_timeout;
    let app_state = AppState::new(Arc::new(client), screen_config);
    let sweeper = idle_timeout.map(|timeout| sweeper::start_screen_sweeper(app_state.clone(), timeout));
    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
