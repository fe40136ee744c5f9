use std::time::Duration;

use readlog_core::Previewer;
use readlog_server::config::ServerConfig;
use readlog_server::state::AppState;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // JSON logs in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("readlog_server=info,readlog_core=info,tower_http=info"));

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = ServerConfig::from_env()?;
    info!(timeout_secs = config.preview_timeout_secs, "configuration loaded");

    if config.allow_private_hosts {
        tracing::warn!("private and loopback preview targets are allowed");
    }

    let cors = if config.is_dev {
        info!("CORS: permissive (dev mode)");
        CorsLayer::permissive()
    } else {
        info!("CORS: restrictive (production mode)");
        CorsLayer::new()
    };

    let previewer = Previewer::new(config.preview_config())?;
    let app = readlog_server::app(
        AppState { previewer },
        Duration::from_secs(config.preview_timeout_secs),
        cors,
    );

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
