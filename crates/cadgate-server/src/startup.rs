//! Server startup utilities.

use cadgate_config::AppConfig;
use tokio::signal;
use tracing::{error, info};

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
   ______          __            __
  / ____/___ _____/ /___ _____ _/ /____
 / /   / __ `/ __  / __ `/ __ `/ __/ _ \
/ /___/ /_/ / /_/ / /_/ / /_/ / /_/  __/
\____/\__,_/\__,_/\__, /\__,_/\__/\___/
                 /____/
                CAD guest gateway
    "#);
}

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let addr = config.server.addr();
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("Guest view: http://{}/", addr);
    info!("Webhooks:   http://{}/webhooks/cad/cache", addr);
    info!("Health:     http://{}/health", addr);
    info!("API Docs:   http://{}/swagger-ui", addr);
    if config.observability.metrics_enabled {
        info!("Metrics:    http://{}{}", addr, config.observability.metrics_path);
    }
    info!("CAD:        {}", config.cad.base_url);
    info!("Cache:      {}", config.cache.backend);
    info!("{}", separator);
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
