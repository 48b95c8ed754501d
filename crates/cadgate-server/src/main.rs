//! # Cadgate Server
//!
//! Entry point for the CAD guest gateway.

use cadgate_config::ConfigLoader;
use cadgate_core::{init_tracing, CadgateResult};
use cadgate_server::App;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Tracing may not be up yet.
        eprintln!("Application error: {}", e);
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> CadgateResult<()> {
    let config_loader = ConfigLoader::from_default_location()?;
    let config = config_loader.get().await;

    init_tracing(
        &config.observability.log_level,
        config.observability.log_format,
    )?;

    info!("Starting {} v{}", config.app.name, env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    App::build(config)?.serve().await
}
