//! Binance best bid/ask price tracker
//!
//! # Architecture
//! - **core**: Symbols, quotes and the symbol registry
//! - **hot_path**: Shared price cache
//! - **exchanges**: Binance bookTicker feed and message decoding
//! - **ws**: WebSocket transport and subscription requests
//! - **snapshot**: Periodic cache snapshots
//! - **infrastructure**: Cold path (logging, metrics, config, persistence)

use price_tracker::infrastructure::{config::Config, logging::init_logging};
use price_tracker::{log_main, PriceTracker, Result};
use tokio::signal;
use tracing::Level;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    // Guards flush file logs on drop; keep them for the whole run
    let _guards = init_logging(&config.logging)?;

    let registry = config.symbols.build_registry()?;
    let mut tracker = PriceTracker::from_config(&config, registry);

    tracker.start().await?;
    log_main!(Level::INFO, "Press Ctrl+C to stop");

    await_shutdown().await;
    tracker.shutdown().await?;

    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
async fn await_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log_main!(Level::ERROR, "Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log_main!(Level::ERROR, "Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => log_main!(Level::INFO, "Received Ctrl+C, shutting down"),
        () = terminate => log_main!(Level::INFO, "Received SIGTERM, shutting down"),
    }
}

