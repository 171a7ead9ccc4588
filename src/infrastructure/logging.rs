//! Centralized logging
//!
//! Console output plus daily rolling files under the configured directory,
//! separated by log type:
//! - `<dir>/main` - everything, JSON lines
//! - `<dir>/error` - WARN and ERROR only
//! - `<dir>/feed` - WebSocket and Binance feed logs
//! - `<dir>/snapshot` - snapshot scheduler and persistence logs

use super::config::LoggingConfig;
use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::{filter_fn, LevelFilter},
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_TYPES: [&str; 4] = ["main", "error", "feed", "snapshot"];

/// Initialize logging
///
/// Returns the WorkerGuards which must be kept alive for the duration of the
/// program. Empty when file output is disabled.
pub fn init_logging(config: &LoggingConfig) -> io::Result<Vec<WorkerGuard>> {
    // RUST_LOG wins over the configured directive
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fn console_layer<S>() -> tracing_subscriber::fmt::Layer<S>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
    }

    if !config.file_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer())
            .try_init()
            .map_err(io::Error::other)?;
        tracing::info!("Logging system initialized (console only)");
        return Ok(Vec::new());
    }

    create_log_dirs(&config.dir)?;

    let mut guards = Vec::with_capacity(LOG_TYPES.len());
    let dir = &config.dir;

    let (main_appender, main_guard) = create_appender(dir, "main");
    guards.push(main_guard);

    let (error_appender, error_guard) = create_appender(dir, "error");
    guards.push(error_guard);

    let (feed_appender, feed_guard) = create_appender(dir, "feed");
    guards.push(feed_guard);

    let (snapshot_appender, snapshot_guard) = create_appender(dir, "snapshot");
    guards.push(snapshot_guard);

    let main_layer = tracing_subscriber::fmt::layer()
        .with_writer(main_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json();

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(LevelFilter::WARN);

    let feed_layer = tracing_subscriber::fmt::layer()
        .with_writer(feed_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(filter_fn(|metadata| is_feed_target(metadata.target())));

    let snapshot_layer = tracing_subscriber::fmt::layer()
        .with_writer(snapshot_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(filter_fn(|metadata| {
            metadata.target().contains("snapshot") || metadata.target().contains("persistence")
        }));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(main_layer)
        .with(error_layer)
        .with(feed_layer)
        .with(snapshot_layer)
        .with(console_layer())
        .try_init()
        .map_err(io::Error::other)?;

    tracing::info!(
        "Logging system initialized. Log files in {} directory",
        config.dir.display()
    );

    Ok(guards)
}

fn is_feed_target(target: &str) -> bool {
    target.contains("feed") || target.contains("ws") || target.contains("binance")
}

fn create_log_dirs(dir: &Path) -> io::Result<()> {
    for log_type in LOG_TYPES {
        fs::create_dir_all(dir.join(log_type))?;
    }
    Ok(())
}

/// Create a rolling file appender
fn create_appender(dir: &Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, dir.join(name), name);
    tracing_appender::non_blocking(appender)
}

/// Log macro helpers for specific log types
#[macro_export]
macro_rules! log_feed {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "feed", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_snapshot {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "snapshot", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_main {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "main", $level, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_creation() {
        let tmp = tempfile::tempdir().unwrap();
        create_log_dirs(tmp.path()).unwrap();
        for log_type in LOG_TYPES {
            assert!(tmp.path().join(log_type).is_dir());
        }
        // Idempotent
        create_log_dirs(tmp.path()).unwrap();
    }

    #[test]
    fn test_feed_target_routing() {
        assert!(is_feed_target("feed"));
        assert!(is_feed_target("ws"));
        assert!(is_feed_target("binance"));
        assert!(!is_feed_target("snapshot"));
        assert!(!is_feed_target("main"));
    }
}
