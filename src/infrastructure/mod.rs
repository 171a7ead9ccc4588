//! Infrastructure - cold path only
//!
//! This module contains non-latency-critical code:
//! - Logging and feed metrics
//! - Configuration management
//! - Snapshot persistence

pub mod config;
pub mod logging;
pub mod metrics;
pub mod persistence;

pub use config::{Config, ConfigError};
pub use logging::init_logging;
pub use metrics::{FeedMetrics, MetricsSnapshot};
pub use persistence::SnapshotStore;
