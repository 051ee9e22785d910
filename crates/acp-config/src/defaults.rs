//! Built-in defaults applied when neither the command line nor the
//! environment supplies a value.

use std::time::Duration;

use crate::logging::LogFormat;

/// Number of worker threads serving connections.
pub const DEFAULT_WORKERS: usize = 8;

/// Receive buffer capacity for a single frame, in bytes.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024;

/// Interval at which blocked workers and sessions re-check for shutdown.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the daemon.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the daemon.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default poll interval as a [`Duration`].
#[must_use]
pub fn default_poll_interval() -> Duration {
    Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
}
