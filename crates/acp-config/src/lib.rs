//! Shared configuration for the ACP daemon.
//!
//! Settings are resolved with `clap`: command-line arguments win over
//! `ACP_*` environment variables, which win over the built-in defaults in
//! [`defaults`]. The socket path has no default and must be supplied.

mod defaults;
mod logging;
mod socket;

use std::ffi::OsString;
use std::time::Duration;

use clap::Parser;
use clap::builder::RangedU64ValueParser;
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_FRAME_BYTES, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WORKERS,
    default_log_filter, default_log_format, default_poll_interval,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketParseError, SocketPath, SocketPreparationError};

/// Runtime configuration of the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "acpd",
    version,
    about = "Threshold-signature RPC daemon on a local Unix domain socket"
)]
pub struct Config {
    /// Path of the Unix domain socket to serve.
    #[arg(value_name = "SOCKET", env = "ACP_SOCKET")]
    socket: SocketPath,

    /// Number of worker threads accepting and serving connections.
    #[arg(
        long,
        env = "ACP_WORKERS",
        default_value_t = DEFAULT_WORKERS,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    workers: usize,

    /// Largest accepted request frame, in bytes.
    #[arg(
        long,
        env = "ACP_MAX_FRAME_BYTES",
        default_value_t = DEFAULT_MAX_FRAME_BYTES,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    max_frame_bytes: usize,

    /// Milliseconds between shutdown checks while accepting or reading.
    #[arg(
        long,
        env = "ACP_POLL_INTERVAL_MS",
        default_value_t = DEFAULT_POLL_INTERVAL_MS,
        value_parser = RangedU64ValueParser::<u64>::new().range(1..)
    )]
    poll_interval_ms: u64,

    /// Tracing filter directive, for example `info` or `acpd=debug`.
    #[arg(long, env = "ACP_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,

    /// Log output format.
    #[arg(long, env = "ACP_LOG_FORMAT", default_value_t = LogFormat::Json)]
    log_format: LogFormat,
}

impl Config {
    /// Builds a configuration for `socket` with every other setting defaulted.
    #[must_use]
    pub fn new(socket: SocketPath) -> Self {
        Self {
            socket,
            workers: DEFAULT_WORKERS,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: default_log_format(),
        }
    }

    /// Loads configuration from the process arguments and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::try_parse()?)
    }

    /// Loads configuration from explicit arguments plus the environment.
    ///
    /// The first item is treated as the binary name.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(Self::try_parse_from(args)?)
    }

    /// Overrides the worker count. Zero is raised to one.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Overrides the frame size limit. Zero is raised to one.
    #[must_use]
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes.max(1);
        self
    }

    /// Overrides the poll interval. Sub-millisecond values are raised to one.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);
        self
    }

    /// Socket path served by the daemon.
    #[must_use]
    pub fn socket(&self) -> &SocketPath {
        &self.socket
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Largest accepted request frame, in bytes.
    #[must_use]
    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Interval between shutdown checks.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Tracing filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Arguments or environment values were rejected, or help was requested.
    #[error(transparent)]
    Arguments(#[from] clap::Error),
}

impl ConfigError {
    /// Returns `true` when the error carries `--help` or `--version` output
    /// rather than a failure.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        match self {
            Self::Arguments(error) => matches!(
                error.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ),
        }
    }
}
