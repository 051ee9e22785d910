//! Structured telemetry for the daemon.
//!
//! Every component logs under a `acpd::<component>` target, so a filter such
//! as `info,acpd::dispatch=debug` narrows output to one layer. The subscriber
//! is process-global: the first launch installs it and records its format,
//! later launches in the same process reuse it.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, MakeWriter, time::UtcTime};

use acp_config::{Config, LogFormat};

/// Format of the subscriber installed by the first launch.
static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

/// Describes the subscriber serving the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
    installed: bool,
}

impl TelemetryHandle {
    /// Output format of the active subscriber.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }

    /// Returns `true` when this call installed the subscriber.
    #[must_use]
    pub const fn installed(&self) -> bool {
        self.installed
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter expression does not parse.
    #[error("invalid log filter {filter:?}: {message}")]
    Filter {
        /// Filter text as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// The filter is validated on every call, so a bad `--log-filter` fails the
/// launch even when an earlier launch already owns the subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Subscriber`] when another subscriber is already global.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let mut installed = false;
    let format = *INSTALLED_FORMAT.get_or_try_init(|| {
        let subscriber = build_subscriber(
            filter,
            config.log_format(),
            io::stderr,
            io::stderr().is_terminal(),
        );
        tracing::subscriber::set_global_default(subscriber)
            .map_err(TelemetryError::Subscriber)?;
        installed = true;
        Ok::<_, TelemetryError>(config.log_format())
    })?;
    Ok(TelemetryHandle { format, installed })
}

fn parse_filter(filter: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(filter).map_err(|error| TelemetryError::Filter {
        filter: filter.to_owned(),
        message: error.to_string(),
    })
}

/// Builds the daemon's subscriber writing to `writer`.
fn build_subscriber<W>(
    filter: EnvFilter,
    format: LogFormat,
    writer: W,
    ansi: bool,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    // Workers are named threads; their names identify the serving session.
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_timer(UtcTime::rfc_3339());

    match format {
        LogFormat::Json => Box::new(
            builder
                .with_ansi(false)
                .json()
                .flatten_event(true)
                .finish(),
        ),
        LogFormat::Compact => Box::new(builder.with_ansi(ansi).compact().finish()),
    }
}
