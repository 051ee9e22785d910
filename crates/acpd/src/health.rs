//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use acp_config::Config;

use crate::process::LaunchError;
use crate::state::StateSnapshot;

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn starting(&self);

    /// Invoked once the socket is bound and the workers are running.
    fn ready(&self, config: &Config);

    /// Invoked when launch or supervision fails.
    fn failed(&self, error: &LaunchError);

    /// Invoked after a shutdown signal, before the workers are stopped.
    fn stopping(&self);

    /// Invoked after every worker has exited and the socket is removed.
    fn stopped(&self, snapshot: &StateSnapshot);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn starting(&self) {
        (**self).starting();
    }

    fn ready(&self, config: &Config) {
        (**self).ready(config);
    }

    fn failed(&self, error: &LaunchError) {
        (**self).failed(error);
    }

    fn stopping(&self) {
        (**self).stopping();
    }

    fn stopped(&self, snapshot: &StateSnapshot) {
        (**self).stopped(snapshot);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn starting(&self) {
        tracing::info!(
            target: "acpd::health",
            event = "starting",
            "starting daemon"
        );
    }

    fn ready(&self, config: &Config) {
        tracing::info!(
            target: "acpd::health",
            event = "ready",
            socket = %config.socket(),
            workers = config.workers(),
            max_frame_bytes = config.max_frame_bytes(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "daemon ready"
        );
    }

    fn failed(&self, error: &LaunchError) {
        tracing::error!(
            target: "acpd::health",
            event = "failed",
            error = %error,
            "daemon failed"
        );
    }

    fn stopping(&self) {
        tracing::info!(
            target: "acpd::health",
            event = "stopping",
            "stopping daemon"
        );
    }

    fn stopped(&self, snapshot: &StateSnapshot) {
        tracing::info!(
            target: "acpd::health",
            event = "stopped",
            errors = snapshot.errors,
            sessions = snapshot.sessions,
            responses = snapshot.responses,
            "daemon stopped"
        );
    }
}
