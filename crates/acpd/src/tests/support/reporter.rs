//! Test double for [`HealthReporter`] that records lifecycle events.

use std::sync::Mutex;

use acp_config::Config;

use crate::health::HealthReporter;
use crate::process::LaunchError;
use crate::state::StateSnapshot;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Launch started.
    Starting,
    /// Workers are serving.
    Ready,
    /// Launch or supervision failed with an error description.
    Failed(String),
    /// Shutdown began.
    Stopping,
    /// Shutdown finished with the final counters.
    Stopped(StateSnapshot),
}

impl HealthEvent {
    /// Short name used in feature files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Failed(_) => "failed",
            Self::Stopping => "stopping",
            Self::Stopped(_) => "stopped",
        }
    }
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Names of the recorded events, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(HealthEvent::name).collect()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn starting(&self) {
        self.record(HealthEvent::Starting);
    }

    fn ready(&self, _config: &Config) {
        self.record(HealthEvent::Ready);
    }

    fn failed(&self, error: &LaunchError) {
        self.record(HealthEvent::Failed(error.to_string()));
    }

    fn stopping(&self) {
        self.record(HealthEvent::Stopping);
    }

    fn stopped(&self, snapshot: &StateSnapshot) {
        self.record(HealthEvent::Stopped(*snapshot));
    }
}
