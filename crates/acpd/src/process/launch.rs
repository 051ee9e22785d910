//! Supervises daemon launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::info;

use acp_config::{Config, ConfigError};

use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::provider::{BlsProvider, CryptoProvider};
use crate::server::{Server, ServerSettings};
use crate::telemetry;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load()
    }
}

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
    pub(crate) provider: Arc<dyn CryptoProvider>,
}

/// Runs the daemon using the production collaborators.
///
/// Blocks until SIGTERM, SIGINT, SIGQUIT or SIGHUP arrives, then stops the
/// workers and removes the socket.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal::new(),
        provider: Arc::new(BlsProvider::new()),
    })
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
        provider,
    } = plan;

    reporter.starting();
    let result = supervise(&loader, reporter.as_ref(), &shutdown, provider);
    if let Err(error) = &result {
        reporter.failed(error);
    }
    result
}

fn supervise(
    loader: &dyn ConfigLoader,
    reporter: &dyn HealthReporter,
    shutdown: &dyn ShutdownSignal,
    provider: Arc<dyn CryptoProvider>,
) -> Result<(), LaunchError> {
    let config = loader.load()?;
    let telemetry = telemetry::initialise(&config)?;
    info!(
        target: PROCESS_TARGET,
        socket = %config.socket(),
        log_format = %telemetry.format(),
        subscriber_installed = telemetry.installed(),
        "starting daemon runtime"
    );

    let server = Server::bind(ServerSettings::from(&config), provider)?;
    let running = server.start()?;
    reporter.ready(&config);

    // Stop the server even when waiting for a signal fails.
    let waited = shutdown.wait();
    reporter.stopping();
    let state = running.state();
    running.stop()?;
    waited?;

    reporter.stopped(&state.snapshot());
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
