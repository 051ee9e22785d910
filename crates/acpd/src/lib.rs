//! Threshold-signature RPC daemon.
//!
//! `acpd` serves deal, sign and verify calls over a local Unix domain socket.
//! Each request is a single frame: a call token, a newline and a JSON
//! payload (see [`acp_protocol`]). A fixed pool of worker threads accepts
//! connections and serves each one to completion, answering every
//! well-formed request with exactly one response frame. Anything else is
//! logged, counted and skipped without a reply.
//!
//! The threshold mathematics sit behind the [`CryptoProvider`] trait;
//! [`BlsProvider`] implements it over BLS12-381 with `threshold_crypto`.
//!
//! Launch order is configuration, telemetry, socket bind, workers, ready.
//! On SIGTERM, SIGINT, SIGQUIT or SIGHUP the workers drain and the socket
//! file is removed before the process exits.

mod dispatch;
mod health;
mod process;
mod provider;
mod server;
mod state;
mod telemetry;
mod transport;

pub use dispatch::{DispatchError, Dispatcher, VERIFY_MESSAGE_HEADROOM};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    ConfigLoader, LaunchError, ShutdownError, ShutdownSignal, SystemConfigLoader,
    SystemShutdownSignal, run_daemon,
};
pub use provider::{BlsProvider, CryptoProvider, DealtKeys, ProviderError, SUPPORTED_KEY_SIZES};
pub use server::{RunningServer, Server, ServerError, ServerSettings};
pub use state::{ServerState, StateSnapshot};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
