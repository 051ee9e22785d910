//! Server lifecycle: bind, start, stop.
//!
//! A [`Server`] owns its socket path, worker count, provider and counters.
//! Nothing is process-global, so tests run several servers side by side.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use acp_config::{Config, SocketPath, SocketPreparationError};

use crate::dispatch::Dispatcher;
use crate::provider::CryptoProvider;
use crate::state::ServerState;
use crate::transport::{ListenerError, ListenerHandle, SessionHandler, SocketListener};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Settings a server needs from the wider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Socket path to serve.
    pub socket: SocketPath,
    /// Worker threads; zero is treated as one.
    pub workers: usize,
    /// Largest accepted request frame, in bytes.
    pub max_frame_bytes: usize,
    /// How often blocked accepts and reads check for shutdown.
    pub poll_interval: Duration,
}

impl ServerSettings {
    /// Settings for `socket` with the default limits.
    #[must_use]
    pub fn new(socket: SocketPath) -> Self {
        Self::from(&Config::new(socket))
    }

    /// Overrides the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

impl From<&Config> for ServerSettings {
    fn from(config: &Config) -> Self {
        Self {
            socket: config.socket().clone(),
            workers: config.workers(),
            max_frame_bytes: config.max_frame_bytes(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Errors raised while starting or stopping a server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The socket directory could not be prepared.
    #[error("failed to prepare socket directory: {0}")]
    Prepare(#[from] SocketPreparationError),
    /// Binding, spawning or joining the workers failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// A server whose socket is bound but whose workers are not yet running.
///
/// Dropping it removes the socket file.
pub struct Server {
    settings: ServerSettings,
    provider: Arc<dyn CryptoProvider>,
    state: Arc<ServerState>,
    listener: SocketListener,
}

impl Server {
    /// Prepares the socket directory and binds the socket.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created, when another live server
    /// holds the path, or when the path exists and is not a socket.
    pub fn bind(
        settings: ServerSettings,
        provider: Arc<dyn CryptoProvider>,
    ) -> Result<Self, ServerError> {
        settings.socket.prepare_filesystem()?;
        let listener = SocketListener::bind(&settings.socket)?;
        Ok(Self {
            settings,
            provider,
            state: Arc::new(ServerState::new()),
            listener,
        })
    }

    /// Counters for this server.
    #[must_use]
    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Socket path being served.
    #[must_use]
    pub fn socket(&self) -> &SocketPath {
        &self.settings.socket
    }

    /// Starts the worker pool.
    ///
    /// # Errors
    ///
    /// Fails when a worker thread cannot be spawned. Workers already started
    /// are stopped and the socket is removed.
    pub fn start(self) -> Result<RunningServer, ServerError> {
        let Self {
            settings,
            provider,
            state,
            listener,
        } = self;
        let handler = Arc::new(SessionHandler::new(
            Dispatcher::new(provider, settings.max_frame_bytes),
            Arc::clone(&state),
            settings.max_frame_bytes,
            settings.poll_interval,
        ));
        let handle = listener.start(handler, settings.workers)?;
        info!(
            target: SERVER_TARGET,
            socket = %settings.socket,
            workers = settings.workers.max(1),
            max_frame_bytes = settings.max_frame_bytes,
            "server started"
        );
        Ok(RunningServer {
            socket: settings.socket,
            state,
            handle,
        })
    }
}

/// A server with live workers.
///
/// Dropping it requests shutdown without waiting; call [`Self::stop`] to
/// wait for the workers and the socket removal.
pub struct RunningServer {
    socket: SocketPath,
    state: Arc<ServerState>,
    handle: ListenerHandle,
}

impl RunningServer {
    /// Asks the workers to stop. Open sessions close at their next poll.
    pub fn shutdown(&self) {
        self.handle.shutdown();
    }

    /// Waits for every worker to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Listener`] when a worker panicked.
    pub fn join(self) -> Result<(), ServerError> {
        let Self {
            socket,
            state,
            handle,
        } = self;
        handle.join()?;
        let snapshot = state.snapshot();
        info!(
            target: SERVER_TARGET,
            socket = %socket,
            errors = snapshot.errors,
            sessions = snapshot.sessions,
            responses = snapshot.responses,
            "server stopped"
        );
        Ok(())
    }

    /// Requests shutdown and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Listener`] when a worker panicked.
    pub fn stop(self) -> Result<(), ServerError> {
        self.shutdown();
        self.join()
    }

    /// Counters for this server.
    #[must_use]
    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Handled failures so far.
    #[must_use]
    pub fn error_count(&self) -> u64 {
        self.state.error_count()
    }

    /// Socket path being served.
    #[must_use]
    pub fn socket(&self) -> &SocketPath {
        &self.socket
    }
}
