//! Error types for socket listener operations.

use std::io;

use thiserror::Error;

/// Errors surfaced while binding or running the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Switching the listener to non-blocking mode failed.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Binding the socket path failed.
    #[error("failed to bind unix listener at {path}: {source}")]
    Bind {
        /// Socket path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Another process is serving the socket path.
    #[error("existing unix socket {path} is already in use")]
    InUse {
        /// Socket path.
        path: String,
    },
    /// The socket path exists and is not a socket.
    #[error("unix socket path {path} is not a socket")]
    NotSocket {
        /// Socket path.
        path: String,
    },
    /// Reading the existing path's metadata failed.
    #[error("failed to read metadata for unix socket {path}: {source}")]
    Metadata {
        /// Socket path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Probing an existing socket failed for a reason other than refusal.
    #[error("failed to connect to existing unix socket {path}: {source}")]
    Probe {
        /// Socket path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Removing a stale socket file failed.
    #[error("failed to remove stale unix socket {path}: {source}")]
    Cleanup {
        /// Socket path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread {index}: {source}")]
    SpawnWorker {
        /// Index of the worker that failed to start.
        index: usize,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A worker thread panicked.
    #[error("listener worker thread panicked")]
    ThreadPanic,
}
