//! Connection handling abstractions for the daemon listener.

use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative shutdown flag shared by the listener, its workers and every
/// open session.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown. Idempotent.
    pub(crate) fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Serves a single connection until the peer leaves or `shutdown` is
    /// triggered. Implementations should avoid panicking.
    fn handle(&self, stream: UnixStream, shutdown: &ShutdownToken);
}
