//! Per-server counters.
//!
//! Each [`Server`](crate::Server) owns its own state, so several servers can
//! run side by side in one process.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every worker of one server.
#[derive(Debug, Default)]
pub struct ServerState {
    errors: AtomicU64,
    sessions: AtomicU64,
    responses: AtomicU64,
}

/// Point-in-time copy of [`ServerState`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    /// Handled failures: framing, payload, provider and transport errors.
    pub errors: u64,
    /// Connections accepted.
    pub sessions: u64,
    /// Response frames written.
    pub responses: u64,
}

impl ServerState {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_session(&self) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_response(&self) {
        self.responses.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of handled failures so far.
    #[must_use]
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Number of accepted connections so far.
    #[must_use]
    pub fn session_count(&self) -> u64 {
        self.sessions.load(Ordering::Relaxed)
    }

    /// Number of response frames written so far.
    #[must_use]
    pub fn response_count(&self) -> u64 {
        self.responses.load(Ordering::Relaxed)
    }

    /// Copies every counter.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            errors: self.error_count(),
            sessions: self.session_count(),
            responses: self.response_count(),
        }
    }
}
