//! Mutex-guarded acceptor shared by the worker pool.

use std::fs;
use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use super::LISTENER_TARGET;

/// Owns the bound listener and the socket file behind it.
///
/// The socket path is unlinked when the acceptor is dropped, which happens
/// once the listener and every worker holding it have finished.
#[derive(Debug)]
pub(super) struct Acceptor {
    listener: Mutex<UnixListener>,
    path: PathBuf,
}

impl Acceptor {
    /// Wraps a bound, non-blocking listener.
    pub(super) fn new(listener: UnixListener, path: PathBuf) -> Self {
        Self {
            listener: Mutex::new(listener),
            path,
        }
    }

    /// Accepts one pending connection, if any.
    ///
    /// The lock is held only for the non-blocking `accept` call. A worker that
    /// panicked while holding it cannot leave the listener inconsistent, so a
    /// poisoned lock is recovered.
    pub(super) fn accept(&self) -> io::Result<Option<UnixStream>> {
        let accepted = {
            let listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
            listener.accept()
        };
        match accepted {
            Ok((stream, _)) => {
                stream.set_nonblocking(false)?;
                Ok(Some(stream))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl Drop for Acceptor {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path)
            && error.kind() != io::ErrorKind::NotFound
        {
            warn!(
                target: LISTENER_TARGET,
                error = %error,
                path = %self.path.display(),
                "failed to remove unix socket file"
            );
        }
    }
}
