//! Listener and worker pool for the daemon socket.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use acp_config::SocketPath;

use super::acceptor::Acceptor;
use super::{ConnectionHandler, LISTENER_TARGET, ListenerError, ShutdownToken};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Listener bound to the daemon socket but not yet accepting.
#[derive(Debug)]
pub(crate) struct SocketListener {
    socket: SocketPath,
    acceptor: Acceptor,
}

impl SocketListener {
    /// Binds `socket`, replacing a stale socket file left by a dead process.
    ///
    /// Fails without retrying when another process serves the path or the
    /// path is not a socket.
    pub(crate) fn bind(socket: &SocketPath) -> Result<Self, ListenerError> {
        let path = socket.as_path().as_std_path();
        let listener = bind_unix(path)?;
        let acceptor = Acceptor::new(listener, path.to_path_buf());
        Ok(Self {
            socket: socket.clone(),
            acceptor,
        })
    }

    /// Spawns `workers` threads that accept and serve connections.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
        workers: usize,
    ) -> Result<ListenerHandle, ListenerError> {
        let Self { socket, acceptor } = self;
        let acceptor = Arc::new(acceptor);
        let shutdown = ShutdownToken::new();
        let workers = workers.max(1);

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let acceptor = Arc::clone(&acceptor);
            let shutdown_flag = shutdown.clone();
            let handler = Arc::clone(&handler);
            let spawned = thread::Builder::new()
                .name(format!("acpd-worker-{index}"))
                .spawn(move || run_worker(index, &acceptor, &shutdown_flag, handler.as_ref()));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    shutdown.trigger();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(ListenerError::SpawnWorker { index, source });
                }
            }
        }

        info!(
            target: LISTENER_TARGET,
            socket = %socket,
            workers,
            "socket listener active"
        );
        Ok(ListenerHandle {
            shutdown,
            workers: handles,
        })
    }
}

/// Handle to the running worker pool.
pub(crate) struct ListenerHandle {
    shutdown: ShutdownToken,
    workers: Vec<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks every worker and open session to stop.
    pub(crate) fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Waits for every worker to finish. The socket file is removed once the
    /// last worker exits.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        let mut panicked = false;
        for handle in self.workers.drain(..) {
            panicked |= handle.join().is_err();
        }
        if panicked {
            Err(ListenerError::ThreadPanic)
        } else {
            Ok(())
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

fn run_worker(
    index: usize,
    acceptor: &Acceptor,
    shutdown: &ShutdownToken,
    handler: &dyn ConnectionHandler,
) {
    debug!(target: LISTENER_TARGET, worker = index, "worker started");
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.is_triggered() {
        match acceptor.accept() {
            Ok(Some(stream)) => {
                last_error = None;
                debug!(target: LISTENER_TARGET, worker = index, "connection accepted");
                handler.handle(stream, shutdown);
            }
            Ok(None) => {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        worker = index,
                        error = %error,
                        "socket accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
    debug!(target: LISTENER_TARGET, worker = index, "worker stopped");
}

fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    if path.exists() {
        let metadata = fs::symlink_metadata(path).map_err(|source| ListenerError::Metadata {
            path: path.display().to_string(),
            source,
        })?;
        if !metadata.file_type().is_socket() {
            return Err(ListenerError::NotSocket {
                path: path.display().to_string(),
            });
        }
        match UnixStream::connect(path) {
            Ok(_stream) => {
                return Err(ListenerError::InUse {
                    path: path.display().to_string(),
                });
            }
            Err(error)
                if error.kind() == io::ErrorKind::ConnectionRefused
                    || error.kind() == io::ErrorKind::NotFound =>
            {
                debug!(
                    target: LISTENER_TARGET,
                    path = %path.display(),
                    "removing stale unix socket"
                );
                fs::remove_file(path).map_err(|source| ListenerError::Cleanup {
                    path: path.display().to_string(),
                    source,
                })?;
            }
            Err(error) => {
                return Err(ListenerError::Probe {
                    path: path.display().to_string(),
                    source: error,
                });
            }
        }
    }

    let listener = UnixListener::bind(path).map_err(|source| ListenerError::Bind {
        path: path.display().to_string(),
        source,
    })?;
    if let Err(source) = listener.set_nonblocking(true) {
        drop(listener);
        let _ = fs::remove_file(path);
        return Err(ListenerError::NonBlocking { source });
    }
    Ok(listener)
}
