//! Test configuration loaders for scenarios covering success and failure paths.

use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use acp_config::{Config, ConfigError, SocketPath};

use crate::process::ConfigLoader;

/// Loader that provisions a Unix socket path under a temporary directory.
#[derive(Clone)]
pub struct TestConfigLoader {
    socket_dir: Arc<TempDir>,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory for socket");
        Self {
            socket_dir: Arc::new(dir),
        }
    }

    /// Socket path every loaded configuration points at.
    pub fn socket(&self) -> SocketPath {
        let path = Utf8PathBuf::from_path_buf(self.socket_dir.path().join("run/acpd.sock"))
            .expect("temporary socket path was not valid UTF-8");
        SocketPath::new(path)
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(Config::new(self.socket())
            .with_workers(4)
            .with_poll_interval(Duration::from_millis(20)))
    }
}

/// Loader that intentionally fails by passing a non-Unix socket URL.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load_from_iter(["acpd", "tcp://127.0.0.1:9000"])
    }
}
