use std::fmt;
use std::fs::DirBuilder;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const UNIX_SCHEME: &str = "unix://";

/// Filesystem path of the daemon's Unix domain socket.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SocketPath(Utf8PathBuf);

impl SocketPath {
    /// Wraps a socket path.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self(path.into())
    }

    /// Borrows the path.
    #[must_use]
    pub fn as_path(&self) -> &Utf8Path {
        &self.0
    }

    /// Ensures the socket's parent directory exists with restrictive permissions.
    ///
    /// Paths without a parent component (for example `acp.sock`) resolve to
    /// the working directory and need no preparation.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(parent) = self.0.parent() else {
            return Err(SocketPreparationError::MissingParent {
                path: self.0.clone(),
            });
        };
        if parent.as_str().is_empty() {
            return Ok(());
        }

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(parent.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            });
        }

        Ok(())
    }
}

impl AsRef<Utf8Path> for SocketPath {
    fn as_ref(&self) -> &Utf8Path {
        self.as_path()
    }
}

impl From<Utf8PathBuf> for SocketPath {
    fn from(path: Utf8PathBuf) -> Self {
        Self(path)
    }
}

impl fmt::Display for SocketPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{UNIX_SCHEME}{}", self.0)
    }
}

impl FromStr for SocketPath {
    type Err = SocketParseError;

    /// Accepts either a bare path or a `unix://` URL.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let path = match input.strip_prefix(UNIX_SCHEME) {
            Some(path) => path,
            None => {
                if let Some((scheme, _)) = input.split_once("://") {
                    return Err(SocketParseError::UnsupportedScheme(scheme.to_owned()));
                }
                input
            }
        };
        if path.is_empty() {
            return Err(SocketParseError::MissingPath(input.to_owned()));
        }
        Ok(Self::new(path))
    }
}

/// Errors encountered while parsing a [`SocketPath`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Scheme was not `unix`.
    #[error("unsupported socket scheme '{0}'; only unix sockets are served")]
    UnsupportedScheme(String),
    /// Path component was absent.
    #[error("missing Unix socket path in '{0}'")]
    MissingPath(String),
}

/// Errors raised when preparing socket directories.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// Socket path has no parent directory.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent {
        /// Offending socket path.
        path: Utf8PathBuf,
    },
    /// Failed to create the socket directory.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
