//! Unix socket transport for the daemon.
//!
//! [`SocketListener`] binds the configured socket path and hands it to an
//! acceptor shared by a fixed pool of worker threads. Each worker loops:
//! accept one connection under the acceptor's lock, then serve it to
//! completion through a [`ConnectionHandler`].

mod acceptor;
mod errors;
mod handler;
mod listener;
mod session;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ShutdownToken};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
pub(crate) use self::session::SessionHandler;
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
