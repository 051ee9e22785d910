//! Error types for request dispatch failures.
//!
//! None of these reach the wire. The session logs them, bumps the error
//! counter and moves on to the next request.

use thiserror::Error;

use acp_protocol::CallId;

use crate::provider::ProviderError;

/// Errors surfaced while handling a single request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A request call arrived without its JSON payload.
    #[error("{call} requires a payload")]
    MissingPayload {
        /// Call that was missing its payload.
        call: CallId,
    },

    /// The payload did not match the request shape for the call.
    #[error("malformed {call} payload: {source}")]
    MalformedPayload {
        /// Call whose payload failed to parse.
        call: CallId,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Arguments parsed but violate the request's constraints.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// Description of the violated constraint.
        message: String,
    },

    /// The crypto provider rejected the request.
    #[error("crypto provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// Response serialization failed.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[from] serde_json::Error),
}

impl DispatchError {
    /// Creates a missing payload error.
    pub fn missing_payload(call: CallId) -> Self {
        Self::MissingPayload { call }
    }

    /// Creates a malformed payload error from a serde error.
    pub fn malformed(call: CallId, source: serde_json::Error) -> Self {
        Self::MalformedPayload { call, source }
    }

    /// Creates an invalid arguments error.
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }
}
