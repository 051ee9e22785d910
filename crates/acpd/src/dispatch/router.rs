//! Call routing for request dispatch.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use acp_protocol::{CallId, Frame};

use super::errors::DispatchError;
use super::{deal, sign, verify};
use crate::provider::CryptoProvider;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes decoded calls to their handlers.
///
/// Cloning is cheap; every worker shares the same provider.
#[derive(Clone)]
pub struct Dispatcher {
    provider: Arc<dyn CryptoProvider>,
    frame_limit: usize,
}

impl Dispatcher {
    /// Creates a dispatcher backed by `provider` for sessions that accept
    /// frames of at most `frame_limit` bytes.
    pub fn new(provider: Arc<dyn CryptoProvider>, frame_limit: usize) -> Self {
        Self {
            provider,
            frame_limit,
        }
    }

    /// Handles one request and returns the response frame.
    ///
    /// Returns `Ok(None)` for calls that have no response: the `Unknown`
    /// sentinel and response-kind tokens sent by confused peers.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the payload is missing or malformed,
    /// when deal arguments are out of range or would deal a group key too
    /// large to verify within the frame limit, when the provider fails during
    /// deal or sign, or when the response cannot be serialized.
    pub fn dispatch(
        &self,
        call: CallId,
        payload: Option<&str>,
    ) -> Result<Option<Frame>, DispatchError> {
        let provider = self.provider.as_ref();
        let frame = match call {
            CallId::DealRequest => {
                let response = deal::handle(provider, parse(call, payload)?, self.frame_limit)?;
                respond(CallId::DealResponse, &response)?
            }
            CallId::SignRequest => {
                let response = sign::handle(provider, &parse(call, payload)?)?;
                respond(CallId::SignResponse, &response)?
            }
            CallId::VerifyRequest => {
                let response = verify::handle(provider, &parse(call, payload)?);
                respond(CallId::VerifyResponse, &response)?
            }
            CallId::DealResponse
            | CallId::SignResponse
            | CallId::VerifyResponse
            | CallId::Unknown => {
                debug!(target: DISPATCH_TARGET, %call, "call has no handler");
                return Ok(None);
            }
        };
        debug!(
            target: DISPATCH_TARGET,
            %call,
            response = %frame.call(),
            "request handled"
        );
        Ok(Some(frame))
    }
}

fn parse<T: DeserializeOwned>(call: CallId, payload: Option<&str>) -> Result<T, DispatchError> {
    let payload = payload.ok_or_else(|| DispatchError::missing_payload(call))?;
    serde_json::from_str(payload).map_err(|source| DispatchError::malformed(call, source))
}

fn respond<T: Serialize>(call: CallId, body: &T) -> Result<Frame, DispatchError> {
    Ok(Frame::new(call, serde_json::to_string(body)?))
}
