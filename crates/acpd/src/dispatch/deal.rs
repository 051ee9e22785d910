//! Handler for `__CALL_THRESH_SIG_DEAL`.

use serde_json::Value;
use tracing::debug;

use acp_protocol::{
    CallId, DealRequest, DealResponse, Frame, GroupKey, Material, SignatureShare, VerifyRequest,
};

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use crate::provider::{CryptoProvider, DealtKeys};

/// Bytes of every verify request reserved for the JSON-encoded message.
pub const VERIFY_MESSAGE_HEADROOM: usize = 1024;

pub(super) fn handle(
    provider: &dyn CryptoProvider,
    request: DealRequest,
    frame_limit: usize,
) -> Result<DealResponse, DispatchError> {
    let DealRequest { key_size, l, k } = request;
    if k == 0 {
        return Err(DispatchError::invalid_arguments("k must be at least 1"));
    }
    if k > l {
        return Err(DispatchError::invalid_arguments(format!(
            "k ({k}) must not exceed l ({l})"
        )));
    }

    let DealtKeys { group_key, shares } = provider.deal(key_size, l, k)?;
    let verify_bound = verify_frame_bound(provider, &group_key)?;
    if verify_bound > frame_limit {
        return Err(DispatchError::invalid_arguments(format!(
            "a verify request for k = {k} may need {verify_bound} bytes, \
             above the {frame_limit}-byte frame limit"
        )));
    }
    debug!(
        target: DISPATCH_TARGET,
        key_size,
        l,
        k,
        shares = shares.len(),
        verify_bound,
        "dealt threshold keys"
    );
    Ok(DealResponse { group_key, shares })
}

/// Largest verify frame a client can build from `group_key`: `k` shares with
/// the widest id and the longest signature material, plus the message
/// headroom.
fn verify_frame_bound(
    provider: &dyn CryptoProvider,
    group_key: &GroupKey,
) -> Result<usize, DispatchError> {
    let widest_id = u64::try_from(group_key.l.saturating_sub(1)).unwrap_or(u64::MAX);
    let filler = "0".repeat(provider.signature_len_bound().saturating_sub(2));
    let share = SignatureShare {
        id: widest_id,
        signature: Material::new(Value::String(filler)),
    };
    let request = VerifyRequest {
        group_key: group_key.clone(),
        signatures: vec![share; group_key.k],
        msg: String::new(),
    };
    let frame = Frame::new(CallId::VerifyRequest, serde_json::to_string(&request)?);
    Ok(frame.encode().len().saturating_add(VERIFY_MESSAGE_HEADROOM))
}
