//! Handler for `__CALL_THRESH_SIG_VERI`.
//!
//! Verification never fails at the protocol level: every fault becomes
//! `{"valid":false}`.

use tracing::{debug, warn};

use acp_protocol::{VerifyRequest, VerifyResponse};

use super::DISPATCH_TARGET;
use crate::provider::CryptoProvider;

pub(super) fn handle(provider: &dyn CryptoProvider, request: &VerifyRequest) -> VerifyResponse {
    let supplied = request.signatures.len();
    let required = request.group_key.k;
    if supplied < required {
        debug!(
            target: DISPATCH_TARGET,
            supplied,
            required,
            "not enough signature shares to verify"
        );
        return VerifyResponse { valid: false };
    }

    let valid = match provider.verify(
        &request.group_key,
        &request.signatures,
        request.msg.as_bytes(),
    ) {
        Ok(valid) => valid,
        Err(error) => {
            warn!(
                target: DISPATCH_TARGET,
                %error,
                "signature verification rejected its input"
            );
            false
        }
    };
    VerifyResponse { valid }
}
