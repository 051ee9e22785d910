//! Handler for `__CALL_THRESH_SIG_SIGN`.

use acp_protocol::{SignRequest, SignatureShare};

use super::errors::DispatchError;
use crate::provider::CryptoProvider;

pub(super) fn handle(
    provider: &dyn CryptoProvider,
    request: &SignRequest,
) -> Result<SignatureShare, DispatchError> {
    let signature = provider.sign(&request.share, request.msg.as_bytes())?;
    // The response always echoes the id of the share that signed.
    Ok(SignatureShare {
        id: request.share.id,
        signature: signature.signature,
    })
}
