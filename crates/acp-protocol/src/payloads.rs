//! JSON request and response payloads.
//!
//! Field names are kebab-case on the wire. Key material is carried as an
//! opaque JSON value whose layout belongs to the crypto provider; this crate
//! never inspects it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque, provider-defined key or signature material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Material(Value);

impl Material {
    /// Wraps a provider-encoded JSON value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrows the underlying JSON value.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Material {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Public group key: the `(k, l)` parameters plus the verification material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GroupKey {
    /// Number of signature shares required for a valid signature.
    pub k: usize,
    /// Total number of key shares dealt.
    pub l: usize,
    /// Requested key size in bits.
    pub key_size: u32,
    /// Provider-defined public key material.
    pub key: Material,
}

/// One player's secret key share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KeyShare {
    /// Player index in `[0, l)`.
    pub id: u64,
    /// Provider-defined secret share material.
    pub share: Material,
}

/// One player's share of a signature over a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SignatureShare {
    /// Index of the key share that produced the signature.
    pub id: u64,
    /// Provider-defined signature material.
    pub signature: Material,
}

/// Payload of `__CALL_THRESH_SIG_DEAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DealRequest {
    /// Requested key size in bits.
    pub key_size: u32,
    /// Number of shares to deal.
    pub l: usize,
    /// Number of shares required to sign.
    pub k: usize,
}

/// Payload of `__RET_THRESH_SIG_DEAL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DealResponse {
    /// The dealt group key.
    pub group_key: GroupKey,
    /// Exactly `l` key shares with distinct ids.
    pub shares: Vec<KeyShare>,
}

/// Payload of `__CALL_THRESH_SIG_SIGN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SignRequest {
    /// The signing key share, flattened into the request object.
    #[serde(flatten)]
    pub share: KeyShare,
    /// Message to sign, signed as its UTF-8 bytes.
    pub msg: String,
}

/// Payload of `__CALL_THRESH_SIG_VERI`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VerifyRequest {
    /// Group key the shares were produced under.
    pub group_key: GroupKey,
    /// Signature shares to combine.
    pub signatures: Vec<SignatureShare>,
    /// Message the shares claim to sign.
    pub msg: String,
}

/// Payload of `__RET_THRESH_SIG_VERI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Verdict of the verification.
    pub valid: bool,
}
