//! Seam between request dispatch and the threshold-signature mathematics.
//!
//! The daemon never interprets key material itself. Handlers pass the opaque
//! descriptors from the wire to a [`CryptoProvider`] and hand back whatever it
//! produces, so swapping the scheme only touches this module.

mod bls;

use thiserror::Error;

use acp_protocol::{GroupKey, KeyShare, SignatureShare};

pub use bls::{BlsProvider, SUPPORTED_KEY_SIZES};

/// Output of a successful deal.
#[derive(Debug, Clone, PartialEq)]
pub struct DealtKeys {
    /// Public group key, carrying `k`, `l` and the key size.
    pub group_key: GroupKey,
    /// Exactly `l` key shares with distinct ids in `[0, l)`.
    pub shares: Vec<KeyShare>,
}

/// Threshold-signature operations the daemon exposes.
///
/// Implementations are stateless and shared between workers, so every method
/// may run concurrently.
#[cfg_attr(test, mockall::automock)]
pub trait CryptoProvider: Send + Sync {
    /// Deals a fresh group key and `l` shares of which `k` are needed to sign.
    fn deal(&self, key_size: u32, l: usize, k: usize) -> Result<DealtKeys, ProviderError>;

    /// Produces a signature share over `msg` with one key share.
    fn sign(&self, share: &KeyShare, msg: &[u8]) -> Result<SignatureShare, ProviderError>;

    /// Combines `shares` and checks the result against `group_key`.
    ///
    /// Returns `Ok(false)` for a well-formed but wrong signature. Malformed,
    /// duplicate or out-of-range input is an error.
    fn verify(
        &self,
        group_key: &GroupKey,
        shares: &[SignatureShare],
        msg: &[u8],
    ) -> Result<bool, ProviderError>;

    /// Upper bound on the JSON length of one signature share's material.
    ///
    /// Deal uses it to refuse thresholds whose verify request could never
    /// fit in a frame.
    fn signature_len_bound(&self) -> usize;
}

/// Failures reported by a [`CryptoProvider`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested key size is not offered.
    #[error("unsupported key size {key_size}")]
    UnsupportedKeySize {
        /// Requested size in bits.
        key_size: u32,
    },
    /// The `(k, l)` pair cannot describe a threshold scheme.
    #[error("invalid threshold: k = {k}, l = {l}")]
    InvalidThreshold {
        /// Required shares.
        k: usize,
        /// Dealt shares.
        l: usize,
    },
    /// A descriptor could not be decoded into provider material.
    #[error("malformed {what}: {source}")]
    MalformedMaterial {
        /// Kind of descriptor that failed to decode.
        what: &'static str,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
    /// Provider material could not be encoded as a descriptor.
    #[error("failed to encode {what}: {source}")]
    EncodeMaterial {
        /// Kind of descriptor that failed to encode.
        what: &'static str,
        /// Underlying encoding error.
        #[source]
        source: serde_json::Error,
    },
    /// A share id lies outside `[0, l)`.
    #[error("share id {id} is outside the dealt range 0..{l}")]
    ShareOutOfRange {
        /// Offending id.
        id: u64,
        /// Number of dealt shares.
        l: usize,
    },
    /// The group key's declared `k` disagrees with its material.
    #[error("group key declares k = {declared} but its material requires {actual} shares")]
    ThresholdMismatch {
        /// `k` carried in the descriptor.
        declared: usize,
        /// Shares required by the material.
        actual: usize,
    },
    /// The same share id was supplied more than once.
    #[error("signature share {id} supplied more than once")]
    DuplicateShare {
        /// Repeated id.
        id: u64,
    },
    /// Interpolating the signature shares failed.
    #[error("failed to combine signature shares: {message}")]
    Combine {
        /// Description from the underlying library.
        message: String,
    },
}

impl ProviderError {
    pub(crate) fn malformed(what: &'static str, source: serde_json::Error) -> Self {
        Self::MalformedMaterial { what, source }
    }

    pub(crate) fn encode(what: &'static str, source: serde_json::Error) -> Self {
        Self::EncodeMaterial { what, source }
    }
}
