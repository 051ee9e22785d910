//! Registry of call identifiers and their wire tokens.
//!
//! The token strings are an external compatibility surface: peers compiled
//! against older revisions match on the exact bytes, so they must never be
//! renamed.

use std::fmt;

/// Identifies the kind of a frame on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallId {
    /// Request to deal a group key and `l` key shares.
    DealRequest,
    /// Response carrying the dealt group key and shares.
    DealResponse,
    /// Request to produce a signature share with one key share.
    SignRequest,
    /// Response carrying a signature share.
    SignResponse,
    /// Request to verify a set of signature shares against a group key.
    VerifyRequest,
    /// Response carrying the verification verdict.
    VerifyResponse,
    /// Sentinel for tokens outside the registry. Never sent intentionally.
    Unknown,
}

impl CallId {
    /// Every registered identifier, in wire-table order.
    pub const ALL: [Self; 7] = [
        Self::DealRequest,
        Self::DealResponse,
        Self::SignRequest,
        Self::SignResponse,
        Self::VerifyRequest,
        Self::VerifyResponse,
        Self::Unknown,
    ];

    /// Returns the wire token for this identifier.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::DealRequest => "__CALL_THRESH_SIG_DEAL",
            Self::DealResponse => "__RET_THRESH_SIG_DEAL",
            Self::SignRequest => "__CALL_THRESH_SIG_SIGN",
            Self::SignResponse => "__RET_THRESH_SIG_SIGN",
            Self::VerifyRequest => "__CALL_THRESH_SIG_VERI",
            Self::VerifyResponse => "__RET_THRESH_SIG_VERI",
            Self::Unknown => "__NO_CALL",
        }
    }

    /// Resolves a wire token. Tokens outside the registry map to
    /// [`CallId::Unknown`]; the lookup is exact and case-sensitive.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "__CALL_THRESH_SIG_DEAL" => Self::DealRequest,
            "__RET_THRESH_SIG_DEAL" => Self::DealResponse,
            "__CALL_THRESH_SIG_SIGN" => Self::SignRequest,
            "__RET_THRESH_SIG_SIGN" => Self::SignResponse,
            "__CALL_THRESH_SIG_VERI" => Self::VerifyRequest,
            "__RET_THRESH_SIG_VERI" => Self::VerifyResponse,
            _ => Self::Unknown,
        }
    }

    /// Returns the response identifier paired with a request identifier.
    #[must_use]
    pub const fn response(self) -> Option<Self> {
        match self {
            Self::DealRequest => Some(Self::DealResponse),
            Self::SignRequest => Some(Self::SignResponse),
            Self::VerifyRequest => Some(Self::VerifyResponse),
            Self::DealResponse | Self::SignResponse | Self::VerifyResponse | Self::Unknown => None,
        }
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.token())
    }
}
