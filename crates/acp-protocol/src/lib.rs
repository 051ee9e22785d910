//! Wire protocol shared by the ACP daemon and its clients.
//!
//! Every message on the socket is a frame made of a call token line, an
//! optional newline delimiter, and an optional JSON payload:
//!
//! ```text
//! __CALL_THRESH_SIG_DEAL
//! {"key-size":512,"l":6,"k":5}
//! ```
//!
//! The crate is split into three layers:
//!
//! - [`call`] holds the closed registry of call identifiers and their fixed
//!   wire tokens.
//! - [`codec`] encodes and decodes frames and owns the size-checked receive
//!   buffer used by both ends of a connection.
//! - [`payloads`] defines the JSON request and response shapes, including the
//!   opaque key material descriptors exchanged with the crypto provider.

pub mod call;
pub mod codec;
pub mod payloads;

pub use call::CallId;
pub use codec::{CodecError, Frame, FrameBuffer, RawFrame, decode, encode};
pub use payloads::{
    DealRequest, DealResponse, GroupKey, KeyShare, Material, SignRequest, SignatureShare,
    VerifyRequest, VerifyResponse,
};
