//! Request dispatch for threshold-signature calls.
//!
//! The session hands every decoded frame to the [`Dispatcher`], which parses
//! the JSON payload for the call, invokes the crypto provider and builds the
//! response frame:
//!
//! | Request                  | Response                | Provider call |
//! |--------------------------|-------------------------|---------------|
//! | `__CALL_THRESH_SIG_DEAL` | `__RET_THRESH_SIG_DEAL` | `deal`        |
//! | `__CALL_THRESH_SIG_SIGN` | `__RET_THRESH_SIG_SIGN` | `sign`        |
//! | `__CALL_THRESH_SIG_VERI` | `__RET_THRESH_SIG_VERI` | `verify`      |
//!
//! Any other call yields no response at all.
//!
//! Deal also refuses thresholds whose verify request could outgrow the
//! session's frame limit, so every dealt group key stays verifiable.

mod deal;
mod errors;
mod router;
mod sign;
mod verify;

pub use self::deal::VERIFY_MESSAGE_HEADROOM;
pub use self::errors::DispatchError;
pub use self::router::Dispatcher;

pub(crate) use self::router::DISPATCH_TARGET;
