//! Frame encoding and decoding.
//!
//! A frame is the call token, then (only when a payload is present) a single
//! `0x0A` delimiter followed by the payload bytes. Frames are not terminated:
//! one socket read is one frame, which is why the receive side goes through
//! [`FrameBuffer`] and its explicit capacity check instead of a bare `read`
//! into a fixed array.

use std::io::{self, Read, Write};
use std::str;

use thiserror::Error;

use crate::call::CallId;

/// Delimiter between the call token and the payload.
pub const DELIMITER: u8 = b'\n';

/// Default receive capacity for a single frame.
pub const DEFAULT_FRAME_LIMIT: usize = 16 * 1024;

/// Errors raised while reading or decoding frames.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The buffer was empty or its first line carried no call token.
    #[error("unexpected: call was empty")]
    EmptyCall,
    /// The frame bytes were not valid UTF-8.
    #[error("frame is not valid UTF-8: {0}")]
    NotUtf8(#[from] str::Utf8Error),
    /// The peer sent more bytes than fit in one receive buffer.
    #[error("frame exceeds the {limit} byte receive limit")]
    FrameTooLarge {
        /// Capacity of the receive buffer in bytes.
        limit: usize,
    },
    /// Reading from the transport failed.
    #[error("failed to read frame: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Returns `true` when the error is a read timeout rather than a fault.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(error)
                if matches!(error.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        )
    }
}

/// Encodes a call token and optional payload into frame bytes.
#[must_use]
pub fn encode(call: CallId, payload: Option<&[u8]>) -> Vec<u8> {
    let token = call.token().as_bytes();
    let payload_len = payload.map_or(0, |bytes| bytes.len().saturating_add(1));
    let mut frame = Vec::with_capacity(token.len().saturating_add(payload_len));
    frame.extend_from_slice(token);
    if let Some(bytes) = payload {
        frame.push(DELIMITER);
        frame.extend_from_slice(bytes);
    }
    frame
}

/// Decodes frame bytes into the call token line and the payload text.
///
/// The first line is the call token. Everything after the first delimiter is
/// the payload, with trailing line terminators removed; an empty payload is
/// reported as absent. A carriage return before a delimiter is tolerated.
///
/// # Errors
///
/// Returns [`CodecError::EmptyCall`] when the first line is empty and
/// [`CodecError::NotUtf8`] when the bytes are not UTF-8.
pub fn decode(bytes: &[u8]) -> Result<RawFrame<'_>, CodecError> {
    let text = str::from_utf8(bytes)?;
    let (token, payload) = match text.split_once(char::from(DELIMITER)) {
        Some((token, rest)) => (token, Some(rest)),
        None => (text, None),
    };
    let token = token.strip_suffix('\r').unwrap_or(token);
    if token.is_empty() {
        return Err(CodecError::EmptyCall);
    }
    let payload = payload
        .map(|rest| rest.trim_end_matches(['\r', '\n']))
        .filter(|rest| !rest.is_empty());
    Ok(RawFrame { token, payload })
}

/// Borrowed view of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame<'a> {
    token: &'a str,
    payload: Option<&'a str>,
}

impl<'a> RawFrame<'a> {
    /// The call token exactly as received.
    #[must_use]
    pub const fn token(&self) -> &'a str {
        self.token
    }

    /// The payload text, when one was sent.
    #[must_use]
    pub const fn payload(&self) -> Option<&'a str> {
        self.payload
    }

    /// Resolves the token against the call registry.
    #[must_use]
    pub fn call(&self) -> CallId {
        CallId::parse(self.token)
    }
}

/// Owned frame ready to be written to a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    call: CallId,
    payload: Option<String>,
}

impl Frame {
    /// Builds a frame carrying a JSON payload.
    #[must_use]
    pub fn new(call: CallId, payload: impl Into<String>) -> Self {
        Self {
            call,
            payload: Some(payload.into()),
        }
    }

    /// Builds a frame without a payload.
    #[must_use]
    pub const fn bare(call: CallId) -> Self {
        Self {
            call,
            payload: None,
        }
    }

    /// Call identifier of the frame.
    #[must_use]
    pub const fn call(&self) -> CallId {
        self.call
    }

    /// Payload text, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Encodes the frame into wire bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode(self.call, self.payload.as_deref().map(str::as_bytes))
    }

    /// Writes the encoded frame and flushes the writer.
    ///
    /// # Errors
    ///
    /// Propagates any write or flush failure.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.encode())?;
        writer.flush()
    }
}

/// Reusable, fixed-capacity receive buffer.
///
/// The buffer holds one spare byte beyond the limit so that a read filling
/// more than `limit` bytes is detected instead of silently truncated.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
    limit: usize,
}

impl FrameBuffer {
    /// Creates a buffer accepting frames of at most `limit` bytes.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            buffer: vec![0; limit.saturating_add(1)],
            limit,
        }
    }

    /// Performs one read and returns the received frame bytes.
    ///
    /// Returns `Ok(None)` when the peer has closed the stream. Interrupted
    /// reads are retried.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::FrameTooLarge`] when the read exceeded the limit
    /// and [`CodecError::Io`] for transport failures, including timeouts.
    pub fn read_frame<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<&[u8]>, CodecError> {
        let read = loop {
            match reader.read(&mut self.buffer) {
                Ok(read) => break read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(CodecError::Io(error)),
            }
        };
        if read == 0 {
            return Ok(None);
        }
        if read > self.limit {
            return Err(CodecError::FrameTooLarge { limit: self.limit });
        }
        self.buffer
            .get(..read)
            .map(Some)
            .ok_or(CodecError::FrameTooLarge { limit: self.limit })
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    const PAYLOAD: &str = r#"{"key-size":512,"l":6,"k":5}"#;

    #[test]
    fn encodes_token_delimiter_and_payload() {
        let bytes = encode(CallId::DealRequest, Some(PAYLOAD.as_bytes()));
        let expected = format!("__CALL_THRESH_SIG_DEAL\n{PAYLOAD}");
        assert_eq!(bytes, expected.into_bytes());
    }

    #[test]
    fn bare_frames_have_no_delimiter() {
        assert_eq!(
            Frame::bare(CallId::VerifyResponse).encode(),
            b"__RET_THRESH_SIG_VERI".to_vec()
        );
    }

    #[test]
    fn decode_recovers_token_and_payload_for_every_call() {
        for call in CallId::ALL {
            let bytes = encode(call, Some(PAYLOAD.as_bytes()));
            let frame = decode(&bytes).expect("decode frame");
            assert_eq!(frame.token(), call.token());
            assert_eq!(frame.payload(), Some(PAYLOAD));
            assert_eq!(frame.call(), call);

            let bare = encode(call, None);
            let frame = decode(&bare).expect("decode bare frame");
            assert_eq!(frame.token(), call.token());
            assert_eq!(frame.payload(), None);
        }
    }

    #[rstest]
    #[case(b"".as_slice())]
    #[case(b"\n{}".as_slice())]
    #[case(b"\r\n{}".as_slice())]
    fn empty_call_lines_are_framing_errors(#[case] bytes: &[u8]) {
        assert!(matches!(decode(bytes), Err(CodecError::EmptyCall)));
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(matches!(
            decode(&[0x5f, 0xff, 0xfe]),
            Err(CodecError::NotUtf8(_))
        ));
    }

    #[test]
    fn tolerates_crlf_and_trailing_newline() {
        let frame = decode(b"__CALL_THRESH_SIG_SIGN\r\n{\"msg\":\"m\"}\r\n").expect("decode");
        assert_eq!(frame.call(), CallId::SignRequest);
        assert_eq!(frame.payload(), Some("{\"msg\":\"m\"}"));
    }

    #[test]
    fn unknown_tokens_decode_but_resolve_to_unknown() {
        let frame = decode(b"__CALL_SOMETHING_ELSE\n{}").expect("decode");
        assert_eq!(frame.token(), "__CALL_SOMETHING_ELSE");
        assert_eq!(frame.call(), CallId::Unknown);
    }

    #[test]
    fn frame_buffer_reports_end_of_stream() {
        let mut buffer = FrameBuffer::new(64);
        let mut reader = Cursor::new(Vec::<u8>::new());
        assert!(buffer.read_frame(&mut reader).expect("read").is_none());
    }

    #[test]
    fn frame_buffer_returns_exactly_one_read() {
        let mut buffer = FrameBuffer::new(64);
        let mut reader = Cursor::new(b"__CALL_THRESH_SIG_DEAL\n{}".to_vec());
        let bytes = buffer.read_frame(&mut reader).expect("read").expect("frame");
        assert_eq!(bytes, b"__CALL_THRESH_SIG_DEAL\n{}");
    }

    #[test]
    fn frame_buffer_rejects_oversized_frames() {
        let mut buffer = FrameBuffer::new(8);
        let mut reader = Cursor::new(vec![b'x'; 32]);
        let error = buffer.read_frame(&mut reader).expect_err("oversized frame");
        assert!(matches!(error, CodecError::FrameTooLarge { limit: 8 }));
    }

    #[test]
    fn frame_buffer_accepts_frames_at_the_limit() {
        let mut buffer = FrameBuffer::new(8);
        let mut reader = Cursor::new(vec![b'x'; 8]);
        let bytes = buffer.read_frame(&mut reader).expect("read").expect("frame");
        assert_eq!(bytes.len(), 8);
    }

    #[test]
    fn timeouts_are_distinguished_from_faults() {
        let timeout = CodecError::Io(io::Error::from(io::ErrorKind::WouldBlock));
        let reset = CodecError::Io(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(timeout.is_timeout());
        assert!(!reset.is_timeout());
        assert!(!CodecError::EmptyCall.is_timeout());
    }
}
