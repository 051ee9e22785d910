//! Minimal framed client used to drive a running server.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;

use acp_config::SocketPath;
use acp_protocol::{
    CallId, DealRequest, DealResponse, Frame, GroupKey, KeyShare, SignRequest, SignatureShare,
    VerifyRequest, VerifyResponse, decode,
};

use super::WAIT_TIMEOUT;

pub const LOREM: &str = "lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
    tempor incididunt ut labore et dolore magna aliqua.";
pub const TAMPERED: &str = "lorem ipsum dolor sit amet, consectetur VIRUS elit, sed do eiusmod \
    tempor incididunt ut ATTACK et dolore magna aliqua.";

const SILENCE_WINDOW: Duration = Duration::from_millis(300);

/// Connected client that sends one frame and reads one reply at a time.
pub struct TestClient {
    stream: UnixStream,
}

impl TestClient {
    /// Connects to `socket`.
    pub fn connect(socket: &SocketPath) -> io::Result<Self> {
        let stream = UnixStream::connect(socket.as_path().as_std_path())?;
        stream.set_read_timeout(Some(WAIT_TIMEOUT))?;
        Ok(Self { stream })
    }

    /// Writes `bytes` exactly as given.
    pub fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }

    /// Sends `body` as the payload of `call` and parses the reply payload.
    pub fn call<T, R>(&mut self, call: CallId, body: &T) -> Result<R, String>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        self.send(call, body)?;
        self.reply(call)
    }

    /// Sends `body` as the payload of `call` without waiting for a reply.
    pub fn send<T: Serialize>(&mut self, call: CallId, body: &T) -> Result<(), String> {
        let payload = serde_json::to_string(body).map_err(|error| error.to_string())?;
        self.send_raw(&Frame::new(call, payload).encode())
            .map_err(|error| error.to_string())
    }

    /// Reads the reply to an earlier `call` and parses its payload.
    pub fn reply<R: DeserializeOwned>(&mut self, call: CallId) -> Result<R, String> {
        let bytes = self.receive()?;
        let frame = decode(&bytes).map_err(|error| error.to_string())?;
        let expected = call.response().ok_or("call has no response kind")?;
        if frame.call() != expected {
            return Err(format!("expected {expected}, got {}", frame.token()));
        }
        let payload = frame.payload().ok_or("response carried no payload")?;
        serde_json::from_str(payload).map_err(|error| error.to_string())
    }

    /// Deals keys and returns the group key with every share.
    pub fn deal(&mut self, key_size: u32, l: usize, k: usize) -> Result<DealResponse, String> {
        self.call(CallId::DealRequest, &DealRequest { key_size, l, k })
    }

    /// Signs `msg` with one key share.
    pub fn sign(&mut self, share: &KeyShare, msg: &str) -> Result<SignatureShare, String> {
        let request = SignRequest {
            share: share.clone(),
            msg: msg.to_owned(),
        };
        self.call(CallId::SignRequest, &request)
    }

    /// Asks the server whether `signatures` combine to a valid signature.
    pub fn verify(
        &mut self,
        group_key: &GroupKey,
        signatures: &[SignatureShare],
        msg: &str,
    ) -> Result<bool, String> {
        let request = VerifyRequest {
            group_key: group_key.clone(),
            signatures: signatures.to_vec(),
            msg: msg.to_owned(),
        };
        let response: VerifyResponse = self.call(CallId::VerifyRequest, &request)?;
        Ok(response.valid)
    }

    /// Returns `true` when nothing arrives within a short window.
    pub fn stays_silent(&mut self) -> Result<bool, String> {
        let mut byte = [0_u8; 1];
        self.stream
            .set_read_timeout(Some(SILENCE_WINDOW))
            .map_err(|error| error.to_string())?;
        let outcome = match self.stream.read(&mut byte) {
            Ok(_) => Ok(false),
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Ok(true)
            }
            Err(error) => Err(error.to_string()),
        };
        self.stream
            .set_read_timeout(Some(WAIT_TIMEOUT))
            .map_err(|error| error.to_string())?;
        outcome
    }

    /// Reads until the bytes hold one complete frame with a JSON payload.
    fn receive(&mut self) -> Result<Vec<u8>, String> {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        let mut received = Vec::new();
        let mut chunk = [0_u8; 8 * 1024];
        loop {
            let read = self
                .stream
                .read(&mut chunk)
                .map_err(|error| format!("no response: {error}"))?;
            if read == 0 {
                return Err("server closed the connection".to_owned());
            }
            received.extend_from_slice(chunk.get(..read).unwrap_or_default());
            if is_complete(&received) {
                return Ok(received);
            }
            if Instant::now() >= deadline {
                return Err("incomplete response".to_owned());
            }
        }
    }
}

fn is_complete(bytes: &[u8]) -> bool {
    decode(bytes)
        .ok()
        .and_then(|frame| frame.payload())
        .is_some_and(|payload| serde_json::from_str::<serde_json::Value>(payload).is_ok())
}
