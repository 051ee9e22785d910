//! Connection sessions: receive, decode, dispatch, reply, repeat.

use std::os::unix::net::UnixStream;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use acp_protocol::{CodecError, Frame, FrameBuffer, decode};

use super::{ConnectionHandler, LISTENER_TARGET, ShutdownToken};
use crate::dispatch::Dispatcher;
use crate::state::ServerState;

const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Serves request/response sessions over accepted connections.
pub(crate) struct SessionHandler {
    dispatcher: Dispatcher,
    state: Arc<ServerState>,
    max_frame_bytes: usize,
    poll_interval: Duration,
}

impl SessionHandler {
    pub(crate) fn new(
        dispatcher: Dispatcher,
        state: Arc<ServerState>,
        max_frame_bytes: usize,
        poll_interval: Duration,
    ) -> Self {
        Self {
            dispatcher,
            state,
            max_frame_bytes,
            poll_interval,
        }
    }

    fn serve(&self, mut stream: UnixStream, shutdown: &ShutdownToken) {
        // The read timeout bounds how long an idle session ignores shutdown.
        if let Err(error) = stream
            .set_read_timeout(Some(self.poll_interval))
            .and_then(|()| stream.set_write_timeout(Some(WRITE_TIMEOUT)))
        {
            warn!(target: LISTENER_TARGET, %error, "failed to configure connection");
            self.state.record_error();
            return;
        }

        let mut buffer = FrameBuffer::new(self.max_frame_bytes);
        while !shutdown.is_triggered() {
            let bytes = match buffer.read_frame(&mut stream) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    debug!(target: LISTENER_TARGET, "peer closed connection");
                    return;
                }
                Err(error) if error.is_timeout() => continue,
                Err(error @ CodecError::FrameTooLarge { .. }) => {
                    warn!(target: LISTENER_TARGET, %error, "closing connection");
                    self.state.record_error();
                    return;
                }
                Err(error) => {
                    warn!(target: LISTENER_TARGET, %error, "connection read failed");
                    self.state.record_error();
                    return;
                }
            };

            let reply = panic::catch_unwind(AssertUnwindSafe(|| self.process(bytes)));
            let frame = match reply {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(_) => {
                    error!(target: LISTENER_TARGET, "request handling panicked");
                    self.state.record_error();
                    continue;
                }
            };

            if let Err(error) = frame.write_to(&mut stream) {
                warn!(target: LISTENER_TARGET, %error, "failed to write response");
                self.state.record_error();
                return;
            }
            self.state.record_response();
        }
        debug!(target: LISTENER_TARGET, "closing session for shutdown");
    }

    /// Decodes and dispatches one frame. Every failure is logged and counted
    /// here; `None` means nothing is sent back.
    fn process(&self, bytes: &[u8]) -> Option<Frame> {
        let frame = match decode(bytes) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(target: LISTENER_TARGET, %error, "framing error");
                self.state.record_error();
                return None;
            }
        };

        let call = frame.call();
        match self.dispatcher.dispatch(call, frame.payload()) {
            Ok(Some(response)) => Some(response),
            Ok(None) => {
                warn!(
                    target: LISTENER_TARGET,
                    token = frame.token(),
                    "no appropriate response"
                );
                self.state.record_error();
                None
            }
            Err(error) => {
                warn!(target: LISTENER_TARGET, %call, %error, "request failed");
                self.state.record_error();
                None
            }
        }
    }
}

impl ConnectionHandler for SessionHandler {
    fn handle(&self, stream: UnixStream, shutdown: &ShutdownToken) {
        self.state.record_session();
        self.serve(stream, shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read, Write};
    use std::thread;
    use std::time::Instant;

    use rstest::{fixture, rstest};

    use acp_protocol::{CallId, GroupKey, KeyShare, SignatureShare};

    use crate::provider::{BlsProvider, CryptoProvider, DealtKeys, ProviderError};

    const UNDER_THRESHOLD_VERIFY: &str =
        r#"{"group-key":{"k":2,"l":3,"key-size":512,"key":null},"signatures":[],"msg":"m"}"#;

    struct PanickingProvider;

    impl CryptoProvider for PanickingProvider {
        fn deal(&self, _: u32, _: usize, _: usize) -> Result<DealtKeys, ProviderError> {
            panic!("deal exploded");
        }

        fn sign(&self, _: &KeyShare, _: &[u8]) -> Result<SignatureShare, ProviderError> {
            panic!("sign exploded");
        }

        fn verify(&self, _: &GroupKey, _: &[SignatureShare], _: &[u8]) -> Result<bool, ProviderError> {
            panic!("verify exploded");
        }

        fn signature_len_bound(&self) -> usize {
            0
        }
    }

    struct SessionHarness {
        client: UnixStream,
        state: Arc<ServerState>,
        shutdown: ShutdownToken,
        server: Option<thread::JoinHandle<()>>,
    }

    impl SessionHarness {
        fn start(provider: Arc<dyn CryptoProvider>, max_frame_bytes: usize) -> Self {
            let (client, server_stream) = UnixStream::pair().expect("socket pair");
            let state = Arc::new(ServerState::new());
            let handler = SessionHandler::new(
                Dispatcher::new(provider, max_frame_bytes),
                Arc::clone(&state),
                max_frame_bytes,
                Duration::from_millis(20),
            );
            let shutdown = ShutdownToken::new();
            let token = shutdown.clone();
            let server = thread::spawn(move || handler.handle(server_stream, &token));
            client
                .set_read_timeout(Some(Duration::from_secs(5)))
                .expect("client timeout");
            Self {
                client,
                state,
                shutdown,
                server: Some(server),
            }
        }

        fn send(&mut self, bytes: &[u8]) {
            self.client.write_all(bytes).expect("write request");
        }

        /// Gives the session time to consume the previous frame so two
        /// writes are not coalesced into one read.
        fn send_after_pause(&mut self, bytes: &[u8]) {
            thread::sleep(Duration::from_millis(100));
            self.send(bytes);
        }

        fn receive(&mut self) -> Vec<u8> {
            let mut buffer = vec![0_u8; 64 * 1024];
            let read = self.client.read(&mut buffer).expect("read response");
            buffer.truncate(read);
            buffer
        }

        fn assert_closed_by_server(&mut self) {
            let mut buffer = [0_u8; 8];
            match self.client.read(&mut buffer) {
                Ok(0) => {}
                Err(error) if error.kind() == io::ErrorKind::ConnectionReset => {}
                other => panic!("expected the server to close the connection, got {other:?}"),
            }
        }

        fn wait_for_errors(&self, expected: u64) {
            let deadline = Instant::now() + Duration::from_secs(2);
            while Instant::now() < deadline && self.state.error_count() < expected {
                thread::sleep(Duration::from_millis(10));
            }
        }

        fn finish(mut self) -> Arc<ServerState> {
            let _ = self.client.shutdown(std::net::Shutdown::Both);
            if let Some(server) = self.server.take() {
                server.join().expect("session thread");
            }
            Arc::clone(&self.state)
        }
    }

    impl Drop for SessionHarness {
        fn drop(&mut self) {
            self.shutdown.trigger();
            if let Some(server) = self.server.take() {
                let _ = server.join();
            }
        }
    }

    #[fixture]
    fn bls_session() -> SessionHarness {
        SessionHarness::start(Arc::new(BlsProvider::new()), 16 * 1024)
    }

    #[rstest]
    fn answers_requests_and_keeps_the_connection_open(mut bls_session: SessionHarness) {
        let request = Frame::new(CallId::DealRequest, r#"{"key-size":512,"l":3,"k":2}"#);
        for _ in 0..2 {
            bls_session.send(&request.encode());
            let response = bls_session.receive();
            let frame = decode(&response).expect("decode response");
            assert_eq!(frame.call(), CallId::DealResponse);
        }

        let state = bls_session.finish();
        assert_eq!(state.response_count(), 2);
        assert_eq!(state.error_count(), 0);
        assert_eq!(state.session_count(), 1);
    }

    #[rstest]
    #[case(b"__CALL_SOMETHING_ELSE\n{}".as_slice())]
    #[case(b"\n{}".as_slice())]
    #[case(b"__CALL_THRESH_SIG_DEAL\nnot json".as_slice())]
    #[case(b"__CALL_THRESH_SIG_DEAL".as_slice())]
    #[case(b"__RET_THRESH_SIG_VERI\n{\"valid\":true}".as_slice())]
    fn bad_requests_are_counted_and_skipped(mut bls_session: SessionHarness, #[case] bad: &[u8]) {
        bls_session.send(bad);
        // The reply to the follow-up request proves the bad frame was skipped
        // without a response and without closing the connection.
        bls_session.send_after_pause(&Frame::new(CallId::VerifyRequest, UNDER_THRESHOLD_VERIFY).encode());
        let response = bls_session.receive();
        let frame = decode(&response).expect("decode response");
        assert_eq!(frame.call(), CallId::VerifyResponse);
        assert_eq!(frame.payload(), Some(r#"{"valid":false}"#));

        let state = bls_session.finish();
        assert_eq!(state.error_count(), 1);
        assert_eq!(state.response_count(), 1);
    }

    #[rstest]
    fn panics_in_request_handling_do_not_end_the_session() {
        let mut harness = SessionHarness::start(Arc::new(PanickingProvider), 1024);

        harness.send(&Frame::new(CallId::SignRequest, r#"{"id":0,"share":1,"msg":"m"}"#).encode());
        harness.wait_for_errors(1);
        harness.send_after_pause(&Frame::new(CallId::VerifyRequest, UNDER_THRESHOLD_VERIFY).encode());
        let response = harness.receive();
        assert_eq!(
            decode(&response).expect("decode response").call(),
            CallId::VerifyResponse
        );

        let state = harness.finish();
        assert_eq!(state.error_count(), 1);
        assert_eq!(state.response_count(), 1);
    }

    #[rstest]
    fn oversized_frames_close_the_connection() {
        let mut harness = SessionHarness::start(Arc::new(BlsProvider::new()), 16);
        harness.send(&[b'x'; 64]);
        harness.assert_closed_by_server();

        let state = harness.finish();
        assert_eq!(state.error_count(), 1);
    }

    #[rstest]
    fn shutdown_closes_idle_sessions(mut bls_session: SessionHarness) {
        bls_session.shutdown.trigger();
        bls_session.assert_closed_by_server();
        let state = bls_session.finish();
        assert_eq!(state.error_count(), 0);
    }
}
