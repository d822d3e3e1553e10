use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::config::Config;
use crate::connection::{BufferedTransport, Event, Role, Session, SessionState};
use crate::error::{Error, Result};
use crate::message::CloseCode;
use crate::protocol::OpCode;

/// A [`Session`] driven over an async byte stream.
///
/// Reads go into a `BytesMut` and are fed to the session; whatever the
/// session wrote to its [`BufferedTransport`] is flushed to the stream after
/// every call. When the session closes its transport, the write half of the
/// stream is shut down.
///
/// ```rust,ignore
/// let stream = tokio::net::TcpStream::connect("127.0.0.1:9000").await?;
/// let mut ws = FramedSession::client(stream, Config::default());
/// ws.connect("/", "127.0.0.1", None).await?;
/// ws.next_event().await?; // Opened
/// ws.send_binary(b"hello").await?;
/// ```
pub struct FramedSession<S> {
    io: S,
    session: Session<BufferedTransport>,
    read_buf: BytesMut,
    read_chunk: usize,
    shutdown: bool,
}

impl<S> FramedSession<S> {
    /// Wrap `io` in a session playing `role`.
    #[must_use]
    pub fn new(io: S, role: Role, config: Config) -> Self {
        let read_chunk = config.read_buffer_size.max(1);
        Self {
            io,
            session: Session::new(role, BufferedTransport::new(), config),
            read_buf: BytesMut::with_capacity(read_chunk),
            read_chunk,
            shutdown: false,
        }
    }

    /// Server side; waits for the upgrade request.
    #[must_use]
    pub fn server(io: S, config: Config) -> Self {
        Self::new(io, Role::Server, config)
    }

    /// Client side; call [`connect`](Self::connect) before anything else.
    #[must_use]
    pub fn client(io: S, config: Config) -> Self {
        Self::new(io, Role::Client, config)
    }

    /// The underlying sans-I/O session.
    #[must_use]
    pub fn session(&self) -> &Session<BufferedTransport> {
        &self.session
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Give back the stream. Bytes already read but not yet fed are dropped.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.io
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> FramedSession<S> {
    /// Send the client handshake request.
    pub async fn connect(&mut self, url: &str, host: &str, protocol: Option<&str>) -> Result<()> {
        let result = self.session.connect(url, host, protocol);
        self.finish(result).await
    }

    /// Wait for the next event.
    ///
    /// Returns `Ok(None)` once the session is closed.
    ///
    /// # Errors
    ///
    /// Session errors as returned by [`Session::feed`], I/O errors, and
    /// `Error::ConnectionClosed` if the peer hangs up before closing.
    pub async fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            if !self.read_buf.is_empty() {
                let mut view: &[u8] = &self.read_buf;
                let before = view.len();
                let result = self.session.feed(&mut view);
                let consumed = before - view.len();
                self.read_buf.advance(consumed);

                if let Some(event) = self.finish(result).await? {
                    return Ok(Some(event));
                }
            }

            if self.session.state() == SessionState::Closed {
                return Ok(None);
            }

            self.read_buf.reserve(self.read_chunk);
            let n = self.io.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                debug!(state = %self.session.state(), "peer hung up");
                return Err(Error::ConnectionClosed(None));
            }
        }
    }

    /// Send one complete frame and flush it to the stream.
    ///
    /// # Errors
    ///
    /// Whatever [`Session::send`] rejects, plus I/O errors from the flush.
    pub async fn send(&mut self, opcode: OpCode, payload: &[u8]) -> Result<()> {
        let result = self.session.send(opcode, payload);
        self.finish(result).await
    }

    /// Send a text frame.
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.send(OpCode::Text, text.as_bytes()).await
    }

    /// Send a binary frame.
    pub async fn send_binary(&mut self, data: &[u8]) -> Result<()> {
        self.send(OpCode::Binary, data).await
    }

    /// Send a ping; the pong arrives as an [`Event::Data`] frame.
    pub async fn ping(&mut self, data: &[u8]) -> Result<()> {
        self.send(OpCode::Ping, data).await
    }

    /// Send a close frame and shut down the write half.
    pub async fn close(&mut self, code: CloseCode, reason: &str) -> Result<()> {
        let result = self.session.close(code, reason);
        self.finish(result).await
    }

    /// Flush what the session wrote, then hand back its result.
    ///
    /// The session's own error wins over a flush error.
    async fn finish<R>(&mut self, result: Result<R>) -> Result<R> {
        let flushed = self.flush_outbound().await;
        let value = result?;
        flushed?;
        Ok(value)
    }

    async fn flush_outbound(&mut self) -> Result<()> {
        let pending = self.session.transport_mut().take();
        if !pending.is_empty() {
            self.io.write_all(&pending).await?;
            self.io.flush().await?;
        }
        if self.session.transport().is_closed() && !self.shutdown {
            self.shutdown = true;
            self.io.shutdown().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

    struct MockStream {
        read_data: Cursor<Vec<u8>>,
        write_data: Vec<u8>,
        shut_down: bool,
    }

    impl MockStream {
        fn new(data: Vec<u8>) -> Self {
            Self {
                read_data: Cursor::new(data),
                write_data: Vec::new(),
                shut_down: false,
            }
        }

        fn written(&self) -> &[u8] {
            &self.write_data
        }
    }

    impl AsyncRead for MockStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            let pos = self.read_data.position() as usize;
            let data = self.read_data.get_ref();
            if pos >= data.len() {
                return Poll::Ready(Ok(()));
            }
            let remaining = &data[pos..];
            let to_copy = std::cmp::min(remaining.len(), buf.remaining());
            buf.put_slice(&remaining[..to_copy]);
            self.read_data.set_position((pos + to_copy) as u64);
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockStream {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            self.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            self.shut_down = true;
            Poll::Ready(Ok(()))
        }
    }

    const REQUEST: &[u8] = b"GET /chat HTTP/1.1\r\n\
        Host: example.com\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Sec-WebSocket-Version: 13\r\n\
        \r\n";

    #[test]
    fn test_framed_new() {
        let framed = FramedSession::client(MockStream::new(vec![]), Config::default());
        assert_eq!(framed.session().role(), Role::Client);
        assert_eq!(framed.state(), SessionState::AwaitingHandshake);
    }

    #[tokio::test]
    async fn test_server_handshake_and_ping() {
        let mut data = REQUEST.to_vec();
        data.extend_from_slice(&[0x89, 0x80, 0x01, 0x02, 0x03, 0x04]);
        let mut framed = FramedSession::server(MockStream::new(data), Config::default());

        assert_eq!(framed.next_event().await.unwrap(), Some(Event::Opened));
        assert!(framed.io.written().starts_with(b"HTTP/1.1 101 Switching Protocols\r\n"));

        let result = framed.next_event().await;
        assert!(matches!(result, Err(Error::ConnectionClosed(None))));
        assert!(framed.io.written().ends_with(&[0x8a, 0x00]));
    }

    #[tokio::test]
    async fn test_read_masked_frame() {
        let mut data = REQUEST.to_vec();
        data.extend_from_slice(&[0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58]);
        let mut framed = FramedSession::server(MockStream::new(data), Config::default());

        assert_eq!(framed.next_event().await.unwrap(), Some(Event::Opened));
        match framed.next_event().await.unwrap() {
            Some(Event::Data(frame)) => {
                assert_eq!(frame.opcode, OpCode::Text);
                assert_eq!(frame.payload(), b"Hello");
            }
            other => panic!("expected data, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_handshake_shuts_down() {
        let data = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n".to_vec();
        let mut framed = FramedSession::server(MockStream::new(data), Config::default());

        let result = framed.next_event().await;
        assert!(matches!(result, Err(Error::HandshakeHeaderMismatch { .. })));
        assert!(framed.io.shut_down);
        assert!(framed.io.written().is_empty());
        assert_eq!(framed.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_echo_over_duplex() {
        let (client_io, server_io) = tokio::io::duplex(1024);

        let server = tokio::spawn(async move {
            let mut server = FramedSession::server(server_io, Config::default());
            while let Some(event) = server.next_event().await.unwrap() {
                match event {
                    Event::Opened => {}
                    Event::Data(frame) => server.send_binary(frame.payload()).await.unwrap(),
                    Event::Closed { code, .. } => return code,
                }
            }
            None
        });

        let mut client = FramedSession::client(client_io, Config::default());
        client.connect("/chat", "example.com", Some("chat")).await.unwrap();
        assert_eq!(client.next_event().await.unwrap(), Some(Event::Opened));
        assert_eq!(client.session().protocol(), Some("chat"));

        client.send_binary(b"hello").await.unwrap();
        match client.next_event().await.unwrap() {
            Some(Event::Data(frame)) => {
                assert_eq!(frame.opcode, OpCode::Binary);
                assert!(!frame.mask);
                assert_eq!(frame.payload(), b"hello");
            }
            other => panic!("expected echo, got {other:?}"),
        }

        client.close(CloseCode::Normal, "byebye").await.unwrap();
        assert_eq!(client.state(), SessionState::Closing);
        assert_eq!(
            client.next_event().await.unwrap(),
            Some(Event::Closed {
                code: Some(CloseCode::Normal),
                reason: String::new()
            })
        );
        assert_eq!(client.next_event().await.unwrap(), None);

        assert_eq!(server.await.unwrap(), Some(CloseCode::Normal));
    }

    #[tokio::test]
    async fn test_large_frame_over_small_reads() {
        let (client_io, server_io) = tokio::io::duplex(64);
        let payload: Vec<u8> = (0..70_000u32).map(|i| (i % 253) as u8).collect();
        let expected = payload.clone();

        let server = tokio::spawn(async move {
            let config = Config::default().with_read_buffer_size(100);
            let mut server = FramedSession::server(server_io, config);
            assert_eq!(server.next_event().await.unwrap(), Some(Event::Opened));
            match server.next_event().await.unwrap() {
                Some(Event::Data(frame)) => frame.into_payload(),
                other => panic!("expected data, got {other:?}"),
            }
        });

        let mut client = FramedSession::client(client_io, Config::default());
        client.connect("/", "localhost", None).await.unwrap();
        assert_eq!(client.next_event().await.unwrap(), Some(Event::Opened));
        client.send_binary(&payload).await.unwrap();

        assert_eq!(server.await.unwrap(), expected);
    }
}
