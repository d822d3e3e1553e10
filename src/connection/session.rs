use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::connection::http::{HeadReader, HttpHead};
use crate::connection::{Role, SessionState, Transport};
use crate::error::{Error, Result};
use crate::message::{CloseCode, CloseFrame};
use crate::protocol::frame::{MAX_CONTROL_FRAME_PAYLOAD, close_payload, wire_len};
use crate::protocol::{
    ClientRequest, Frame, FrameFlags, FrameParser, FrameValidator, HeaderFlags, MaskGenerator,
    OpCode, ServerResponse, build_with_mask, encoded_size, generate_key, validate_header, verify,
};

/// What a call to [`Session::feed`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The opening handshake completed; the session is now framed.
    Opened,
    /// A data frame (text, binary, continuation, pong or reserved opcode).
    Data(Frame),
    /// The peer sent a close frame.
    Closed {
        /// Status code, if the close payload carried one.
        code: Option<CloseCode>,
        /// Reason text following the status code.
        reason: String,
    },
}

/// Per-connection protocol state machine.
///
/// A `Session` is sans-I/O: the embedding code feeds it whatever bytes the
/// socket delivered and it answers through the [`Transport`] it owns. It
/// walks the HTTP upgrade, then decodes frames, replying to pings and close
/// frames on its own and surfacing everything else as an [`Event`].
///
/// ## Example
///
/// ```
/// use tinyws::connection::{BufferedTransport, Event, Session};
/// use tinyws::Config;
///
/// let mut server = Session::server(BufferedTransport::new(), Config::default());
/// let request = b"GET /chat HTTP/1.1\r\n\
///     Host: example.com\r\n\
///     Upgrade: websocket\r\n\
///     Connection: Upgrade\r\n\
///     Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
///     Sec-WebSocket-Version: 13\r\n\r\n";
///
/// let mut view = &request[..];
/// assert_eq!(server.feed(&mut view).unwrap(), Some(Event::Opened));
/// assert!(server.transport().pending().starts_with(b"HTTP/1.1 101"));
/// ```
#[derive(Debug)]
pub struct Session<T> {
    role: Role,
    state: SessionState,
    config: Config,
    transport: T,
    head: HeadReader,
    parser: FrameParser,
    validator: Option<FrameValidator>,
    masks: MaskGenerator,
    flags: HeaderFlags,
    /// Client: the key we sent. Server: the key we received.
    key: Option<String>,
    accept: Option<String>,
    protocol: Option<String>,
    path: Option<String>,
}

impl<T: Transport> Session<T> {
    /// Create a session playing `role`.
    pub fn new(role: Role, transport: T, config: Config) -> Self {
        let validator = config
            .strict_validation
            .then(|| FrameValidator::new(role, config.limits.clone()));

        Self {
            role,
            state: SessionState::AwaitingHandshake,
            head: HeadReader::new(role.head_kind(), &config.limits),
            parser: FrameParser::with_limits(&config.limits),
            validator,
            masks: MaskGenerator::new(),
            flags: HeaderFlags::EMPTY,
            key: None,
            accept: None,
            protocol: None,
            path: None,
            config,
            transport,
        }
    }

    /// Create a server-side session.
    pub fn server(transport: T, config: Config) -> Self {
        Self::new(Role::Server, transport, config)
    }

    /// Create a client-side session. Call [`connect`](Self::connect) before feeding it.
    pub fn client(transport: T, config: Config) -> Self {
        Self::new(Role::Client, transport, config)
    }

    /// Get the session role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` while frames can be sent.
    pub fn is_open(&self) -> bool {
        self.state.can_send()
    }

    /// Header flags accumulated from the peer's handshake head so far.
    pub fn header_flags(&self) -> HeaderFlags {
        self.flags
    }

    /// Sub-protocol named in the handshake, if any.
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// Request target received by a server session.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the session, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Open the handshake as a client: generate a key and write the request.
    ///
    /// `Origin` is set to `host`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` unless this is a client that has not connected yet
    /// - `Error::InvalidHeaderValue` if an argument contains CR/LF
    /// - `Error::TransportWrite` if the transport refuses the request
    pub fn connect(&mut self, url: &str, host: &str, protocol: Option<&str>) -> Result<()> {
        let mut request = ClientRequest::new(url, host, generate_key()?);
        if let Some(protocol) = protocol {
            request = request.with_protocol(protocol);
        }
        self.connect_with(request)
    }

    /// Open the handshake with a fully specified request.
    ///
    /// # Errors
    ///
    /// See [`connect`](Self::connect).
    pub fn connect_with(&mut self, request: ClientRequest) -> Result<()> {
        if self.role != Role::Client
            || self.state != SessionState::AwaitingHandshake
            || self.key.is_some()
        {
            return Err(Error::InvalidState(format!(
                "connect on a {} session in state {}",
                self.role, self.state
            )));
        }

        let mut head = Vec::with_capacity(256);
        request.write(&mut head)?;
        self.transport
            .write(&head)
            .map_err(|e| Error::TransportWrite(e.to_string()))?;

        debug!(url = %request.url, host = %request.host, "handshake request sent");
        self.key = Some(request.key);
        Ok(())
    }

    /// Feed bytes received from the peer.
    ///
    /// Returns at most one event per call; `buf` is advanced past the bytes
    /// used to produce it. Call again while events come back. `Ok(None)`
    /// means all of `buf` was consumed.
    ///
    /// Pings are answered and close frames acknowledged inside this call.
    /// Once the session is `Closed`, input is discarded.
    ///
    /// # Errors
    ///
    /// Every error is fatal: the session moves to `Closed` and closes the
    /// transport before returning it.
    pub fn feed(&mut self, buf: &mut &[u8]) -> Result<Option<Event>> {
        let result = match self.state {
            SessionState::AwaitingHandshake => self.feed_handshake(buf),
            SessionState::Framed | SessionState::Closing => self.feed_frames(buf),
            SessionState::Closed => {
                trace!(len = buf.len(), "discarding input after close");
                *buf = &[];
                Ok(None)
            }
        };
        result.map_err(|err| self.fail(err))
    }

    /// Send a final frame with `opcode` and `payload`.
    ///
    /// Client frames are masked with a fresh key.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` before the handshake completes
    /// - `Error::ConnectionClosed` once closing
    /// - `Error::ControlFrameTooLarge` for control payloads over 125 bytes
    /// - `Error::TransportWrite` if the transport refuses the frame (fatal)
    pub fn send(&mut self, opcode: OpCode, payload: &[u8]) -> Result<()> {
        match self.state {
            SessionState::Framed => {}
            SessionState::AwaitingHandshake => {
                return Err(Error::InvalidState("handshake not complete".into()));
            }
            SessionState::Closing | SessionState::Closed => {
                return Err(Error::ConnectionClosed(None));
            }
        }
        if opcode.is_control() && payload.len() > MAX_CONTROL_FRAME_PAYLOAD {
            return Err(Error::ControlFrameTooLarge(payload.len() as u64));
        }

        self.write_frame(opcode, payload)
            .map_err(|err| self.fail(err))
    }

    /// Send a text frame.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn send_text(&mut self, text: &str) -> Result<()> {
        self.send(OpCode::Text, text.as_bytes())
    }

    /// Send a binary frame.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn send_binary(&mut self, data: &[u8]) -> Result<()> {
        self.send(OpCode::Binary, data)
    }

    /// Send a ping frame.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn ping(&mut self, data: &[u8]) -> Result<()> {
        self.send(OpCode::Ping, data)
    }

    /// Start the closing handshake.
    ///
    /// Writes a close frame with `code` and `reason`, then closes the
    /// transport. The peer's close frame is still surfaced by `feed`. Before
    /// the handshake completes the transport is simply closed; once closing
    /// or closed this does nothing.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidCloseCode` for codes that must not be sent
    /// - `Error::ControlFrameTooLarge` if the reason exceeds 123 bytes
    /// - `Error::TransportWrite` if the transport refuses the frame (fatal)
    pub fn close(&mut self, code: CloseCode, reason: &str) -> Result<()> {
        match self.state {
            SessionState::Framed => {}
            SessionState::AwaitingHandshake => {
                self.state = SessionState::Closed;
                self.transport.close();
                return Ok(());
            }
            SessionState::Closing | SessionState::Closed => return Ok(()),
        }

        if code.is_reserved() {
            return Err(Error::InvalidCloseCode(code.as_u16()));
        }
        let payload = CloseFrame::new(code, reason).to_payload();
        if payload.len() > MAX_CONTROL_FRAME_PAYLOAD {
            return Err(Error::ControlFrameTooLarge(payload.len() as u64));
        }

        self.write_frame(OpCode::Close, &payload)
            .map_err(|err| self.fail(err))?;
        self.transport.close();
        self.state = SessionState::Closing;
        debug!(role = %self.role, %code, reason, "close sent");
        Ok(())
    }

    fn feed_handshake(&mut self, buf: &mut &[u8]) -> Result<Option<Event>> {
        if self.role == Role::Client && self.key.is_none() {
            return Err(Error::InvalidState("response received before connect".into()));
        }
        if buf.is_empty() {
            return Ok(None);
        }

        let chunk: &[u8] = *buf;
        let Some((head, consumed)) = self.head.feed(chunk)? else {
            *buf = &chunk[chunk.len()..];
            return Ok(None);
        };
        *buf = &chunk[consumed..];

        self.complete_handshake(head)?;
        Ok(Some(Event::Opened))
    }

    fn complete_handshake(&mut self, head: HttpHead) -> Result<()> {
        if self.role == Role::Client && head.status != Some(101) {
            return Err(Error::UpstreamHttp(format!(
                "expected status 101, got {}",
                head.status.map_or_else(|| "none".to_string(), |s| s.to_string())
            )));
        }

        for (name, value) in &head.headers {
            let bit = validate_header(&mut self.flags, name.as_bytes(), value);
            if bit == HeaderFlags::KEY && self.role == Role::Server {
                self.key = Some(header_text(name, value)?);
            } else if bit == HeaderFlags::ACCEPT && self.role == Role::Client {
                self.accept = Some(header_text(name, value)?);
            } else if bit == HeaderFlags::PROTOCOL {
                self.protocol = Some(String::from_utf8_lossy(value).into_owned());
            }
        }

        let required = self.role.required_headers();
        if self.flags != required {
            return Err(Error::HandshakeHeaderMismatch {
                flags: self.flags.bits(),
                required: required.bits(),
            });
        }

        match self.role {
            Role::Server => {
                let key = self.key.as_deref().unwrap_or_default();
                let response =
                    ServerResponse::for_key(&*self.config.server_name, key, self.protocol.clone());
                let mut out = Vec::with_capacity(192);
                response.write(&mut out)?;
                self.transport
                    .write(&out)
                    .map_err(|e| Error::TransportWrite(e.to_string()))?;
                self.path = head.path;
            }
            Role::Client => {
                let key = self.key.as_deref().unwrap_or_default();
                let accept = self.accept.as_deref().unwrap_or_default();
                if !verify(key, accept) {
                    return Err(Error::HandshakeAcceptMismatch);
                }
            }
        }

        self.state = SessionState::Framed;
        debug!(
            role = %self.role,
            path = self.path.as_deref(),
            protocol = self.protocol.as_deref(),
            "handshake complete"
        );
        Ok(())
    }

    fn feed_frames(&mut self, buf: &mut &[u8]) -> Result<Option<Event>> {
        loop {
            let Some(frame) = self.parser.execute(buf)? else {
                return Ok(None);
            };
            if let Some(validator) = &self.validator {
                validator.validate(&frame)?;
            }

            match frame.opcode {
                OpCode::Ping => {
                    debug!(len = frame.payload().len(), "ping received");
                    // The write side is already shut once we sent our close.
                    if self.state == SessionState::Framed {
                        let payload = if self.config.echo_ping_payload {
                            frame.into_payload()
                        } else {
                            Vec::new()
                        };
                        self.write_frame(OpCode::Pong, &payload)?;
                    }
                }
                OpCode::Close => return self.on_close(&frame).map(Some),
                _ => {
                    trace!(opcode = %frame.opcode, len = frame.payload().len(), "data frame");
                    return Ok(Some(Event::Data(frame)));
                }
            }
        }
    }

    fn on_close(&mut self, frame: &Frame) -> Result<Event> {
        let close = CloseFrame::from_payload(frame.payload());

        if self.state == SessionState::Framed && self.config.auto_close_reply {
            // Echo a sendable code; answer anything else with 1002.
            let reply_code = close.as_ref().map(|c| {
                if c.code.is_valid() {
                    c.code.as_u16()
                } else {
                    CloseCode::ProtocolError.as_u16()
                }
            });
            let reply = close_payload(reply_code, "");
            self.write_frame(OpCode::Close, &reply)?;
            self.transport.close();
        }
        self.state = SessionState::Closed;
        self.parser.reset();

        let (code, reason) = match close {
            Some(CloseFrame { code, reason }) => (Some(code), reason),
            None => (None, String::new()),
        };
        debug!(role = %self.role, code = code.map(|c| c.as_u16()), %reason, "close received");
        Ok(Event::Closed { code, reason })
    }

    fn write_frame(&mut self, opcode: OpCode, payload: &[u8]) -> Result<()> {
        let masked = self.role.must_mask();
        let flags = FrameFlags::new(opcode).with_mask(masked);
        let key = if masked { self.masks.next_key() } else { [0; 4] };

        let mut out = vec![0u8; wire_len(encoded_size(masked, payload.len() as u64))?];
        build_with_mask(&mut out, flags, payload, key)?;
        self.transport
            .write(&out)
            .map_err(|e| Error::TransportWrite(e.to_string()))
    }

    fn fail(&mut self, err: Error) -> Error {
        if self.state != SessionState::Closed {
            warn!(role = %self.role, state = %self.state, error = %err, "session failed");
            self.state = SessionState::Closed;
            self.parser.reset();
            self.transport.close();
        }
        err
    }
}

fn header_text(name: &str, value: &[u8]) -> Result<String> {
    String::from_utf8(value.to_vec())
        .map_err(|_| Error::UpstreamHttp(format!("{name} is not valid UTF-8")))
}
