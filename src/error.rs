//! Error types for the WebSocket protocol implementation.
//!
//! Errors from `Session::feed` are fatal: the session closes its transport
//! and refuses further input. Misuse of `send` or `close` is reported without
//! touching the session.

use thiserror::Error;

/// Result type alias for WebSocket operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during WebSocket operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The accumulated handshake header flags do not equal the set the role requires.
    #[error("Handshake header mismatch: flags {flags:#04x}, required {required:#04x}")]
    HandshakeHeaderMismatch {
        /// Flags accumulated from the received headers.
        flags: u8,
        /// Flags the role requires.
        required: u8,
    },

    /// The server's Sec-WebSocket-Accept does not match the client key.
    #[error("Sec-WebSocket-Accept does not match the request key")]
    HandshakeAcceptMismatch,

    /// The frame parser reached an unsupported state.
    #[error("Frame structure error: {0}")]
    FrameStructure(String),

    /// The transport refused outbound bytes.
    #[error("Transport write failure: {0}")]
    TransportWrite(String),

    /// The HTTP head of the handshake could not be parsed.
    #[error("Malformed HTTP handshake: {0}")]
    UpstreamHttp(String),

    /// Invalid frame structure or output buffer.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Frame size exceeds configured maximum.
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge {
        /// Declared payload size.
        size: u64,
        /// Maximum allowed size.
        max: usize,
    },

    /// Handshake head exceeds configured maximum.
    #[error("Handshake too large: {size} bytes (max: {max})")]
    HandshakeTooLarge {
        /// Buffered head size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// A handshake header value would break the HTTP head.
    #[error("Invalid value for header {header}: {reason}")]
    InvalidHeaderValue {
        /// Header name.
        header: String,
        /// Why the value was refused.
        reason: String,
    },

    /// Operation not allowed in the current session state.
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Close code that must not be sent on the wire.
    #[error("Invalid close code: {0}")]
    InvalidCloseCode(u16),

    /// Connection has been closed.
    #[error("Connection closed: {0:?}")]
    ConnectionClosed(Option<u16>),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// Reserved bits set without extension.
    #[error("Reserved bits set without negotiated extension")]
    ReservedBitsSet,

    /// Reserved opcode used.
    #[error("Reserved opcode: {0:#x}")]
    ReservedOpcode(u8),

    /// Control frame fragmented (RFC violation).
    #[error("Control frames cannot be fragmented")]
    FragmentedControlFrame,

    /// Control frame payload too large (>125 bytes).
    #[error("Control frame payload too large: {0} bytes (max: 125)")]
    ControlFrameTooLarge(u64),

    /// Unmasked client frame (security violation).
    #[error("Client frame must be masked")]
    UnmaskedClientFrame,

    /// Masked server frame (security violation).
    #[error("Server frame must not be masked")]
    MaskedServerFrame,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<httparse::Error> for Error {
    fn from(err: httparse::Error) -> Self {
        Error::UpstreamHttp(err.to_string())
    }
}
