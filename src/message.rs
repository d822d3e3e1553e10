//! Close status codes and close payloads as defined in RFC 6455.

use crate::protocol::Frame;
use crate::protocol::frame::close_payload;

/// WebSocket close status code per RFC 6455 Section 7.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum CloseCode {
    /// Normal closure (1000). The connection successfully completed.
    #[default]
    Normal,
    /// Going away (1001). Endpoint is going away (e.g., server shutdown, browser navigating away).
    GoingAway,
    /// Protocol error (1002). Endpoint received a malformed frame or protocol violation.
    ProtocolError,
    /// Unsupported data (1003). Endpoint received data type it cannot handle.
    UnsupportedData,
    /// Invalid payload (1007). Endpoint received a message with invalid data (e.g., non-UTF-8 in text).
    InvalidPayload,
    /// Policy violation (1008). Endpoint received a message that violates its policy.
    PolicyViolation,
    /// Message too big (1009). Endpoint received a message too large to process.
    MessageTooBig,
    /// Invalid extension (1010). Client expected server to negotiate an extension.
    InvalidExtension,
    /// Unexpected condition (1011). Server encountered an unexpected condition.
    UnexpectedCondition,
    /// Any other code (3000-4999 for applications, 1012-1014 for registered codes).
    Other(u16),
}

impl CloseCode {
    /// Create a `CloseCode` from its numeric value.
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::GoingAway,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::UnsupportedData,
            1007 => CloseCode::InvalidPayload,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::MessageTooBig,
            1010 => CloseCode::InvalidExtension,
            1011 => CloseCode::UnexpectedCondition,
            other => CloseCode::Other(other),
        }
    }

    /// Get the numeric value of this close code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::GoingAway => 1001,
            CloseCode::ProtocolError => 1002,
            CloseCode::UnsupportedData => 1003,
            CloseCode::InvalidPayload => 1007,
            CloseCode::PolicyViolation => 1008,
            CloseCode::MessageTooBig => 1009,
            CloseCode::InvalidExtension => 1010,
            CloseCode::UnexpectedCondition => 1011,
            CloseCode::Other(code) => *code,
        }
    }

    /// Check if this close code is valid for sending per RFC 6455 Section 7.4.1.
    ///
    /// Invalid/Reserved codes (MUST NOT be sent):
    /// - 1004-1006, 1015: Reserved, cannot be set in Close frame
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        let code = self.as_u16();
        matches!(code, 1000..=1003 | 1007..=1014 | 3000..=4999)
    }

    /// Check if this close code is reserved and MUST NOT be sent in a Close frame.
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        let code = self.as_u16();
        matches!(code, 1004..=1006 | 1015)
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self::from_u16(code)
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Status code and reason carried by a close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    /// The close status code.
    pub code: CloseCode,
    /// Human-readable reason for closing (UTF-8, max 123 bytes).
    pub reason: String,
}

impl CloseFrame {
    /// Create a new close frame with the given code and reason.
    #[must_use]
    pub fn new(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Decode a close payload: 2-byte big-endian code, then the reason.
    ///
    /// Payloads shorter than two bytes carry no status and yield `None`.
    /// The code is kept as sent; invalid UTF-8 in the reason is replaced
    /// with U+FFFD.
    #[must_use]
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            [] | [_] => None,
            [hi, lo, reason @ ..] => Some(Self::new(
                CloseCode::from_u16(u16::from_be_bytes([*hi, *lo])),
                String::from_utf8_lossy(reason).into_owned(),
            )),
        }
    }

    /// Encode as a close payload.
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        close_payload(Some(self.code.as_u16()), &self.reason)
    }
}

impl From<CloseFrame> for Frame {
    fn from(close: CloseFrame) -> Self {
        Frame::close(Some(close.code.as_u16()), &close.reason)
    }
}
