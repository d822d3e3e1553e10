//! WebSocket frame model and serialization (RFC 6455 Section 5.2).
//!
//! Decoding lives in [`FrameParser`](crate::protocol::FrameParser); this
//! module owns the `Frame` type and the pure encoding functions.

use crate::error::{Error, Result};
use crate::protocol::OpCode;
use crate::protocol::mask::apply_mask;

/// Maximum payload size for control frames (RFC 6455).
pub const MAX_CONTROL_FRAME_PAYLOAD: usize = 125;

/// Masking key used by [`build`] when the caller does not supply one.
///
/// Sessions never rely on it: they draw a fresh key for every frame.
pub const DEFAULT_MASK_KEY: [u8; 4] = 13u32.to_le_bytes();

/// Header bits needed to encode a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFlags {
    /// Frame opcode.
    pub opcode: OpCode,
    /// Final fragment flag.
    pub fin: bool,
    /// Reserved bits as they sit in the first header byte (mask `0x70`).
    pub rsv: u8,
    /// Whether the payload is masked.
    pub mask: bool,
}

impl FrameFlags {
    /// Flags for a final, unmasked frame with the given opcode.
    #[must_use]
    pub const fn new(opcode: OpCode) -> Self {
        Self {
            opcode,
            fin: true,
            rsv: 0,
            mask: false,
        }
    }

    /// Set the FIN bit.
    #[must_use]
    pub const fn with_fin(mut self, fin: bool) -> Self {
        self.fin = fin;
        self
    }

    /// Set the MASK bit.
    #[must_use]
    pub const fn with_mask(mut self, mask: bool) -> Self {
        self.mask = mask;
        self
    }
}

/// Number of bytes a frame occupies on the wire.
///
/// 2 header bytes, 4 more if masked, 0/2/8 extended length bytes, then the
/// payload itself.
#[inline]
#[must_use]
pub const fn encoded_size(masked: bool, payload_len: u64) -> u64 {
    let extended_len_size = if payload_len < 126 {
        0
    } else if payload_len <= 0xFFFF {
        2
    } else {
        8
    };
    let mask_size = if masked { 4 } else { 0 };
    2 + mask_size + extended_len_size + payload_len
}

/// Serialize a frame into `buf` and return the number of bytes written.
///
/// Masked frames use [`DEFAULT_MASK_KEY`]; see [`build_with_mask`] to choose
/// the key.
///
/// # Errors
///
/// Returns `Error::InvalidFrame` if `buf` is shorter than [`encoded_size`].
pub fn build(buf: &mut [u8], flags: FrameFlags, payload: &[u8]) -> Result<usize> {
    build_with_mask(buf, flags, payload, DEFAULT_MASK_KEY)
}

/// Serialize a frame into `buf`, masking with `key` when `flags.mask` is set.
///
/// # Errors
///
/// Returns `Error::InvalidFrame` if `buf` is shorter than [`encoded_size`].
pub fn build_with_mask(
    buf: &mut [u8],
    flags: FrameFlags,
    payload: &[u8],
    key: [u8; 4],
) -> Result<usize> {
    let payload_len = payload.len();
    let total_size = encoded_size(flags.mask, payload_len as u64);

    if (buf.len() as u64) < total_size {
        return Err(Error::InvalidFrame(format!(
            "Buffer too small: need {} bytes, have {}",
            total_size,
            buf.len()
        )));
    }

    let mut byte0 = flags.opcode.as_u8() | (flags.rsv & 0x70);
    if flags.fin {
        byte0 |= 0x80;
    }
    buf[0] = byte0;

    let mut offset = 2;
    let len_field = if payload_len < 126 {
        payload_len as u8
    } else if payload_len <= 0xFFFF {
        buf[2..4].copy_from_slice(&(payload_len as u16).to_be_bytes());
        offset += 2;
        126
    } else {
        buf[2..10].copy_from_slice(&(payload_len as u64).to_be_bytes());
        offset += 8;
        127
    };
    buf[1] = if flags.mask { 0x80 | len_field } else { len_field };

    if flags.mask {
        buf[offset..offset + 4].copy_from_slice(&key);
        offset += 4;
    }

    let body = &mut buf[offset..offset + payload_len];
    body.copy_from_slice(payload);
    if flags.mask {
        apply_mask(body, key);
    }

    Ok(offset + payload_len)
}

/// A WebSocket frame as defined in RFC 6455.
///
/// ## Frame Structure
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-------+-+-------------+-------------------------------+
/// |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
/// |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
/// |N|V|V|V|       |S|             |   (if payload len==126/127)   |
/// | |1|2|3|       |K|             |                               |
/// +-+-+-+-+-------+-+-------------+-------------------------------+
/// |                         Masking key (if present)              |
/// +---------------------------------------------------------------+
/// |                     Payload data                              |
/// +---------------------------------------------------------------+
/// ```
///
/// A decoded frame owns its (already unmasked) payload; an empty payload
/// carries no allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Final fragment flag.
    pub fin: bool,
    /// Reserved bit 1.
    pub rsv1: bool,
    /// Reserved bit 2.
    pub rsv2: bool,
    /// Reserved bit 3.
    pub rsv3: bool,
    /// Frame opcode.
    pub opcode: OpCode,
    /// Whether the frame was masked on the wire.
    pub mask: bool,
    payload: Vec<u8>,
}

impl Frame {
    /// Create a new unmasked frame with the given parameters.
    #[must_use]
    pub fn new(fin: bool, opcode: OpCode, payload: Vec<u8>) -> Self {
        Self {
            fin,
            rsv1: false,
            rsv2: false,
            rsv3: false,
            opcode,
            mask: false,
            payload,
        }
    }

    /// Create a text frame.
    #[must_use]
    pub fn text(data: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Text, data.into())
    }

    /// Create a binary frame.
    #[must_use]
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Binary, data.into())
    }

    /// Create a close frame with optional status code and reason.
    #[must_use]
    pub fn close(code: Option<u16>, reason: &str) -> Self {
        Self::new(true, OpCode::Close, close_payload(code, reason))
    }

    /// Create a ping frame.
    #[must_use]
    pub fn ping(data: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Ping, data.into())
    }

    /// Create a pong frame.
    #[must_use]
    pub fn pong(data: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Pong, data.into())
    }

    /// Get the payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take ownership of the payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Validate the frame according to RFC 6455.
    ///
    /// # Errors
    ///
    /// - `Error::ReservedBitsSet` if RSV bits are set without extension
    /// - `Error::ReservedOpcode` if the opcode is reserved
    /// - `Error::FragmentedControlFrame` if control frame has FIN=0
    /// - `Error::ControlFrameTooLarge` if control frame payload > 125 bytes
    pub fn validate(&self) -> Result<()> {
        if self.rsv1 || self.rsv2 || self.rsv3 {
            return Err(Error::ReservedBitsSet);
        }

        if let OpCode::Reserved(value) = self.opcode {
            return Err(Error::ReservedOpcode(value));
        }

        if self.opcode.is_control() {
            if !self.fin {
                return Err(Error::FragmentedControlFrame);
            }
            if self.payload.len() > MAX_CONTROL_FRAME_PAYLOAD {
                return Err(Error::ControlFrameTooLarge(self.payload.len() as u64));
            }
        }

        Ok(())
    }
}

/// Close payload: big-endian status code followed by the UTF-8 reason.
#[must_use]
pub fn close_payload(code: Option<u16>, reason: &str) -> Vec<u8> {
    match code {
        Some(code) => {
            let mut data = Vec::with_capacity(2 + reason.len());
            data.extend_from_slice(&code.to_be_bytes());
            data.extend_from_slice(reason.as_bytes());
            data
        }
        None => Vec::new(),
    }
}

/// Convert a wire size to an addressable buffer length.
pub(crate) fn wire_len(size: u64) -> Result<usize> {
    usize::try_from(size).map_err(|_| Error::FrameTooLarge {
        size,
        max: usize::MAX,
    })
}
