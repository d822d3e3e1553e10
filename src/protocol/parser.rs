//! Streaming WebSocket frame parser.
//!
//! [`FrameParser`] consumes bytes in whatever pieces the transport delivers
//! them and hands out one complete [`Frame`] at a time. Every header field is
//! accumulated one byte at a time, so a chunk boundary may fall anywhere: in
//! the middle of an extended length, of the masking key, or of the payload.
//!
//! ```text
//!            +-------+  byte0   +------+  126/127  +--------+
//!   ------>  | Start | -------> | Head | --------> | Length |
//!            +-------+          +------+           +--------+
//!                ^                 |   masked          |
//!                |                 +--------+----------+
//!                |                          v
//!                |  len == 0            +------+
//!                +--------------------- | Mask |
//!                |                      +------+
//!                |   payload complete      |  len > 0
//!                +----------------------+------+
//!                                       | Body |
//!                                       +------+
//! ```

use tracing::trace;

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::protocol::frame::{Frame, wire_len};
use crate::protocol::mask::unmask_into;
use crate::protocol::OpCode;

/// Largest payload length a frame may declare (the 64-bit field's top bit must be clear).
pub const MAX_PAYLOAD_LEN: u64 = i64::MAX as u64;

/// Current position of the parser inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParserPhase {
    /// Waiting for the FIN/RSV/opcode byte.
    #[default]
    Start,
    /// Waiting for the MASK/length byte.
    Head,
    /// Accumulating a 16-bit or 64-bit extended length.
    Length,
    /// Accumulating the 4-byte masking key.
    Mask,
    /// Copying (and unmasking) payload bytes.
    Body,
    /// A structural error occurred; [`FrameParser::reset`] is required.
    Failed,
}

/// Re-entrant frame decoder, one per connection.
#[derive(Debug, Clone)]
pub struct FrameParser {
    phase: ParserPhase,
    /// Bytes still needed to finish the current phase.
    require: u64,
    /// Declared payload length (accumulated big-endian in `Length`).
    length: u64,
    mask: [u8; 4],
    mask_phase: u8,
    /// Payload bytes already written into `payload`.
    offset: usize,
    /// First header byte: FIN, RSV and opcode bits.
    header: u8,
    masked: bool,
    payload: Vec<u8>,
    limits: Limits,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a parser with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(&Limits::default())
    }

    /// Create a parser enforcing `limits.max_frame_size`.
    #[must_use]
    pub fn with_limits(limits: &Limits) -> Self {
        Self {
            phase: ParserPhase::Start,
            require: 0,
            length: 0,
            mask: [0; 4],
            mask_phase: 0,
            offset: 0,
            header: 0,
            masked: false,
            payload: Vec::new(),
            limits: limits.clone(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ParserPhase {
        self.phase
    }

    /// Position in the masking key for the next payload byte (0-3).
    #[must_use]
    pub fn mask_phase(&self) -> u8 {
        self.mask_phase
    }

    /// Returns `true` if no partial frame is buffered.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.phase == ParserPhase::Start
    }

    /// Drop any partial frame and start over.
    pub fn reset(&mut self) {
        self.phase = ParserPhase::Start;
        self.require = 0;
        self.length = 0;
        self.mask = [0; 4];
        self.mask_phase = 0;
        self.offset = 0;
        self.header = 0;
        self.masked = false;
        self.payload = Vec::new();
    }

    /// Consume bytes from `buf` until one frame is complete or `buf` runs out.
    ///
    /// - `Ok(Some(frame))`: a frame is ready. `buf` has been advanced past the
    ///   bytes of that frame only; call again with the remainder to extract
    ///   further frames delivered in the same read.
    /// - `Ok(None)`: all of `buf` was consumed and more data is needed. Partial
    ///   state is kept for the next call.
    ///
    /// # Errors
    ///
    /// - `Error::FrameStructure` if the 64-bit length has its top bit set, or
    ///   the parser is used again after an error without [`reset`](Self::reset)
    /// - `Error::FrameTooLarge` if the declared length exceeds the frame limit
    pub fn execute(&mut self, buf: &mut &[u8]) -> Result<Option<Frame>> {
        while !buf.is_empty() {
            match self.phase {
                ParserPhase::Start => {
                    let byte = take_byte(buf);
                    self.header = byte;
                    self.masked = false;
                    self.length = 0;
                    self.offset = 0;
                    self.mask_phase = 0;
                    self.phase = ParserPhase::Head;
                }
                ParserPhase::Head => {
                    let byte = take_byte(buf);
                    self.masked = byte & 0x80 != 0;
                    match byte & 0x7F {
                        126 => self.enter_length(2),
                        127 => self.enter_length(8),
                        len => {
                            self.length = u64::from(len);
                            if let Some(frame) = self.length_complete()? {
                                return Ok(Some(frame));
                            }
                        }
                    }
                }
                ParserPhase::Length => {
                    let byte = take_byte(buf);
                    self.length = (self.length << 8) | u64::from(byte);
                    self.require -= 1;
                    if self.require == 0 {
                        if let Some(frame) = self.length_complete()? {
                            return Ok(Some(frame));
                        }
                    }
                }
                ParserPhase::Mask => {
                    let byte = take_byte(buf);
                    self.mask[4 - self.require as usize] = byte;
                    self.require -= 1;
                    if self.require == 0 {
                        if let Some(frame) = self.header_complete()? {
                            return Ok(Some(frame));
                        }
                    }
                }
                ParserPhase::Body => {
                    let available = buf.len() as u64;
                    let take = self.require.min(available) as usize;
                    let (chunk, rest) = buf.split_at(take);
                    let dst = &mut self.payload[self.offset..self.offset + take];
                    if self.masked {
                        self.mask_phase = unmask_into(dst, chunk, self.mask, self.mask_phase);
                    } else {
                        dst.copy_from_slice(chunk);
                    }
                    self.offset += take;
                    self.require -= take as u64;
                    *buf = rest;

                    if self.require == 0 {
                        return Ok(Some(self.finish()));
                    }
                }
                ParserPhase::Failed => {
                    return Err(Error::FrameStructure(
                        "parser used after a failed frame; reset required".into(),
                    ));
                }
            }
        }
        Ok(None)
    }

    fn enter_length(&mut self, bytes: u64) {
        self.length = 0;
        self.require = bytes;
        self.phase = ParserPhase::Length;
    }

    /// The payload length is known; check it and move on to the mask or body.
    fn length_complete(&mut self) -> Result<Option<Frame>> {
        if self.length > MAX_PAYLOAD_LEN {
            self.phase = ParserPhase::Failed;
            return Err(Error::FrameStructure(format!(
                "payload length {:#x} has the most significant bit set",
                self.length
            )));
        }
        if let Err(err) = self.limits.check_frame_size(self.length) {
            self.phase = ParserPhase::Failed;
            return Err(err);
        }

        if self.masked {
            self.require = 4;
            self.phase = ParserPhase::Mask;
            Ok(None)
        } else {
            self.header_complete()
        }
    }

    /// Header fully read: allocate the payload or complete an empty frame.
    fn header_complete(&mut self) -> Result<Option<Frame>> {
        if self.length == 0 {
            return Ok(Some(self.finish()));
        }

        let len = match wire_len(self.length) {
            Ok(len) => len,
            Err(err) => {
                self.phase = ParserPhase::Failed;
                return Err(err);
            }
        };
        self.payload = vec![0u8; len];
        self.offset = 0;
        self.mask_phase = 0;
        self.require = self.length;
        self.phase = ParserPhase::Body;
        trace!(len, masked = self.masked, "frame body started");
        Ok(None)
    }

    fn finish(&mut self) -> Frame {
        let header = self.header;
        let mut frame = Frame::new(
            header & 0x80 != 0,
            OpCode::from_u8(header),
            std::mem::take(&mut self.payload),
        );
        frame.rsv1 = header & 0x40 != 0;
        frame.rsv2 = header & 0x20 != 0;
        frame.rsv3 = header & 0x10 != 0;
        frame.mask = self.masked;
        self.phase = ParserPhase::Start;
        self.require = 0;
        trace!(opcode = %frame.opcode, len = frame.payload().len(), "frame decoded");
        frame
    }
}

#[inline]
fn take_byte(buf: &mut &[u8]) -> u8 {
    let byte = buf[0];
    *buf = &buf[1..];
    byte
}
