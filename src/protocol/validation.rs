//! Strict frame validation (RFC 6455 Sections 5.1 to 5.5).
//!
//! The parser accepts anything that is structurally a frame. Sessions
//! configured with `strict_validation` run every decoded frame through a
//! [`FrameValidator`] first:
//! - Masking direction per RFC 6455 Section 5.1
//! - RSV bits and reserved opcodes
//! - Control frame shape
//! - Frame size limits

use crate::config::Limits;
use crate::connection::Role;
use crate::error::{Error, Result};
use crate::protocol::Frame;

/// Frame validator for incoming WebSocket frames.
///
/// Enforces RFC 6455 requirements based on the receiving side's role.
#[derive(Debug, Clone)]
pub struct FrameValidator {
    /// Role of the side receiving the frames.
    role: Role,
    /// Size limits for frames.
    limits: Limits,
}

impl FrameValidator {
    /// Create a new frame validator.
    #[must_use]
    pub fn new(role: Role, limits: Limits) -> Self {
        Self { role, limits }
    }

    /// Validate a decoded incoming frame.
    ///
    /// # Errors
    ///
    /// - `Error::UnmaskedClientFrame` - Server received unmasked frame from client
    /// - `Error::MaskedServerFrame` - Client received masked frame from server
    /// - `Error::ReservedBitsSet` - RSV bits set without negotiated extension
    /// - `Error::ReservedOpcode` - Opcode is not assigned
    /// - `Error::FragmentedControlFrame` / `Error::ControlFrameTooLarge`
    /// - `Error::FrameTooLarge` - Frame exceeds size limit
    pub fn validate(&self, frame: &Frame) -> Result<()> {
        self.validate_masking(frame.mask)?;
        frame.validate()?;
        self.limits.check_frame_size(frame.payload().len() as u64)
    }

    /// Validate masking rules per RFC 6455 Section 5.1.
    ///
    /// - Server MUST reject unmasked client frames
    /// - Client MUST reject masked server frames
    fn validate_masking(&self, masked: bool) -> Result<()> {
        match (self.role.expects_masked(), masked) {
            (true, false) => Err(Error::UnmaskedClientFrame),
            (false, true) => Err(Error::MaskedServerFrame),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::OpCode;

    fn masked(mut frame: Frame) -> Frame {
        frame.mask = true;
        frame
    }

    // --------------------------------------------------------------------------
    // Masking validation tests (RFC 6455 Section 5.1)
    // --------------------------------------------------------------------------

    #[test]
    fn test_server_rejects_unmasked_client_frame() {
        let validator = FrameValidator::new(Role::Server, Limits::default());
        let result = validator.validate(&Frame::binary(vec![0u8; 10]));
        assert!(matches!(result, Err(Error::UnmaskedClientFrame)));
    }

    #[test]
    fn test_server_accepts_masked_client_frame() {
        let validator = FrameValidator::new(Role::Server, Limits::default());
        assert!(validator.validate(&masked(Frame::binary(vec![0u8; 10]))).is_ok());
    }

    #[test]
    fn test_client_rejects_masked_server_frame() {
        let validator = FrameValidator::new(Role::Client, Limits::default());
        let result = validator.validate(&masked(Frame::text("hi")));
        assert!(matches!(result, Err(Error::MaskedServerFrame)));
    }

    #[test]
    fn test_client_accepts_unmasked_server_frame() {
        let validator = FrameValidator::new(Role::Client, Limits::default());
        assert!(validator.validate(&Frame::text("hi")).is_ok());
    }

    // --------------------------------------------------------------------------
    // Header bits and opcodes
    // --------------------------------------------------------------------------

    #[test]
    fn test_rejects_rsv_bits() {
        let validator = FrameValidator::new(Role::Client, Limits::default());
        for bit in 0..3 {
            let mut frame = Frame::text("x");
            match bit {
                0 => frame.rsv1 = true,
                1 => frame.rsv2 = true,
                _ => frame.rsv3 = true,
            }
            assert!(matches!(validator.validate(&frame), Err(Error::ReservedBitsSet)));
        }
    }

    #[test]
    fn test_rejects_reserved_opcode() {
        let validator = FrameValidator::new(Role::Client, Limits::default());
        let frame = Frame::new(true, OpCode::Reserved(0xB), Vec::new());
        assert!(matches!(validator.validate(&frame), Err(Error::ReservedOpcode(0xB))));
    }

    #[test]
    fn test_rejects_bad_control_frames() {
        let validator = FrameValidator::new(Role::Client, Limits::default());

        let mut frame = Frame::ping("x");
        frame.fin = false;
        assert!(matches!(validator.validate(&frame), Err(Error::FragmentedControlFrame)));

        let frame = Frame::pong(vec![0u8; 126]);
        assert!(matches!(validator.validate(&frame), Err(Error::ControlFrameTooLarge(126))));
    }

    // --------------------------------------------------------------------------
    // Frame size validation tests
    // --------------------------------------------------------------------------

    #[test]
    fn test_rejects_frame_exceeding_limit() {
        let validator = FrameValidator::new(Role::Client, Limits::new(1024, 4096));
        let result = validator.validate(&Frame::binary(vec![0u8; 2048]));
        assert!(matches!(
            result,
            Err(Error::FrameTooLarge {
                size: 2048,
                max: 1024
            })
        ));
    }

    #[test]
    fn test_accepts_frame_at_exact_limit() {
        let validator = FrameValidator::new(Role::Client, Limits::new(1024, 4096));
        assert!(validator.validate(&Frame::binary(vec![0u8; 1024])).is_ok());
    }

    #[test]
    fn test_masking_checked_before_rsv() {
        let validator = FrameValidator::new(Role::Server, Limits::default());
        let mut frame = Frame::text("x");
        frame.rsv1 = true;
        assert!(matches!(validator.validate(&frame), Err(Error::UnmaskedClientFrame)));
    }

    #[test]
    fn test_continuation_frames_pass() {
        let validator = FrameValidator::new(Role::Client, Limits::default());
        let frame = Frame::new(false, OpCode::Continuation, b"part".to_vec());
        assert!(validator.validate(&frame).is_ok());
    }
}
