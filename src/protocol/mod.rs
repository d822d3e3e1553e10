//! WebSocket protocol core implementation (RFC 6455).
//!
//! Everything here is sans-I/O: functions take and return byte slices.

pub mod frame;
pub mod handshake;
pub mod header;
pub mod mask;
pub mod opcode;
pub mod parser;
pub mod validation;

pub use frame::{Frame, FrameFlags, build, build_with_mask, encoded_size};
pub use handshake::{
    ClientRequest, ServerResponse, WS_GUID, generate_accept, generate_key, verify,
};
pub use header::{HeaderFlags, validate_header};
pub use mask::{MaskGenerator, apply_mask, apply_mask_from};
pub use opcode::OpCode;
pub use parser::{FrameParser, ParserPhase};
pub use validation::FrameValidator;
