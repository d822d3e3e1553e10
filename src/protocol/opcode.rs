//! WebSocket frame opcodes as defined in RFC 6455.

/// WebSocket frame opcode.
///
/// Decoding is total: the low nibble of the first header byte always maps to
/// an `OpCode`, with unassigned values kept as [`OpCode::Reserved`]. Whether a
/// reserved opcode is acceptable is a validation decision, not a parsing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Continuation frame (0x0).
    Continuation,
    /// Text frame (0x1). Payload should be UTF-8.
    Text,
    /// Binary frame (0x2).
    Binary,
    /// Close frame (0x8). May contain status code and reason.
    Close,
    /// Ping frame (0x9). Answered with a pong.
    Ping,
    /// Pong frame (0xA).
    Pong,
    /// One of the reserved values 0x3-0x7 or 0xB-0xF.
    Reserved(u8),
}

impl OpCode {
    /// Decode the opcode from the low 4 bits of `byte`.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Self {
        match byte & 0x0F {
            0x0 => OpCode::Continuation,
            0x1 => OpCode::Text,
            0x2 => OpCode::Binary,
            0x8 => OpCode::Close,
            0x9 => OpCode::Ping,
            0xA => OpCode::Pong,
            other => OpCode::Reserved(other),
        }
    }

    /// Convert OpCode to its 4-bit wire value.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
            OpCode::Reserved(value) => value & 0x0F,
        }
    }

    /// Check if this is a control frame opcode (0x8-0xF).
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        self.as_u8() & 0x08 != 0
    }

    /// Check if this is a data frame opcode.
    ///
    /// Data frames: Continuation (0x0), Text (0x1), Binary (0x2).
    #[inline]
    #[must_use]
    pub const fn is_data(self) -> bool {
        matches!(self, OpCode::Continuation | OpCode::Text | OpCode::Binary)
    }

    /// Check if this opcode is reserved for future use.
    #[inline]
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        matches!(self, OpCode::Reserved(_))
    }

    /// Get human-readable name for this opcode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            OpCode::Continuation => "Continuation",
            OpCode::Text => "Text",
            OpCode::Binary => "Binary",
            OpCode::Close => "Close",
            OpCode::Ping => "Ping",
            OpCode::Pong => "Pong",
            OpCode::Reserved(_) => "Reserved",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpCode::Reserved(value) => write!(f, "Reserved({value:#x})"),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_from_u8_valid() {
        assert_eq!(OpCode::from_u8(0x0), OpCode::Continuation);
        assert_eq!(OpCode::from_u8(0x1), OpCode::Text);
        assert_eq!(OpCode::from_u8(0x2), OpCode::Binary);
        assert_eq!(OpCode::from_u8(0x8), OpCode::Close);
        assert_eq!(OpCode::from_u8(0x9), OpCode::Ping);
        assert_eq!(OpCode::from_u8(0xA), OpCode::Pong);
    }

    #[test]
    fn test_opcode_from_u8_reserved() {
        for reserved in [0x3, 0x4, 0x5, 0x6, 0x7, 0xB, 0xC, 0xD, 0xE, 0xF] {
            let opcode = OpCode::from_u8(reserved);
            assert_eq!(opcode, OpCode::Reserved(reserved));
            assert!(opcode.is_reserved());
            assert_eq!(opcode.as_u8(), reserved);
        }
    }

    #[test]
    fn test_opcode_ignores_high_nibble() {
        assert_eq!(OpCode::from_u8(0x81), OpCode::Text);
        assert_eq!(OpCode::from_u8(0xF9), OpCode::Ping);
    }

    #[test]
    fn test_opcode_as_u8() {
        assert_eq!(OpCode::Text.as_u8(), 0x1);
        assert_eq!(OpCode::Binary.as_u8(), 0x2);
        assert_eq!(OpCode::Close.as_u8(), 0x8);
        assert_eq!(OpCode::Pong.as_u8(), 0xA);
    }

    #[test]
    fn test_opcode_is_control() {
        assert!(!OpCode::Continuation.is_control());
        assert!(!OpCode::Text.is_control());
        assert!(!OpCode::Binary.is_control());
        assert!(OpCode::Close.is_control());
        assert!(OpCode::Ping.is_control());
        assert!(OpCode::Pong.is_control());
        assert!(OpCode::Reserved(0xB).is_control());
        assert!(!OpCode::Reserved(0x3).is_control());
    }

    #[test]
    fn test_opcode_is_data() {
        assert!(OpCode::Continuation.is_data());
        assert!(OpCode::Text.is_data());
        assert!(OpCode::Binary.is_data());
        assert!(!OpCode::Close.is_data());
        assert!(!OpCode::Reserved(0x3).is_data());
    }

    #[test]
    fn test_opcode_display() {
        assert_eq!(OpCode::Text.to_string(), "Text");
        assert_eq!(OpCode::Close.to_string(), "Close");
        assert_eq!(OpCode::Reserved(0xB).to_string(), "Reserved(0xb)");
    }
}
