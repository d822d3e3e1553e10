//! Configuration and limits for WebSocket sessions.

/// Resource limits for a session.
///
/// These bound the memory a peer can make the session allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum declared payload size of a single frame in bytes.
    ///
    /// Default: 16 MB (16 * 1024 * 1024)
    pub max_frame_size: usize,

    /// Maximum size of the HTTP handshake head in bytes.
    ///
    /// Default: 8 KB (8192)
    pub max_handshake_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frame_size: 16 * 1024 * 1024, // 16 MB
            max_handshake_size: 8192,
        }
    }
}

impl Limits {
    /// Create new limits with custom values.
    #[must_use]
    pub const fn new(max_frame_size: usize, max_handshake_size: usize) -> Self {
        Self {
            max_frame_size,
            max_handshake_size,
        }
    }

    /// Validate that a declared frame payload size is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameTooLarge`](crate::Error::FrameTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_frame_size(&self, size: u64) -> Result<(), crate::Error> {
        if size > self.max_frame_size as u64 {
            Err(crate::Error::FrameTooLarge {
                size,
                max: self.max_frame_size,
            })
        } else {
            Ok(())
        }
    }

    /// Validate that handshake size is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandshakeTooLarge`](crate::Error::HandshakeTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_handshake_size(&self, size: usize) -> Result<(), crate::Error> {
        if size > self.max_handshake_size {
            Err(crate::Error::HandshakeTooLarge {
                size,
                max: self.max_handshake_size,
            })
        } else {
            Ok(())
        }
    }
}

/// WebSocket session configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Resource limits.
    pub limits: Limits,

    /// Value of the `Server` header in the 101 response.
    ///
    /// Default: "tinyws"
    pub server_name: String,

    /// Reject frames that break RFC 6455 rules the parser itself tolerates
    /// (reserved bits, reserved opcodes, masking direction, control frame shape).
    ///
    /// Default: false
    pub strict_validation: bool,

    /// Answer a peer-initiated close with a close frame carrying the same status.
    ///
    /// Default: true
    pub auto_close_reply: bool,

    /// Echo the ping payload in the automatic pong instead of sending it empty.
    ///
    /// Default: false
    pub echo_ping_payload: bool,

    /// Read buffer size used by the async driver (in bytes).
    ///
    /// Default: 4 KB (4096)
    pub read_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            server_name: "tinyws".to_string(),
            strict_validation: false,
            auto_close_reply: true,
            echo_ping_payload: false,
            read_buffer_size: 4096,
        }
    }
}

impl Config {
    /// Create a new configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom limits.
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the `Server` header value.
    #[must_use]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Enable or disable strict frame validation.
    #[must_use]
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    /// Enable or disable the automatic close acknowledgement.
    #[must_use]
    pub fn with_auto_close_reply(mut self, enabled: bool) -> Self {
        self.auto_close_reply = enabled;
        self
    }

    /// Echo ping payloads in automatic pongs.
    #[must_use]
    pub fn with_echo_ping_payload(mut self, enabled: bool) -> Self {
        self.echo_ping_payload = enabled;
        self
    }

    /// Set read buffer size.
    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }
}
