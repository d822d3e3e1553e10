//! Session lifecycle states.

/// WebSocket session state.
///
/// ```text
/// AwaitingHandshake --head ok--> Framed --close()--> Closing --peer close--> Closed
///                                  |                                          ^
///                                  +-------------- peer close / error --------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Reading the HTTP upgrade head.
    #[default]
    AwaitingHandshake,
    /// Handshake done; bytes are frames.
    Framed,
    /// We sent a close frame; the peer's close is still surfaced.
    Closing,
    /// Done. Input is ignored.
    Closed,
}

impl SessionState {
    /// Check if the session is in an active state.
    #[must_use]
    #[inline]
    pub const fn is_active(&self) -> bool {
        !matches!(self, SessionState::Closed)
    }

    /// Check if sending data is allowed in this state.
    ///
    /// Returns `true` only for `Framed`.
    #[must_use]
    #[inline]
    pub const fn can_send(&self) -> bool {
        matches!(self, SessionState::Framed)
    }

    /// Check if incoming frames are still processed.
    #[must_use]
    #[inline]
    pub const fn can_receive(&self) -> bool {
        matches!(self, SessionState::Framed | SessionState::Closing)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::AwaitingHandshake => write!(f, "AwaitingHandshake"),
            SessionState::Framed => write!(f, "Framed"),
            SessionState::Closing => write!(f, "Closing"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}
