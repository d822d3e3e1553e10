//! Which end of the connection a session plays.

use std::fmt;

use crate::connection::http::HeadKind;
use crate::protocol::HeaderFlags;

/// Client or server side of a session.
///
/// The role fixes everything that is asymmetric in RFC 6455: who masks,
/// which HTTP head is read, and which headers that head must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Opens the handshake and masks every frame it sends.
    Client,
    /// Answers the handshake and sends unmasked frames.
    Server,
}

impl Role {
    /// Outgoing frames must be masked.
    #[inline]
    #[must_use]
    pub const fn must_mask(&self) -> bool {
        matches!(self, Role::Client)
    }

    /// Incoming frames are expected to be masked.
    #[inline]
    #[must_use]
    pub const fn expects_masked(&self) -> bool {
        matches!(self, Role::Server)
    }

    /// The HTTP head this side reads from its peer.
    #[inline]
    #[must_use]
    pub const fn head_kind(&self) -> HeadKind {
        match self {
            Role::Client => HeadKind::Response,
            Role::Server => HeadKind::Request,
        }
    }

    /// Header flags the peer's handshake head must satisfy.
    #[inline]
    #[must_use]
    pub const fn required_headers(&self) -> HeaderFlags {
        match self {
            Role::Client => HeaderFlags::RESPONSE,
            Role::Server => HeaderFlags::REQUEST,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Client => "client",
            Role::Server => "server",
        })
    }
}
