//! Classification of handshake headers into requirement bits.
//!
//! Each recognised header, when its value has the required form, satisfies
//! one bit of a [`HeaderFlags`] accumulator. A handshake head is acceptable
//! only once the accumulator equals the full set for its direction:
//! [`HeaderFlags::REQUEST`] for what a server receives and
//! [`HeaderFlags::RESPONSE`] for what a client receives.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::protocol::handshake::{ACCEPT_LEN, KEY_LEN};

/// Bitset of satisfied handshake requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HeaderFlags(u8);

impl HeaderFlags {
    /// No requirement satisfied.
    pub const EMPTY: Self = Self(0);
    /// `Sec-WebSocket-Version: 13`.
    pub const VERSION: Self = Self(0x01);
    /// `Upgrade: websocket`.
    pub const UPGRADE: Self = Self(0x02);
    /// `Connection` containing `upgrade`.
    pub const CONNECTION: Self = Self(0x04);
    /// A 24-byte `Sec-WebSocket-Key`.
    pub const KEY: Self = Self(0x08);
    /// A 28-byte `Sec-WebSocket-Accept`.
    pub const ACCEPT: Self = Self(0x10);
    /// Any `Sec-WebSocket-Protocol`. Reported, never required.
    pub const PROTOCOL: Self = Self(0x20);

    /// Everything a client request must carry.
    pub const REQUEST: Self =
        Self(Self::VERSION.0 | Self::UPGRADE.0 | Self::CONNECTION.0 | Self::KEY.0);
    /// Everything a server response must carry.
    pub const RESPONSE: Self = Self(Self::UPGRADE.0 | Self::CONNECTION.0 | Self::ACCEPT.0);

    /// Raw bit value.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for HeaderFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for HeaderFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for HeaderFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Classify one header pair and update `flags`.
///
/// Returns the bit the pair satisfies, or [`HeaderFlags::EMPTY`] when the
/// header is unrecognised or its value has the wrong form. A wrong value
/// also clears that header's bit, so a later bad duplicate wins over an
/// earlier good one. The protocol bit is returned but never stored.
pub fn validate_header(flags: &mut HeaderFlags, name: &[u8], value: &[u8]) -> HeaderFlags {
    let (bit, ok) = if name.eq_ignore_ascii_case(b"Sec-WebSocket-Version") {
        (HeaderFlags::VERSION, value == b"13")
    } else if name.eq_ignore_ascii_case(b"Upgrade") {
        (HeaderFlags::UPGRADE, value.eq_ignore_ascii_case(b"websocket"))
    } else if name.eq_ignore_ascii_case(b"Connection") {
        (HeaderFlags::CONNECTION, contains_ignore_case(value, b"upgrade"))
    } else if name.eq_ignore_ascii_case(b"Sec-WebSocket-Key") {
        (HeaderFlags::KEY, value.len() == KEY_LEN)
    } else if name.eq_ignore_ascii_case(b"Sec-WebSocket-Accept") {
        (HeaderFlags::ACCEPT, value.len() == ACCEPT_LEN)
    } else if name.eq_ignore_ascii_case(b"Sec-WebSocket-Protocol") {
        return HeaderFlags::PROTOCOL;
    } else {
        return HeaderFlags::EMPTY;
    };

    if ok {
        flags.insert(bit);
        bit
    } else {
        flags.remove(bit);
        HeaderFlags::EMPTY
    }
}

fn contains_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}
