//! Async driver for sessions.
//!
//! This module runs a sans-I/O [`Session`](crate::connection::Session) over
//! any tokio `AsyncRead + AsyncWrite` stream.

#[cfg(feature = "async-tokio")]
mod framed;

#[cfg(feature = "async-tokio")]
pub use framed::FramedSession;
