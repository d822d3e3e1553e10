//! # tinyws - sans-I/O WebSocket wire protocol
//!
//! `tinyws` implements the RFC 6455 wire protocol: frame encoding, a
//! streaming frame parser that survives any fragmentation of the byte
//! stream, the HTTP upgrade handshake, and a per-connection session state
//! machine that answers pings and close frames on its own.
//!
//! ## Features
//!
//! - **Sans-I/O core**: bytes in, events and bytes out through a [`Transport`]
//! - **Re-entrant parsing**: a read may end anywhere inside a frame
//! - **Permissive by default** with opt-in strict validation
//! - **Async driver** for tokio streams behind the `async-tokio` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use tinyws::connection::{BufferedTransport, Event, Session};
//! use tinyws::Config;
//!
//! let mut client = Session::client(BufferedTransport::new(), Config::default());
//! client.connect("/chat", "example.com", Some("chat")).unwrap();
//! let request = client.transport_mut().take();
//! assert!(request.starts_with(b"GET /chat HTTP/1.1\r\n"));
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod protocol;

#[cfg(feature = "async-tokio")]
pub mod codec;

pub use config::{Config, Limits};
pub use connection::{BufferedTransport, Event, Role, Session, SessionState, Transport};
pub use error::{Error, Result};
pub use message::{CloseCode, CloseFrame};
pub use protocol::{
    ClientRequest, Frame, FrameParser, HeaderFlags, OpCode, ServerResponse, WS_GUID,
    generate_accept, generate_key, verify,
};

#[cfg(feature = "async-tokio")]
pub use codec::FramedSession;
