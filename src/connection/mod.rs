//! WebSocket session management and state machine.
//!
//! This module provides the sans-I/O [`Session`] type that drives one
//! connection from the HTTP upgrade to the closing handshake, plus the
//! [`Transport`] seam it writes through.
//!
//! ## Session Lifecycle
//!
//! 1. **AwaitingHandshake** - Reading the peer's HTTP head
//! 2. **Framed** - Exchanging frames
//! 3. **Closing** - Close frame sent, waiting for peer close
//! 4. **Closed** - Session finished; input is ignored
//!
//! ## Example
//!
//! ```rust,ignore
//! use tinyws::connection::{BufferedTransport, Event, Session};
//! use tinyws::Config;
//!
//! let mut client = Session::client(BufferedTransport::new(), Config::default());
//! client.connect("/chat", "example.com", Some("chat"))?;
//! socket.write_all(&client.transport_mut().take())?;
//!
//! let mut view = &read_buf[..n];
//! while let Some(event) = client.feed(&mut view)? {
//!     println!("{event:?}");
//! }
//! ```

pub mod http;
mod role;
mod session;
mod state;
mod transport;

pub use role::Role;
pub use session::{Event, Session};
pub use state::SessionState;
pub use transport::{BufferedTransport, Transport};
