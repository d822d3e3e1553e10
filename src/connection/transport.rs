//! Outbound side of a session.
//!
//! The session never performs I/O itself. Handshake heads, pongs, close
//! acknowledgements and application frames are all handed to a [`Transport`]
//! supplied by the embedding code.

use std::io;

/// Sink for the bytes a session produces.
pub trait Transport {
    /// Send `data` to the peer.
    ///
    /// # Errors
    ///
    /// Any error is reported to the session caller as
    /// [`Error::TransportWrite`](crate::Error::TransportWrite).
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Shut down the write side of the connection.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write(data)
    }

    fn close(&mut self) {
        (**self).close();
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write(data)
    }

    fn close(&mut self) {
        (**self).close();
    }
}

/// Transport that queues outbound bytes in memory.
///
/// The async driver drains it into the socket after every session call;
/// tests inspect it directly.
#[derive(Debug, Default, Clone)]
pub struct BufferedTransport {
    outbound: Vec<u8>,
    closed: bool,
}

impl BufferedTransport {
    /// Create an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written and not yet taken.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.outbound
    }

    /// Take every queued byte, leaving the queue empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }

    /// Returns `true` once the session asked to close.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for BufferedTransport {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "transport already closed",
            ));
        }
        self.outbound.extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
