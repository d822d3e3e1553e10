//! WebSocket handshake crypto and head serialization (RFC 6455 Section 4).
//!
//! The client proves nothing and the server proves only that it understood
//! the upgrade: it hashes the client's random key together with a fixed GUID
//! and sends the result back as `Sec-WebSocket-Accept`.

use std::fmt::Write as _;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

/// The WebSocket GUID used in the Sec-WebSocket-Accept calculation (RFC 6455).
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Length of a Base64 `Sec-WebSocket-Key` (16 random bytes).
pub const KEY_LEN: usize = 24;

/// Length of a Base64 `Sec-WebSocket-Accept` (20-byte SHA-1 digest).
pub const ACCEPT_LEN: usize = 28;

/// Validate that a header value does not contain CR or LF characters.
///
/// # Errors
/// Returns `Error::InvalidHeaderValue` if the value contains `\r` or `\n`.
pub fn validate_header_value(header_name: &str, value: &str) -> Result<()> {
    if value.contains('\r') || value.contains('\n') {
        return Err(Error::InvalidHeaderValue {
            header: header_name.to_string(),
            reason: "contains CR or LF characters".to_string(),
        });
    }
    Ok(())
}

/// Generate a fresh `Sec-WebSocket-Key`: 16 bytes from the OS random source,
/// Base64 encoded.
///
/// # Errors
///
/// Returns `Error::Io` if the OS random source is unavailable.
pub fn generate_key() -> Result<String> {
    let mut nonce = [0u8; 16];
    getrandom::getrandom(&mut nonce)
        .map_err(|e| Error::Io(format!("random source unavailable: {e}")))?;
    Ok(BASE64.encode(nonce))
}

/// Computes the Sec-WebSocket-Accept value from the client's Sec-WebSocket-Key.
///
/// The accept key is calculated as: Base64(SHA-1(key + GUID))
///
/// # Example
///
/// ```
/// use tinyws::protocol::handshake::generate_accept;
///
/// let key = "dGhlIHNhbXBsZSBub25jZQ==";
/// let accept = generate_accept(key);
/// assert_eq!(accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
#[must_use]
pub fn generate_accept(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    let hash = hasher.finalize();
    BASE64.encode(hash)
}

/// Check the server's accept value against the key the client sent.
#[must_use]
pub fn verify(key: &str, accept: &str) -> bool {
    generate_accept(key).as_bytes() == accept.as_bytes()
}

/// Opening handshake sent by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRequest {
    /// Request target (e.g., "/chat").
    pub url: String,
    /// The Host header value.
    pub host: String,
    /// The Origin header value; defaults to the host.
    pub origin: String,
    /// Requested sub-protocol, if any.
    pub protocol: Option<String>,
    /// The Sec-WebSocket-Key header value.
    pub key: String,
}

impl ClientRequest {
    /// Build a request for `url` on `host` with `Origin` set to the host.
    #[must_use]
    pub fn new(url: impl Into<String>, host: impl Into<String>, key: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            url: url.into(),
            origin: host.clone(),
            host,
            protocol: None,
            key: key.into(),
        }
    }

    /// Set the Origin header.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Request a sub-protocol.
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Write the HTTP request head to a buffer.
    ///
    /// # Errors
    /// Returns `Error::InvalidHeaderValue` if any field contains CR/LF.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        validate_header_value("Request-Target", &self.url)?;
        validate_header_value("Host", &self.host)?;
        validate_header_value("Origin", &self.origin)?;
        validate_header_value("Sec-WebSocket-Key", &self.key)?;

        let mut head = String::with_capacity(192);
        // Writing into a String cannot fail.
        let _ = write!(head, "GET {} HTTP/1.1\r\n", self.url);
        let _ = write!(head, "Host: {}\r\n", self.host);
        let _ = write!(head, "Origin: {}\r\n", self.origin);
        head.push_str("Upgrade: websocket\r\n");
        head.push_str("Connection: Upgrade\r\n");
        let _ = write!(head, "Sec-WebSocket-Key: {}\r\n", self.key);
        if let Some(ref proto) = self.protocol {
            validate_header_value("Sec-WebSocket-Protocol", proto)?;
            let _ = write!(head, "Sec-WebSocket-Protocol: {proto}\r\n");
        }
        head.push_str("Sec-WebSocket-Version: 13\r\n\r\n");

        buf.extend_from_slice(head.as_bytes());
        Ok(())
    }
}

/// `101 Switching Protocols` response sent by a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerResponse {
    /// The Server header value.
    pub server: String,
    /// The Sec-WebSocket-Accept value.
    pub accept: String,
    /// Echoed sub-protocol, if the client sent one.
    pub protocol: Option<String>,
}

impl ServerResponse {
    /// Create the response answering the client's `key`.
    #[must_use]
    pub fn for_key(server: impl Into<String>, key: &str, protocol: Option<String>) -> Self {
        Self {
            server: server.into(),
            accept: generate_accept(key),
            protocol,
        }
    }

    /// Write the HTTP response to a buffer.
    ///
    /// # Errors
    /// Returns `Error::InvalidHeaderValue` if server name or protocol contain CR/LF.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        validate_header_value("Server", &self.server)?;

        buf.extend_from_slice(b"HTTP/1.1 101 Switching Protocols\r\n");
        buf.extend_from_slice(format!("Server: {}\r\n", self.server).as_bytes());
        buf.extend_from_slice(b"Upgrade: websocket\r\n");
        buf.extend_from_slice(b"Connection: Upgrade\r\n");
        buf.extend_from_slice(format!("Sec-WebSocket-Accept: {}\r\n", self.accept).as_bytes());

        if let Some(ref proto) = self.protocol {
            validate_header_value("Sec-WebSocket-Protocol", proto)?;
            buf.extend_from_slice(format!("Sec-WebSocket-Protocol: {proto}\r\n").as_bytes());
        }

        buf.extend_from_slice(b"\r\n");
        Ok(())
    }
}
