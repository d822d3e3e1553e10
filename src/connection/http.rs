//! Incremental reader for the HTTP head of the opening handshake.
//!
//! `httparse` parses a complete buffer and reports `Partial` otherwise. The
//! [`HeadReader`] keeps the bytes of an unfinished head between calls (up to
//! `Limits::max_handshake_size`) and reports, once the head is complete, how
//! many bytes of the *current* chunk belonged to it so the session can hand
//! the rest to the frame parser.

use tracing::trace;

use crate::config::Limits;
use crate::error::Result;

/// Upper bound on header lines in a handshake head.
pub const MAX_HEADERS: usize = 32;

/// Which kind of head the reader expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadKind {
    /// A request line (server side).
    Request,
    /// A status line (client side).
    Response,
}

/// A complete, parsed HTTP head.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpHead {
    /// Request target, for requests.
    pub path: Option<String>,
    /// Status code, for responses.
    pub status: Option<u16>,
    /// Header pairs in the order received.
    pub headers: Vec<(String, Vec<u8>)>,
}

/// Buffers and parses one HTTP head.
#[derive(Debug, Clone)]
pub struct HeadReader {
    kind: HeadKind,
    buf: Vec<u8>,
    limits: Limits,
}

impl HeadReader {
    /// Create a reader for `kind` heads bounded by `limits.max_handshake_size`.
    #[must_use]
    pub fn new(kind: HeadKind, limits: &Limits) -> Self {
        Self {
            kind,
            buf: Vec::new(),
            limits: limits.clone(),
        }
    }

    /// Bytes of an unfinished head held from earlier chunks.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Feed the next chunk.
    ///
    /// Returns `Some((head, consumed))` when the head is complete, where
    /// `consumed` counts only bytes of `chunk`. Returns `None` when the whole
    /// chunk was buffered and more input is needed.
    ///
    /// # Errors
    ///
    /// - `Error::UpstreamHttp` if `httparse` rejects the head
    /// - `Error::HandshakeTooLarge` if the head outgrows the limit
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<(HttpHead, usize)>> {
        let previous = self.buf.len();
        let parsed = if previous == 0 {
            parse_head(self.kind, chunk)?
        } else {
            self.buf.extend_from_slice(chunk);
            parse_head(self.kind, &self.buf)?
        };

        match parsed {
            Some((head, len)) => {
                self.limits.check_handshake_size(len)?;
                self.buf = Vec::new();
                trace!(len, headers = head.headers.len(), "http head complete");
                Ok(Some((head, len - previous)))
            }
            None => {
                self.limits.check_handshake_size(previous + chunk.len())?;
                if previous == 0 {
                    self.buf.extend_from_slice(chunk);
                }
                Ok(None)
            }
        }
    }
}

fn parse_head(kind: HeadKind, data: &[u8]) -> Result<Option<(HttpHead, usize)>> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];

    match kind {
        HeadKind::Request => {
            let mut req = httparse::Request::new(&mut headers);
            match req.parse(data)? {
                httparse::Status::Complete(len) => {
                    let head = HttpHead {
                        path: req.path.map(str::to_owned),
                        status: None,
                        headers: collect_headers(req.headers),
                    };
                    Ok(Some((head, len)))
                }
                httparse::Status::Partial => Ok(None),
            }
        }
        HeadKind::Response => {
            let mut res = httparse::Response::new(&mut headers);
            match res.parse(data)? {
                httparse::Status::Complete(len) => {
                    let head = HttpHead {
                        path: None,
                        status: res.code,
                        headers: collect_headers(res.headers),
                    };
                    Ok(Some((head, len)))
                }
                httparse::Status::Partial => Ok(None),
            }
        }
    }
}

fn collect_headers(headers: &[httparse::Header<'_>]) -> Vec<(String, Vec<u8>)> {
    headers
        .iter()
        .map(|h| (h.name.to_owned(), h.value.to_vec()))
        .collect()
}
