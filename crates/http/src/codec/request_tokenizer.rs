//! Stateless request-head tokenizer.
//!
//! [`parse_request`] classifies the bytes accumulated so far as complete,
//! incomplete, or malformed. It keeps no state between calls: the driver calls
//! it again over the whole (grown) buffer after every receive, passing the
//! length the buffer had on the previous call. That hint lets the tokenizer
//! skip the full parse while no header terminator has arrived yet.
//!
//! Byte-level parsing is delegated to `httparse`.

use bytes::Bytes;
use http::Method;
use httparse::Status;
use memchr::memmem;
use tracing::trace;

use crate::ensure;
use crate::protocol::{HeaderIndex, ParseError, ParsedRequest, RequestHead, RequestLimits, MAX_HEADER_NUM};

/// Outcome of tokenizing a non-malformed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    /// A whole header block was found.
    Complete(RequestHead),
    /// More bytes are needed.
    Partial,
}

impl ParseStatus {
    #[inline]
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial)
    }
}

/// Tokenizes `buf`, the full buffer accumulated so far.
///
/// `last_len` is the buffer length at the previous call on this request (0 on
/// the first call). Calling again with the same bytes returns the same result.
///
/// With a non-zero `last_len`, bytes are only validated once a blank line
/// shows up among the new ones. Until then the result is `Partial`, even for
/// input that a parse from offset 0 would already reject: a request line
/// followed by garbage is malformed in one chunk but partial when the garbage
/// arrives in a later receive. The buffer limit still ends such a request.
///
/// # Errors
///
/// Returns a malformed-class [`ParseError`] when the bytes can never form a
/// valid HTTP/1.x request head, or [`ParseError::TooLongPath`] when the path
/// exceeds `limits.max_path_len`.
pub fn parse_request(buf: &[u8], last_len: usize, limits: &RequestLimits) -> Result<ParseStatus, ParseError> {
    if last_len != 0 && !has_terminator(buf, last_len) {
        trace!(buf_len = buf.len(), last_len, "no header terminator in new bytes");
        return Ok(ParseStatus::Partial);
    }

    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut req = httparse::Request::new(&mut headers[..limits.header_slots()]);

    let parsed_result = req.parse(buf).map_err(|e| match e {
        httparse::Error::TooManyHeaders => ParseError::too_many_headers(limits.header_slots()),
        e => ParseError::malformed(e),
    });

    let header_len = match parsed_result? {
        Status::Complete(header_len) => header_len,
        Status::Partial => return Ok(ParseStatus::Partial),
    };
    trace!(header_len, "parsed header block");

    let method = req.method.ok_or(ParseError::InvalidMethod)?;
    let method = Method::from_bytes(method.as_bytes()).map_err(|_| ParseError::InvalidMethod)?;

    let path = req.path.ok_or(ParseError::InvalidPath)?;
    ensure!(path.len() <= limits.max_path_len, ParseError::too_long_path(path.len(), limits.max_path_len));

    let minor_version = match req.version {
        Some(version @ (0 | 1)) => version,
        version => return Err(ParseError::InvalidVersion(version)),
    };

    let headers = HeaderIndex::record(buf, req.headers);

    Ok(ParseStatus::Complete(RequestHead { method, path: path.to_owned(), minor_version, headers, header_len }))
}

/// Tokenizes a buffer that was received as a whole and attaches the head to it.
///
/// Returns `Ok(None)` when the bytes hold only part of a request head.
pub fn parse_buffered(bytes: impl Into<Bytes>, limits: &RequestLimits) -> Result<Option<ParsedRequest>, ParseError> {
    let bytes = bytes.into();
    match parse_request(&bytes, 0, limits)? {
        ParseStatus::Complete(head) => Ok(Some(head.attach(bytes))),
        ParseStatus::Partial => Ok(None),
    }
}

/// Checks whether a blank line ends somewhere in the bytes that arrived after `last_len`.
///
/// The search starts three bytes early so a `\r\n\r\n` split across receives is still seen.
fn has_terminator(buf: &[u8], last_len: usize) -> bool {
    let start = last_len.saturating_sub(3).min(buf.len());
    let tail = &buf[start..];
    memmem::find(tail, b"\n\n").is_some() || memmem::find(tail, b"\n\r\n").is_some()
}
