//! Parsed request types.
//!
//! The tokenizer produces a [`RequestHead`]: the method and path copied out of
//! the buffer, the minor version, and the byte ranges of every header. Once
//! the driver freezes the request buffer the head is attached to those bytes,
//! yielding a [`ParsedRequest`] whose header accessors are views into the
//! original buffer.

use bytes::Bytes;
use http::{Method, Version};

/// Byte ranges of a header's name and value within the request buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeaderIndex {
    /// Start and end byte positions of the header name
    pub(crate) name: (usize, usize),
    /// Start and end byte positions of the header value
    pub(crate) value: (usize, usize),
}

impl HeaderIndex {
    /// Records the byte positions of header names and values from the parsed headers.
    ///
    /// `bytes` must be the buffer the headers were parsed from.
    pub(crate) fn record(bytes: &[u8], headers: &[httparse::Header<'_>]) -> Vec<HeaderIndex> {
        let bytes_ptr = bytes.as_ptr() as usize;
        headers
            .iter()
            .map(|header| {
                let name_start = header.name.as_ptr() as usize - bytes_ptr;
                let value_start = header.value.as_ptr() as usize - bytes_ptr;
                HeaderIndex {
                    name: (name_start, name_start + header.name.len()),
                    value: (value_start, value_start + header.value.len()),
                }
            })
            .collect()
    }
}

/// Fields of a complete request header block, independent of the buffer it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) minor_version: u8,
    pub(crate) headers: Vec<HeaderIndex>,
    pub(crate) header_len: usize,
}

impl RequestHead {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn minor_version(&self) -> u8 {
        self.minor_version
    }

    /// Length in bytes of the header block, terminating blank line included.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    /// Attaches the head to the buffer it was parsed from.
    pub(crate) fn attach(self, bytes: Bytes) -> ParsedRequest {
        ParsedRequest { head: self, bytes }
    }
}

/// A complete request: parsed fields plus the frozen request buffer they point into.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    head: RequestHead,
    bytes: Bytes,
}

impl ParsedRequest {
    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn method(&self) -> &Method {
        self.head.method()
    }

    pub fn path(&self) -> &str {
        self.head.path()
    }

    /// The `<minor>` of `HTTP/1.<minor>`.
    pub fn minor_version(&self) -> u8 {
        self.head.minor_version()
    }

    pub fn version(&self) -> Version {
        U8Wrapper(self.head.minor_version).into()
    }

    pub fn header_len(&self) -> usize {
        self.head.header_len()
    }

    pub fn header_count(&self) -> usize {
        self.head.header_count()
    }

    /// Header `(name, value)` pairs in the order they appeared on the wire.
    pub fn headers(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.head
            .headers
            .iter()
            .map(|index| (&self.bytes[index.name.0..index.name.1], &self.bytes[index.value.0..index.value.1]))
    }

    /// Value of the first header whose name matches `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers().find(|(header_name, _)| header_name.eq_ignore_ascii_case(name.as_bytes())).map(|(_, value)| value)
    }

    /// The raw header block as received.
    pub fn header_bytes(&self) -> &[u8] {
        &self.bytes[..self.head.header_len]
    }
}

/// Helper struct for HTTP version conversion.
struct U8Wrapper(u8);

impl From<U8Wrapper> for Version {
    fn from(value: U8Wrapper) -> Self {
        match value.0 {
            1 => Version::HTTP_11,
            0 => Version::HTTP_10,
            // the tokenizer only accepts HTTP/1.x
            _ => Version::HTTP_09,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn parsed(str: &str) -> ParsedRequest {
        let bytes = Bytes::copy_from_slice(str.as_bytes());
        let mut headers = [httparse::EMPTY_HEADER; 16];
        let mut req = httparse::Request::new(&mut headers);
        let header_len = req.parse(&bytes).unwrap().unwrap();

        let head = RequestHead {
            method: Method::from_bytes(req.method.unwrap().as_bytes()).unwrap(),
            path: req.path.unwrap().to_owned(),
            minor_version: req.version.unwrap(),
            headers: HeaderIndex::record(&bytes, req.headers),
            header_len,
        };
        head.attach(bytes.clone())
    }

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let request = parsed(str);

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.version(), Version::HTTP_11);
        assert_eq!(request.path(), "/index.html");
        assert_eq!(request.header_len(), str.len());
        assert_eq!(request.header_count(), 3);

        let headers = request.headers().collect::<Vec<_>>();
        assert_eq!(headers[0], (&b"Host"[..], &b"127.0.0.1:8080"[..]));
        assert_eq!(headers[1], (&b"User-Agent"[..], &b"curl/7.79.1"[..]));
        assert_eq!(headers[2], (&b"Accept"[..], &b"*/*"[..]));

        assert_eq!(request.header("user-agent"), Some(&b"curl/7.79.1"[..]));
        assert_eq!(request.header("Connection"), None);
    }

    #[test]
    fn header_bytes_excludes_body() {
        let str = "POST /api HTTP/1.0\r\nContent-Length: 3\r\n\r\nabc";
        let request = parsed(str);

        assert_eq!(request.version(), Version::HTTP_10);
        assert_eq!(request.minor_version(), 0);
        assert_eq!(request.header_bytes(), &str.as_bytes()[..str.len() - 3]);
    }
}
