//! Fixed-capacity request buffer.
//!
//! Every in-flight connection owns one [`RequestBuffer`]. Bytes are only ever
//! appended at the tail, and the buffer never grows past the capacity chosen
//! at construction: an append that would overflow is rejected with
//! [`ParseError::TooLargeRequest`] instead of being truncated.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::ensure;
use crate::protocol::ParseError;

/// Default capacity of a request buffer in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

#[derive(Debug)]
pub struct RequestBuffer {
    inner: BytesMut,
    capacity: usize,
}

impl RequestBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: BytesMut::with_capacity(capacity), capacity }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes that can still be appended.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.inner.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Appends `chunk` at the tail, or rejects it whole when it does not fit.
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), ParseError> {
        ensure!(chunk.len() <= self.remaining(), ParseError::too_large_request(self.capacity));
        self.inner.extend_from_slice(chunk);
        Ok(())
    }

    /// Performs one receive from `reader` into the free tail of the buffer.
    ///
    /// At most [`remaining`](Self::remaining) bytes are read, so the buffer can't
    /// overflow whatever the peer sends. Returns the number of bytes received;
    /// `Ok(0)` means the peer closed its side.
    pub async fn receive_from<R>(&mut self, reader: &mut R) -> Result<usize, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let remaining = self.remaining();
        ensure!(remaining > 0, ParseError::too_large_request(self.capacity));

        let mut tail = (&mut self.inner).limit(remaining);
        let received = reader.read_buf(&mut tail).await.map_err(ParseError::io)?;
        Ok(received)
    }

    /// Freezes the accumulated bytes so parsed field ranges can keep viewing them.
    pub fn freeze(self) -> Bytes {
        self.inner.freeze()
    }
}

impl AsRef<[u8]> for RequestBuffer {
    fn as_ref(&self) -> &[u8] {
        self.inner.as_ref()
    }
}

impl Default for RequestBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_until_full() {
        let mut buffer = RequestBuffer::with_capacity(8);
        buffer.append(b"GET ").unwrap();
        buffer.append(b"/ H").unwrap();
        assert_eq!(buffer.len(), 7);
        assert_eq!(buffer.remaining(), 1);

        assert!(matches!(buffer.append(b"TT"), Err(ParseError::TooLargeRequest { capacity: 8 })));
        // a rejected append leaves the buffer untouched
        assert_eq!(buffer.as_ref(), b"GET / H");

        buffer.append(b"T").unwrap();
        assert!(buffer.is_full());
    }

    #[tokio::test]
    async fn receive_never_reads_past_capacity() {
        let mut buffer = RequestBuffer::with_capacity(10);
        let mut reader: &[u8] = b"GET /index.html HTTP/1.1\r\n";

        let received = buffer.receive_from(&mut reader).await.unwrap();
        assert_eq!(received, 10);
        assert!(buffer.is_full());
        assert_eq!(buffer.as_ref(), b"GET /index");

        assert!(matches!(buffer.receive_from(&mut reader).await, Err(ParseError::TooLargeRequest { capacity: 10 })));
    }

    #[tokio::test]
    async fn receive_reports_end_of_stream() {
        let mut buffer = RequestBuffer::default();
        let mut reader: &[u8] = b"";
        assert_eq!(buffer.receive_from(&mut reader).await.unwrap(), 0);
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), DEFAULT_BUFFER_CAPACITY);
    }
}
