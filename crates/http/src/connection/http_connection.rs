use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::codec::{parse_request, ParseStatus, ResponseWriter};
use crate::handler::Handler;
use crate::protocol::{HttpError, ParseError, ParsedRequest, RequestBuffer, RequestLimits};

/// One accepted connection, served exactly once and then closed.
///
/// `HttpConnection` owns the stream and the [`RequestBuffer`] for it. The
/// lifecycle is:
/// - receive into the buffer until the tokenizer reports a complete request
///   head, a malformed one, or the buffer fills up
/// - hand a complete request to the [`Handler`]
/// - close the stream, whatever happened before
///
/// Malformed or oversized requests get no response at all; the connection is
/// just closed.
///
/// # Type Parameters
///
/// * `S`: the byte stream, readable and writable
pub struct HttpConnection<S> {
    stream: S,
    buffer: RequestBuffer,
    limits: RequestLimits,
}

impl<S> HttpConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, limits: RequestLimits) -> Self {
        Self { stream, buffer: RequestBuffer::with_capacity(limits.buffer_capacity), limits }
    }

    /// Reads, dispatches and closes. The stream is closed on every path.
    pub async fn process<H>(mut self, handler: &H) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        let result = match self.read_request().await {
            Ok(request) => self.dispatch(&request, handler).await,
            Err(e) => Err(e.into()),
        };

        self.close().await;
        result
    }

    /// Receives until a complete request head is buffered.
    ///
    /// Every receive appends at the tail of the buffer, then the whole
    /// accumulated buffer is tokenized again.
    pub async fn read_request(&mut self) -> Result<ParsedRequest, ParseError> {
        loop {
            let last_len = self.buffer.len();

            let received = match self.buffer.receive_from(&mut self.stream).await {
                Ok(0) => {
                    warn!(received = last_len, "connection closed before request head completed");
                    return Err(ParseError::connection_closed(last_len));
                }
                Ok(received) => received,
                Err(e) => {
                    warn!(cause = %e, "receive failure");
                    return Err(e);
                }
            };
            debug!(received, buffered = self.buffer.len(), "received request bytes");

            match parse_request(self.buffer.as_ref(), last_len, &self.limits) {
                Ok(ParseStatus::Complete(head)) => {
                    let buffer = std::mem::take(&mut self.buffer);
                    let request = head.attach(buffer.freeze());
                    log_request(&request);
                    return Ok(request);
                }
                Ok(ParseStatus::Partial) => {
                    if self.buffer.is_full() {
                        warn!(capacity = self.buffer.capacity(), "request too large");
                        return Err(ParseError::too_large_request(self.buffer.capacity()));
                    }
                }
                Err(e) => {
                    warn!(cause = %e, "buffer parse failure");
                    return Err(e);
                }
            }
        }
    }

    async fn dispatch<H>(&mut self, request: &ParsedRequest, handler: &H) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        info!(path = request.path(), "send response");
        let start = Instant::now();

        let mut writer = ResponseWriter::new(&mut self.stream);
        let result = handler.call(request, &mut writer).await;
        let written = writer.written();

        match result {
            Ok(()) => {
                debug!(written, elapsed = ?start.elapsed(), "response written");
                Ok(())
            }
            Err(e) => {
                error!(cause = %e, written, "handler failed");
                Err(HttpError::handler(e))
            }
        }
    }

    /// Shuts the write side down; the stream is released when `self` drops.
    async fn close(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(cause = %e, "shutdown after serving failed");
        }
    }
}

impl<S> std::fmt::Debug for HttpConnection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnection").field("buffer", &self.buffer).field("limits", &self.limits).finish_non_exhaustive()
    }
}

fn log_request(request: &ParsedRequest) {
    info!(header_len = request.header_len(), "buffer parsed ok");
    debug!(
        method = %request.method(),
        path = request.path(),
        version = ?request.version(),
        "request line"
    );
    for (name, value) in request.headers() {
        debug!(name = %String::from_utf8_lossy(name), value = %String::from_utf8_lossy(value), "request header");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    use async_trait::async_trait;
    use http::Method;
    use tokio::io::ReadBuf;

    use super::*;
    use crate::codec::write_html_page;
    use crate::protocol::HandlerError;

    const FILE_REQUEST: &[u8] = b"GET /file.txt HTTP/1.1\r\nHost: x\r\n\r\n";

    /// Hands out one queued chunk per read, records writes and shutdown.
    #[derive(Default)]
    struct MockIO {
        chunks: VecDeque<Vec<u8>>,
        written: Vec<u8>,
        shutdown: bool,
        fail_read: bool,
    }

    impl MockIO {
        fn new<I, C>(chunks: I) -> Self
        where
            I: IntoIterator<Item = C>,
            C: AsRef<[u8]>,
        {
            Self { chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(), ..Default::default() }
        }
    }

    impl AsyncRead for MockIO {
        fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            if self.fail_read {
                return Poll::Ready(Err(io::Error::from(io::ErrorKind::ConnectionReset)));
            }
            if let Some(mut chunk) = self.chunks.pop_front() {
                let amt = std::cmp::min(chunk.len(), buf.remaining());
                buf.put_slice(&chunk[..amt]);
                if amt < chunk.len() {
                    self.chunks.push_front(chunk.split_off(amt));
                }
            }
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockIO {
        fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
            self.written.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
            self.shutdown = true;
            Poll::Ready(Ok(()))
        }
    }

    #[derive(Default)]
    struct PageHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Handler for PageHandler {
        async fn call(&self, _request: &ParsedRequest, writer: &mut ResponseWriter<'_>) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            write_html_page(writer, b"<html></html>").await?;
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl Handler for FailingHandler {
        async fn call(&self, _request: &ParsedRequest, writer: &mut ResponseWriter<'_>) -> Result<(), HandlerError> {
            writer.write(b"Content-type").await?;
            Err("page unavailable".into())
        }
    }

    async fn read_all(chunks: Vec<&[u8]>, limits: RequestLimits) -> (Result<ParsedRequest, ParseError>, MockIO) {
        let mut connection = HttpConnection::new(MockIO::new(chunks), limits);
        let result = connection.read_request().await;
        (result, connection.stream)
    }

    fn summary(request: &ParsedRequest) -> (Method, String, u8, Vec<(Vec<u8>, Vec<u8>)>, usize) {
        let headers = request.headers().map(|(n, v)| (n.to_vec(), v.to_vec())).collect();
        (request.method().clone(), request.path().to_owned(), request.minor_version(), headers, request.header_len())
    }

    #[tokio::test]
    async fn parse_file_request_in_one_chunk() {
        let (result, _) = read_all(vec![FILE_REQUEST], RequestLimits::default()).await;
        let request = result.unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/file.txt");
        assert_eq!(request.minor_version(), 1);
        assert_eq!(request.headers().collect::<Vec<_>>(), vec![(&b"Host"[..], &b"x"[..])]);
        assert_eq!(request.header_len(), FILE_REQUEST.len());
    }

    #[tokio::test]
    async fn any_chunking_parses_the_same() {
        let (whole, _) = read_all(vec![FILE_REQUEST], RequestLimits::default()).await;
        let expected = summary(&whole.unwrap());

        for split in 1..FILE_REQUEST.len() {
            let (left, right) = FILE_REQUEST.split_at(split);
            let (result, _) = read_all(vec![left, right], RequestLimits::default()).await;
            assert_eq!(summary(&result.unwrap()), expected, "split at {split}");
        }

        let bytes = FILE_REQUEST.chunks(1).collect::<Vec<_>>();
        let (result, _) = read_all(bytes, RequestLimits::default()).await;
        assert_eq!(summary(&result.unwrap()), expected);

        let bytes = FILE_REQUEST.chunks(7).collect::<Vec<_>>();
        let (result, _) = read_all(bytes, RequestLimits::default()).await;
        assert_eq!(summary(&result.unwrap()), expected);
    }

    #[tokio::test]
    async fn overflow_fails_without_response() {
        let limits = RequestLimits { buffer_capacity: 64, ..RequestLimits::default() };
        let mut request = b"GET / HTTP/1.1\r\nX-Padding: ".to_vec();
        request.resize(100, b'a');

        let handler = PageHandler::default();
        let mut stream = MockIO::new([&request[..40], &request[40..]]);
        stream.chunks.push_back(b"\r\n\r\n".to_vec());

        let connection = HttpConnection::new(stream, limits);
        let result = connection.process(&handler).await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::TooLargeRequest { capacity: 64 } })));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn overflow_leaves_stream_untouched_but_closed() {
        let limits = RequestLimits { buffer_capacity: 32, ..RequestLimits::default() };
        let mut connection = HttpConnection::new(MockIO::new([b"GET / HTTP/1.1\r\nX-Padding: aaaaaaaaaaaaaaaaaaaa"]), limits);

        let result = connection.read_request().await;
        assert!(matches!(result, Err(ParseError::TooLargeRequest { capacity: 32 })));

        connection.close().await;
        assert!(connection.stream.written.is_empty());
        assert!(connection.stream.shutdown);
    }

    #[tokio::test]
    async fn garbage_fails_on_first_receive() {
        let mut connection = HttpConnection::new(MockIO::new([&b"\x00\x01garbage"[..], FILE_REQUEST]), RequestLimits::default());

        let err = connection.read_request().await.unwrap_err();
        assert!(err.is_malformed(), "unexpected error {err}");
        // the second chunk was never received
        assert_eq!(connection.stream.chunks.len(), 1);
        assert!(connection.stream.written.is_empty());
    }

    #[tokio::test]
    async fn peer_close_and_receive_error_fail() {
        let (result, _) = read_all(vec![&FILE_REQUEST[..10]], RequestLimits::default()).await;
        assert!(matches!(result, Err(ParseError::ConnectionClosed { received: 10 })));

        let mut stream = MockIO::new([FILE_REQUEST]);
        stream.fail_read = true;
        let mut connection = HttpConnection::new(stream, RequestLimits::default());
        assert!(matches!(connection.read_request().await, Err(ParseError::Io { .. })));
    }

    #[tokio::test]
    async fn process_writes_response_then_closes() {
        let handler = PageHandler::default();
        let mut connection = HttpConnection::new(MockIO::new([FILE_REQUEST]), RequestLimits::default());

        let request = connection.read_request().await.unwrap();
        connection.dispatch(&request, &handler).await.unwrap();
        connection.close().await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(connection.stream.written, b"Content-type: text/html\r\n\r\n<html></html>");
        assert!(connection.stream.shutdown);
    }

    #[tokio::test]
    async fn handler_failure_still_closes() {
        let mut connection = HttpConnection::new(MockIO::new([FILE_REQUEST]), RequestLimits::default());

        let request = connection.read_request().await.unwrap();
        let result = connection.dispatch(&request, &FailingHandler).await;
        assert!(matches!(result, Err(HttpError::HandlerError { .. })));

        connection.close().await;
        assert_eq!(connection.stream.written, b"Content-type");
        assert!(connection.stream.shutdown);
    }
}
