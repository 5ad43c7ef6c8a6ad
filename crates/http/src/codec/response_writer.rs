use bytes::{BufMut, BytesMut};
use http::header::CONTENT_TYPE;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::protocol::SendError;

/// Writes response parts straight onto a connection.
///
/// Each [`write`](Self::write) is one write on the wire; nothing is framed or
/// buffered, so a response goes out exactly as the handler issues it.
pub struct ResponseWriter<'conn> {
    writer: &'conn mut (dyn AsyncWrite + Unpin + Send),
    written: usize,
}

impl<'conn> ResponseWriter<'conn> {
    pub fn new(writer: &'conn mut (dyn AsyncWrite + Unpin + Send)) -> Self {
        Self { writer, written: 0 }
    }

    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        self.writer.write_all(bytes).await?;
        self.written += bytes.len();
        trace!(len = bytes.len(), total = self.written, "wrote response part");
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), SendError> {
        Ok(self.writer.flush().await?)
    }

    /// Total bytes written so far.
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }
}

impl std::fmt::Debug for ResponseWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseWriter").field("written", &self.written).finish_non_exhaustive()
    }
}

/// Writes the `Content-type: text/html` header block, then `body`, as two writes.
///
/// No status line and no `Content-Length`: the peer reads the page until the
/// connection is closed.
pub async fn write_html_page(writer: &mut ResponseWriter<'_>, body: &[u8]) -> Result<(), SendError> {
    writer.write(&html_header_block()).await?;
    writer.write(body).await?;
    writer.flush().await
}

fn html_header_block() -> BytesMut {
    // sent as written here, not in the lowercase form of `CONTENT_TYPE`
    const NAME: &[u8] = b"Content-type";
    debug_assert!(NAME.eq_ignore_ascii_case(CONTENT_TYPE.as_str().as_bytes()));

    let mime = mime::TEXT_HTML;
    let essence = mime.essence_str();
    let mut block = BytesMut::with_capacity(NAME.len() + essence.len() + 6);
    block.put_slice(NAME);
    block.put_slice(b": ");
    block.put_slice(essence.as_bytes());
    block.put_slice(b"\r\n\r\n");
    block
}
