use std::error::Error;
use std::io;
use thiserror::Error;

/// Error returned by a [`Handler`](crate::handler::Handler) that failed to produce its response.
pub type HandlerError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("handler error: {source}")]
    HandlerError { source: HandlerError },
}

impl HttpError {
    pub fn handler<E: Into<HandlerError>>(e: E) -> Self {
        Self::HandlerError { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("request too large, buffer capacity {capacity} exhausted before header block ended")]
    TooLargeRequest { capacity: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("request path length {current_size} exceed the limit {max_size}")]
    TooLongPath { current_size: usize, max_size: usize },

    #[error("malformed request: {reason}")]
    Malformed { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http path")]
    InvalidPath,

    #[error("connection closed by peer after {received} bytes")]
    ConnectionClosed { received: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_request(capacity: usize) -> Self {
        Self::TooLargeRequest { capacity }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn too_long_path(current_size: usize, max_size: usize) -> Self {
        Self::TooLongPath { current_size, max_size }
    }

    pub fn malformed<S: ToString>(str: S) -> Self {
        Self::Malformed { reason: str.to_string() }
    }

    pub fn connection_closed(received: usize) -> Self {
        Self::ConnectionClosed { received }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Whether the tokenizer rejected the bytes, as opposed to the peer or the buffer giving out.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Malformed { .. } | Self::TooManyHeaders { .. } | Self::InvalidVersion(_) | Self::InvalidMethod | Self::InvalidPath
        )
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
