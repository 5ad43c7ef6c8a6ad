//! Core protocol types.
//!
//! - **Buffering** ([`buffer`]): [`RequestBuffer`], the fixed-capacity,
//!   append-only byte buffer owned by the connection being served
//! - **Limits** ([`limits`]): [`RequestLimits`], the bounds applied while
//!   reading a request (buffer capacity, header count, path length)
//! - **Request** ([`request`]): [`RequestHead`] as produced by the tokenizer and
//!   [`ParsedRequest`], the head attached to the frozen buffer it views
//! - **Errors** ([`error`]):
//!   - [`HttpError`]: top-level error of one connection
//!   - [`ParseError`]: request reading and tokenizing errors
//!   - [`SendError`]: response writing errors

pub mod buffer;
pub use buffer::RequestBuffer;

pub mod limits;
pub use limits::RequestLimits;
pub use limits::MAX_HEADER_NUM;

mod request;
pub(crate) use request::HeaderIndex;
pub use request::ParsedRequest;
pub use request::RequestHead;

mod error;
pub use error::HandlerError;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
