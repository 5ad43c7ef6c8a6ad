//! Request tokenizing and response encoding.
//!
//! - Request handling:
//!   - [`parse_request`]: classifies the bytes accumulated so far as
//!     complete, incomplete or malformed
//! - Response handling:
//!   - [`ResponseWriter`]: writes response parts onto a connection
//!   - [`write_html_page`]: the `Content-type` block followed by a static page
//!
//! # Example
//!
//! ```
//! use dispatch_http::codec::{parse_request, ParseStatus};
//! use dispatch_http::protocol::RequestLimits;
//!
//! let limits = RequestLimits::default();
//! let status = parse_request(b"GET / HTTP/1.1\r\nHo", 0, &limits).unwrap();
//! assert_eq!(status, ParseStatus::Partial);
//! ```

mod request_tokenizer;
mod response_writer;

pub use request_tokenizer::parse_buffered;
pub use request_tokenizer::parse_request;
pub use request_tokenizer::ParseStatus;
pub use response_writer::write_html_page;
pub use response_writer::ResponseWriter;
