//! Connection handling.
//!
//! [`HttpConnection`] serves exactly one request per accepted connection:
//!
//! - receives into a bounded [`RequestBuffer`](crate::protocol::RequestBuffer)
//!   and re-tokenizes the accumulated bytes after every receive
//! - hands a complete request to a [`Handler`](crate::handler::Handler)
//! - closes the connection on every path, including malformed or oversized
//!   requests, which get no response

mod http_connection;

pub use http_connection::HttpConnection;
