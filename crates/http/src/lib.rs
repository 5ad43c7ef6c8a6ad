//! Bounded, one-shot HTTP/1.x request handling for small servers.
//!
//! This crate reads exactly one request head per connection into a
//! fixed-capacity buffer, tokenizes it with `httparse`, hands the parsed
//! request to a [`handler::Handler`], and closes the connection. It is the
//! per-connection half of the `dispatch-web` server; queueing, worker pools and
//! routing live there.
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use dispatch_http::codec::{write_html_page, ResponseWriter};
//! use dispatch_http::connection::HttpConnection;
//! use dispatch_http::handler::Handler;
//! use dispatch_http::protocol::{HandlerError, ParsedRequest, RequestLimits};
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//!     async fn call(&self, request: &ParsedRequest, writer: &mut ResponseWriter<'_>) -> Result<(), HandlerError> {
//!         info!(path = request.path(), "hello");
//!         write_html_page(writer, b"<html><body>hello</body></html>").await?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let connection = HttpConnection::new(tcp_stream, RequestLimits::default());
//!         if let Err(e) = connection.process(&Hello).await {
//!             warn!(cause = %e, "connection abandoned");
//!         }
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: request buffer, limits, parsed request types and errors
//! - [`codec`]: the stateless request tokenizer and the response writer
//! - [`connection`]: the receive → tokenize → dispatch → close driver
//! - [`handler`]: the trait a response producer implements
//!
//! # Request reading
//!
//! The driver receives into the tail of a [`protocol::RequestBuffer`] and,
//! after every receive, tokenizes the whole accumulated buffer again. The
//! tokenizer keeps no state; it is told how long the buffer was on the previous
//! call so it can skip work while no blank line has arrived. Three outcomes end
//! the loop:
//!
//! - a complete head: the request is dispatched
//! - malformed bytes, a full buffer, a peer close or a receive error: the
//!   connection is closed without any response
//!
//! # Limitations
//!
//! - one request per connection, no keep-alive or pipelining
//! - request bodies are never read
//! - no read or write timeouts

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
