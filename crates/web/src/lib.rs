//! Connection dispatch for a small embedded HTTP server.
//!
//! A single [`Listener`](listener::Listener) accepts TCP connections and pushes
//! them onto a bounded [queue](queue). A fixed [pool of workers](worker) pops
//! them one at a time; each worker reads one request with `dispatch-http`,
//! looks the path up in an ordered regex [`RouteTable`], runs the selected
//! handler and closes the connection.
//!
//! ```no_run
//! use dispatch_web::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dispatch_web::ServerError> {
//!     let config = ServerConfig { port: 8080, ..ServerConfig::default() };
//!     Server::builder().config(config).build()?.start().await
//! }
//! ```

mod config;
mod handler;
mod server;

pub mod listener;
pub mod queue;
pub mod router;
pub mod worker;

pub use config::{ServerConfig, DEFAULT_ENQUEUE_TIMEOUT, DEFAULT_PORT};
pub use handler::{DefaultRoute, FileSystemRoute, INDEX_PAGE};
pub use router::RouteTable;
pub use server::{default_routes, Dispatcher, Server, ServerBuilder, ServerError};
