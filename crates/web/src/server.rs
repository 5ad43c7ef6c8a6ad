use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use dispatch_http::codec::ResponseWriter;
use dispatch_http::handler::Handler;
use dispatch_http::protocol::{HandlerError, ParsedRequest};
use thiserror::Error;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::handler::{DefaultRoute, FileSystemRoute};
use crate::listener::Listener;
use crate::queue::{connection_queue, QueueError};
use crate::router::{RouteError, RouteTable, RouteTableBuilder};
use crate::worker::{EmptyPoolError, WorkerPool};

/// Picks the handler for a request: the first matching route, else the default.
pub struct Dispatcher {
    routes: RouteTable,
    default_handler: Box<dyn Handler>,
}

impl Dispatcher {
    pub fn new(routes: RouteTable, default_handler: impl Handler + 'static) -> Self {
        Self { routes, default_handler: Box::new(default_handler) }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn select(&self, path: &str) -> &dyn Handler {
        self.routes.find(path).unwrap_or(self.default_handler.as_ref())
    }
}

#[async_trait]
impl Handler for Dispatcher {
    async fn call(&self, request: &ParsedRequest, writer: &mut ResponseWriter<'_>) -> Result<(), HandlerError> {
        self.select(request.path()).call(request, writer).await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("routes", &self.routes).finish_non_exhaustive()
    }
}

/// The routes the server answers out of the box, in evaluation order.
///
/// # Errors
///
/// Fails only when `builder` has too little room left for them.
pub fn default_routes(mut builder: RouteTableBuilder) -> Result<RouteTableBuilder, RouteError> {
    for pattern in ["/$", "/api", "/file.txt"] {
        builder.register(pattern, FileSystemRoute)?;
    }
    Ok(builder)
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Workers(#[from] EmptyPoolError),

    #[error("route registration failed: {0}")]
    Route(#[from] RouteError),

    #[error("accept loop stopped, no worker is left to take connections")]
    Stopped,
}

pub struct ServerBuilder {
    config: ServerConfig,
    routes: Option<RouteTable>,
    default_handler: Option<Box<dyn Handler>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { config: ServerConfig::default(), routes: None, default_handler: None }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = Some(routes);
        self
    }

    pub fn default_handler(mut self, handler: impl Handler + 'static) -> Self {
        self.default_handler = Some(Box::new(handler));
        self
    }

    /// Without explicit routes the table is filled with [`default_routes`];
    /// without a default handler, [`DefaultRoute`] answers unmatched paths.
    pub fn build(self) -> Result<Server, ServerError> {
        let routes = match self.routes {
            Some(routes) => routes,
            None => {
                let builder = RouteTableBuilder::with_limits(self.config.route_capacity, self.config.max_pattern_len);
                default_routes(builder)?.build()
            }
        };

        let dispatcher = Dispatcher {
            routes,
            default_handler: self.default_handler.unwrap_or_else(|| Box::new(DefaultRoute)),
        };

        Ok(Server { config: self.config, dispatcher: Arc::new(dispatcher) })
    }
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder").field("config", &self.config).field("routes", &self.routes).finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address, then serves forever.
    ///
    /// # Errors
    ///
    /// Returns the startup failure, or [`ServerError::Stopped`] if serving
    /// ever ends. It never returns `Ok`.
    pub async fn start(self) -> Result<(), ServerError> {
        let address = self.config.address();
        let listener = Listener::bind(address).await.map_err(|source| {
            error!(%address, cause = %source, "bind server error");
            ServerError::Bind { address, source }
        })?;

        self.serve(listener).await
    }

    /// Starts the worker pool and runs the accept loop on an already bound listener.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start), minus the bind failure.
    pub async fn serve(self, listener: Listener) -> Result<(), ServerError> {
        let Self { config, dispatcher } = self;
        let routes = dispatcher.routes().patterns().map(str::to_owned).collect::<Vec<_>>();

        let (sender, receiver) = connection_queue(config.queue_capacity)?;
        let pool = WorkerPool::start(config.workers, &receiver, dispatcher, config.worker_options())?;
        drop(receiver);

        info!(workers = pool.size(), queue_capacity = config.queue_capacity, ?routes, "server ready");

        listener.run(sender, config.enqueue_timeout).await;
        pool.join().await;

        error!("accept loop stopped");
        Err(ServerError::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_http::codec::parse_buffered;
    use dispatch_http::protocol::RequestLimits;

    struct Marker;

    #[async_trait]
    impl Handler for Marker {
        async fn call(&self, _request: &ParsedRequest, writer: &mut ResponseWriter<'_>) -> Result<(), HandlerError> {
            writer.write(b"marker").await?;
            Ok(())
        }
    }

    async fn respond(dispatcher: &Dispatcher, path: &str) -> Vec<u8> {
        let request = format!("GET {path} HTTP/1.1\r\nHost: x\r\n\r\n");
        let request = parse_buffered(request, &RequestLimits::default()).unwrap().unwrap();
        let mut sink: Vec<u8> = Vec::new();
        dispatcher.call(&request, &mut ResponseWriter::new(&mut sink)).await.unwrap();
        sink
    }

    #[tokio::test]
    async fn unmatched_paths_reach_the_default_handler() {
        let routes = RouteTable::builder().route("/file.txt", FileSystemRoute).unwrap().build();
        let dispatcher = Dispatcher::new(routes, Marker);

        assert_eq!(respond(&dispatcher, "/unknown").await, b"marker");
        assert_ne!(respond(&dispatcher, "/file.txt").await, b"marker");
    }

    #[test]
    fn default_table_order() {
        let server = Server::builder().build().unwrap();
        let patterns = server.dispatcher.routes().patterns().collect::<Vec<_>>();
        assert_eq!(patterns, vec!["/$", "/api", "/file.txt"]);
    }

    #[test]
    fn default_table_needs_room() {
        let config = ServerConfig { route_capacity: 2, ..ServerConfig::default() };
        let result = Server::builder().config(config).build();
        assert!(matches!(result, Err(ServerError::Route(RouteError::TableFull { capacity: 2 }))));
    }

    #[tokio::test]
    async fn startup_errors_are_reported() {
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let config = ServerConfig { workers: 0, ..ServerConfig::default() };
        let result = Server::builder().config(config).build().unwrap().serve(listener).await;
        assert!(matches!(result, Err(ServerError::Workers(_))));

        let listener = Listener::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let config = ServerConfig { queue_capacity: 0, ..ServerConfig::default() };
        let result = Server::builder().config(config).build().unwrap().serve(listener).await;
        assert!(matches!(result, Err(ServerError::Queue(QueueError::ZeroCapacity))));
    }
}
