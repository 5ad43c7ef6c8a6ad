//! Fixed pool of workers draining the connection queue.
//!
//! Each worker loops forever: wait for a connection, pause for the pacing
//! delay, read and dispatch one request, close the connection. A worker keeps
//! nothing between connections but its name. The loop only ends when the
//! queue reports that every producer is gone.

use std::sync::Arc;
use std::time::Duration;

use dispatch_http::connection::HttpConnection;
use dispatch_http::handler::Handler;
use dispatch_http::protocol::{HttpError, RequestLimits};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::queue::ConnectionReceiver;

/// Default number of workers.
pub const DEFAULT_WORKERS: usize = 2;

/// Default pause between taking a connection and reading from it.
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(50);

/// Settings shared by every worker of a pool.
#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    pub pacing_delay: Duration,
    pub limits: RequestLimits,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self { pacing_delay: DEFAULT_PACING_DELAY, limits: RequestLimits::default() }
    }
}

pub struct Worker<C, H: ?Sized> {
    name: String,
    receiver: ConnectionReceiver<C>,
    handler: Arc<H>,
    options: WorkerOptions,
}

impl<C, H> Worker<C, H>
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    H: Handler + ?Sized + 'static,
{
    pub fn new(name: impl Into<String>, receiver: ConnectionReceiver<C>, handler: Arc<H>, options: WorkerOptions) -> Self {
        Self { name: name.into(), receiver, handler, options }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serves connections until the queue is closed.
    pub async fn run(self) {
        info!(worker = %self.name, "started");

        while let Some(conn) = self.receiver.pop().await {
            debug!(worker = %self.name, "got request to process");
            self.serve(conn).await;
        }

        info!(worker = %self.name, "connection queue closed, stopping");
    }

    /// Serves one connection in its own task, so a panicking handler costs
    /// only that connection and the worker keeps popping.
    async fn serve(&self, conn: C) {
        tokio::time::sleep(self.options.pacing_delay).await;

        let handler = Arc::clone(&self.handler);
        let limits = self.options.limits;
        let task = tokio::spawn(async move {
            let connection = HttpConnection::new(conn, limits);
            connection.process(handler.as_ref()).await
        });

        match task.await {
            Ok(Ok(())) => {
                info!(worker = %self.name, "finished process, connection closed");
            }
            Ok(Err(HttpError::RequestError { source })) => {
                warn!(worker = %self.name, cause = %source, "request abandoned, connection closed");
            }
            Ok(Err(HttpError::ResponseError { source })) => {
                warn!(worker = %self.name, cause = %source, "response not delivered, connection closed");
            }
            Ok(Err(HttpError::HandlerError { source })) => {
                error!(worker = %self.name, cause = %source, "handler failed, connection closed");
            }
            Err(e) => {
                error!(worker = %self.name, cause = %e, "handler panicked, connection dropped");
            }
        }
    }
}

impl<C, H: ?Sized> std::fmt::Debug for Worker<C, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker").field("name", &self.name).field("options", &self.options).finish_non_exhaustive()
    }
}

/// The spawned workers of one server.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

#[derive(thiserror::Error, Debug)]
#[error("worker pool needs at least one worker")]
pub struct EmptyPoolError;

impl WorkerPool {
    /// Spawns `size` workers named `ReqHandler-<index>` on the current runtime.
    ///
    /// # Errors
    ///
    /// Fails when `size` is zero.
    pub fn start<C, H>(
        size: usize,
        receiver: &ConnectionReceiver<C>,
        handler: Arc<H>,
        options: WorkerOptions,
    ) -> Result<Self, EmptyPoolError>
    where
        C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        H: Handler + ?Sized + 'static,
    {
        if size == 0 {
            return Err(EmptyPoolError);
        }

        let handles = (0..size)
            .map(|index| {
                let worker = Worker::new(format!("ReqHandler-{index}"), receiver.clone(), Arc::clone(&handler), options);
                tokio::spawn(worker.run())
            })
            .collect();

        Ok(Self { handles })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every worker to leave its loop, which happens once the queue is closed.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(cause = %e, "worker task ended abnormally");
            }
        }
    }
}
