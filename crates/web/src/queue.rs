//! Bounded FIFO hand-off of accepted connections.
//!
//! One producer (the listener) pushes, any number of consumers (the workers)
//! pop. The queue never grows past the capacity given at construction: a push
//! into a full queue waits at most its timeout and then hands the connection
//! back to the caller. Each pushed connection is delivered to exactly one
//! `pop`, in push order.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

/// Default number of connections that can wait for a worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Creates a queue holding at most `capacity` connections.
///
/// # Errors
///
/// Fails when `capacity` is zero.
pub fn connection_queue<C>(capacity: usize) -> Result<(ConnectionSender<C>, ConnectionReceiver<C>), QueueError> {
    if capacity == 0 {
        return Err(QueueError::ZeroCapacity);
    }

    let (sender, receiver) = mpsc::channel(capacity);
    Ok((ConnectionSender { inner: sender }, ConnectionReceiver { inner: Arc::new(Mutex::new(receiver)) }))
}

/// Producer side of the queue.
#[derive(Debug)]
pub struct ConnectionSender<C> {
    inner: mpsc::Sender<C>,
}

/// Consumer side of the queue; clones share the same queue.
#[derive(Debug)]
pub struct ConnectionReceiver<C> {
    inner: Arc<Mutex<mpsc::Receiver<C>>>,
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("connection queue capacity must be greater than zero")]
    ZeroCapacity,
}

/// A push that did not enqueue; the connection is handed back.
#[derive(Error)]
pub enum PushError<C> {
    #[error("connection queue still full after {0:?}")]
    Full(Duration, C),

    #[error("connection queue has no consumers left")]
    Closed(C),
}

impl<C> PushError<C> {
    pub fn into_inner(self) -> C {
        match self {
            Self::Full(_, conn) | Self::Closed(conn) => conn,
        }
    }
}

impl<C> std::fmt::Debug for PushError<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full(timeout, _) => f.debug_tuple("Full").field(timeout).finish_non_exhaustive(),
            Self::Closed(_) => f.debug_tuple("Closed").finish_non_exhaustive(),
        }
    }
}

impl<C> ConnectionSender<C> {
    /// Enqueues `conn`, waiting at most `timeout` for a free slot.
    pub async fn push(&self, conn: C, timeout: Duration) -> Result<(), PushError<C>> {
        self.inner.send_timeout(conn, timeout).await.map_err(|e| match e {
            mpsc::error::SendTimeoutError::Timeout(conn) => PushError::Full(timeout, conn),
            mpsc::error::SendTimeoutError::Closed(conn) => PushError::Closed(conn),
        })
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.inner.capacity()
    }
}

impl<C> ConnectionReceiver<C> {
    /// Waits for the next connection.
    ///
    /// Returns `None` only once every sender is dropped and the queue is drained.
    pub async fn pop(&self) -> Option<C> {
        let mut receiver = self.inner.lock().await;
        receiver.recv().await
    }
}

impl<C> Clone for ConnectionReceiver<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}
