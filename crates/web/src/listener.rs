//! Accept loop feeding the connection queue.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::queue::{ConnectionSender, PushError};

/// Connections seen by a [`Listener`] since it was bound.
#[derive(Debug, Default)]
pub struct ListenerStats {
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl ListenerStats {
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Connections closed unserved because the queue stayed full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// A bound TCP listener, not yet accepting.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    stats: Arc<ListenerStats>,
}

impl Listener {
    pub async fn bind(address: SocketAddr) -> io::Result<Self> {
        let inner = TcpListener::bind(address).await?;
        Ok(Self { inner, stats: Arc::default() })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts forever, pushing every connection onto the queue.
    ///
    /// A push that does not find a slot within `enqueue_timeout` closes the
    /// connection without a response. Returns only if every queue consumer is gone.
    pub async fn run(self, queue: ConnectionSender<TcpStream>, enqueue_timeout: Duration) {
        if let Ok(address) = self.inner.local_addr() {
            info!(%address, "start listening");
        }

        loop {
            let (tcp_stream, remote_addr) = match self.inner.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };
            self.stats.accepted.fetch_add(1, Ordering::Relaxed);
            debug!(%remote_addr, "accepted connection");

            match queue.push(tcp_stream, enqueue_timeout).await {
                Ok(()) => {}
                Err(PushError::Full(timeout, mut tcp_stream)) => {
                    let dropped = self.stats.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(%remote_addr, ?timeout, dropped, "queue full, dropping connection");
                    if let Err(e) = tcp_stream.shutdown().await {
                        debug!(%remote_addr, cause = %e, "shutdown of dropped connection failed");
                    }
                }
                Err(PushError::Closed(_)) => {
                    warn!("connection queue closed, stop accepting");
                    return;
                }
            }
        }
    }
}
