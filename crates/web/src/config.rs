use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use dispatch_http::protocol::RequestLimits;

use crate::queue::DEFAULT_QUEUE_CAPACITY;
use crate::router::{DEFAULT_MAX_PATTERN_LEN, DEFAULT_ROUTE_CAPACITY};
use crate::worker::{DEFAULT_PACING_DELAY, DEFAULT_WORKERS, WorkerOptions};

pub const DEFAULT_PORT: u16 = 80;

/// How long the listener waits for a queue slot before dropping a connection.
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_millis(10);

/// Everything a [`Server`](crate::Server) needs to know before it starts.
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub workers: usize,
    pub queue_capacity: usize,
    pub enqueue_timeout: Duration,
    pub pacing_delay: Duration,
    pub limits: RequestLimits,
    pub route_capacity: usize,
    pub max_pattern_len: usize,
}

impl ServerConfig {
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn worker_options(&self) -> WorkerOptions {
        WorkerOptions { pacing_delay: self.pacing_delay, limits: self.limits }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
            pacing_delay: DEFAULT_PACING_DELAY,
            limits: RequestLimits::default(),
            route_capacity: DEFAULT_ROUTE_CAPACITY,
            max_pattern_len: DEFAULT_MAX_PATTERN_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();

        assert_eq!(config.address(), "0.0.0.0:80".parse::<SocketAddr>().unwrap());
        assert_eq!(config.workers, 2);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.enqueue_timeout, Duration::from_millis(10));
        assert_eq!(config.worker_options().pacing_delay, Duration::from_millis(50));
        assert_eq!(config.limits.buffer_capacity, 1024);
        assert_eq!(config.limits.max_headers, 16);
        assert_eq!(config.limits.max_path_len, 32);
    }
}
