use std::net::IpAddr;
use std::time::Duration;

use clap::Parser;
use dispatch_http::protocol::buffer::DEFAULT_BUFFER_CAPACITY;
use dispatch_http::protocol::limits::{DEFAULT_MAX_HEADERS, DEFAULT_MAX_PATH_LEN};
use dispatch_http::protocol::RequestLimits;
use dispatch_web::queue::DEFAULT_QUEUE_CAPACITY;
use dispatch_web::worker::{DEFAULT_PACING_DELAY, DEFAULT_WORKERS};
use dispatch_web::{Server, ServerConfig, DEFAULT_ENQUEUE_TIMEOUT, DEFAULT_PORT};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "dispatch-server")]
#[command(about = "Serves a static page through a bounded queue and a fixed worker pool", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, env = "DISPATCH_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    #[arg(short, long, env = "DISPATCH_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Number of request workers
    #[arg(short, long, env = "DISPATCH_WORKERS", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Connections that may wait for a free worker
    #[arg(long, env = "DISPATCH_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// How long an accepted connection may wait for a queue slot, in milliseconds
    #[arg(long, env = "DISPATCH_ENQUEUE_TIMEOUT_MS", default_value_t = millis(DEFAULT_ENQUEUE_TIMEOUT))]
    enqueue_timeout_ms: u64,

    /// Pause before a worker reads a dequeued connection, in milliseconds
    #[arg(long, env = "DISPATCH_PACING_DELAY_MS", default_value_t = millis(DEFAULT_PACING_DELAY))]
    pacing_delay_ms: u64,

    /// Request buffer size in bytes
    #[arg(long, env = "DISPATCH_BUFFER_CAPACITY", default_value_t = DEFAULT_BUFFER_CAPACITY)]
    buffer_capacity: usize,

    #[arg(long, env = "DISPATCH_MAX_HEADERS", default_value_t = DEFAULT_MAX_HEADERS)]
    max_headers: usize,

    #[arg(long, env = "DISPATCH_MAX_PATH_LEN", default_value_t = DEFAULT_MAX_PATH_LEN)]
    max_path_len: usize,

    #[arg(long, env = "DISPATCH_LOG_LEVEL", default_value_t = Level::INFO)]
    log_level: Level,
}

const fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            port: self.port,
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            enqueue_timeout: Duration::from_millis(self.enqueue_timeout_ms),
            pacing_delay: Duration::from_millis(self.pacing_delay_ms),
            limits: RequestLimits {
                buffer_capacity: self.buffer_capacity,
                max_headers: self.max_headers,
                max_path_len: self.max_path_len,
            },
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(args.log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }

    let result = match Server::builder().config(args.server_config()).build() {
        Ok(server) => server.start().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!(cause = %e, "server exited");
        std::process::exit(1);
    }
}
