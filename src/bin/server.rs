//! Elevator Server Binary
//!
//! Starts the TCP server for Elevator.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use elevator::config::WalSyncStrategy;
use elevator::network::Server;
use elevator::Config;
use tracing_subscriber::{fmt, EnvFilter};

/// Elevator Server
#[derive(Parser, Debug)]
#[command(name = "elevator-server")]
#[command(about = "Multi-database key-value server")]
#[command(version)]
struct Args {
    /// Root directory for databases created by bare name
    #[arg(short = 'd', long, default_value = "./elevator_data")]
    storage_path: PathBuf,

    /// Registry file (defaults to <storage-path>/databases.json)
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:4141")]
    listen: String,

    /// Worker pool size
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Idle-database reaper period in minutes (0 disables it)
    #[arg(long, default_value = "15")]
    majordome_interval: u64,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Shared credential clients must send in meta "auth"
    #[arg(long)]
    secret: Option<String>,

    /// fsync the WAL every N writes (0 or 1 syncs every write)
    #[arg(long, default_value = "100")]
    wal_sync_every: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,elevator=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Elevator Server v{}", elevator::VERSION);
    tracing::info!("Storage path: {}", args.storage_path.display());
    tracing::info!("Listen address: {}", args.listen);

    let majordome_interval = match args.majordome_interval {
        0 => None,
        minutes => Some(Duration::from_secs(minutes * 60)),
    };
    let wal_sync_strategy = match args.wal_sync_every {
        0 | 1 => WalSyncStrategy::EveryWrite,
        count => WalSyncStrategy::EveryNEntries { count },
    };

    // Build config from args
    let mut builder = Config::builder()
        .storage_path(&args.storage_path)
        .listen_addr(&args.listen)
        .workers(args.workers)
        .majordome_interval(majordome_interval)
        .max_connections(args.max_connections)
        .secret(args.secret.as_deref())
        .wal_sync_strategy(wal_sync_strategy);
    if let Some(registry) = &args.registry {
        builder = builder.registry_path(registry);
    }
    let config = builder.build();

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
