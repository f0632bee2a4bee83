//! EmberKV Server Binary
//!
//! Starts one cache node, standalone or as a member of the built-in
//! three-node cluster.

use std::env;
use std::sync::Arc;

use clap::Parser;
use emberkv::cluster::Topology;
use emberkv::network::Server;
use emberkv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// EmberKV Server
#[derive(Parser, Debug)]
#[command(name = "emberkv-server")]
#[command(about = "Distributed in-memory key-value cache node")]
#[command(version)]
struct Args {
    /// Node identity: 1..N joins the built-in cluster, 0 runs standalone
    #[arg(short, long)]
    node_id: Option<u32>,

    /// Listening TCP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind host
    #[arg(long)]
    host: Option<String>,

    /// Cache capacity in keys
    #[arg(short, long)]
    max_keys: Option<usize>,

    /// Seconds between background expiration sweeps
    #[arg(long)]
    sweep_interval: Option<u64>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,emberkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    // Environment supplies defaults; explicit flags win
    let mut config = Config::from_env();
    let port_given = args.port.is_some() || env::var("PORT").is_ok();
    if let Some(node_id) = args.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(max_keys) = args.max_keys {
        config.max_keys = max_keys;
    }
    if let Some(secs) = args.sweep_interval {
        config.sweep_interval_secs = secs;
    }

    tracing::info!("EmberKV node v{}", emberkv::VERSION);

    let engine = if config.is_standalone() {
        tracing::info!("standalone mode, capacity {} keys", config.max_keys);
        Engine::standalone(&config)
    } else {
        let topology = Arc::new(Topology::reference());

        // Without an explicit port, bind where the topology expects this node
        if !port_given {
            match topology.addr_of(config.node_id) {
                Ok(&(_, port)) => config.port = port,
                Err(e) => {
                    tracing::error!("topology lookup failed: {e}");
                    std::process::exit(2);
                }
            }
        }

        tracing::info!(
            node_id = config.node_id,
            "cluster mode, {} shards, capacity {} keys",
            topology.num_shards(),
            config.max_keys
        );

        match Engine::clustered(&config, topology) {
            Ok(engine) => engine,
            Err(e) => {
                tracing::error!("cluster setup failed: {e}");
                std::process::exit(2);
            }
        }
    };

    let server = Arc::new(Server::new(config, Arc::new(engine)));

    let handle = Arc::clone(&server);
    if let Err(e) = ctrlc::set_handler(move || handle.shutdown()) {
        tracing::warn!("failed to install signal handler: {e}");
    }

    if let Err(e) = server.run() {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
