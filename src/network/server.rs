//! TCP Server
//!
//! Accepts connections and spawns one handler thread per client. Sessions
//! are persistent, so connections get dedicated threads rather than slots in
//! a fixed pool; an idle client must not starve other clients or the
//! cluster's inter-node traffic.

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::bounded;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{CacheError, Result};
use crate::store::spawn_sweeper;

use super::Connection;

/// TCP server for an EmberKV node
pub struct Server {
    /// Server configuration
    config: Config,

    /// Shared command processor
    engine: Arc<Engine>,

    /// Shutdown flag, polled by the accept loop
    shutdown: Arc<AtomicBool>,

    /// Active connection count
    active_connections: Arc<AtomicUsize>,
}

impl Server {
    /// Create a new server with the given config and engine
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self {
            config,
            engine,
            shutdown: Arc::new(AtomicBool::new(false)),
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start the server (blocking).
    ///
    /// Binds the configured address, starts the expiration sweeper, then
    /// accepts connections until shutdown is signaled.
    pub fn run(&self) -> Result<()> {
        let listen_addr = self.config.listen_addr();
        let listener = TcpListener::bind(&listen_addr)
            .map_err(|e| CacheError::Network(format!("failed to bind to {listen_addr}: {e}")))?;

        // Non-blocking so the loop can observe the shutdown flag
        listener.set_nonblocking(true)?;

        tracing::info!(
            node_id = self.engine.node_id(),
            "listening on {listen_addr}"
        );

        // Sweeper stops when its channel disconnects at the end of run()
        let (sweep_tx, sweep_rx) = bounded::<()>(0);
        let sweeper = spawn_sweeper(
            self.engine.store(),
            Duration::from_secs(self.config.sweep_interval_secs),
            self.config.sweep_sample,
            sweep_rx,
        )?;

        let mut next_conn_id = 0usize;
        while !self.shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, addr)) => {
                    next_conn_id += 1;
                    self.spawn_connection(stream, addr, next_conn_id);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    if !self.shutdown.load(Ordering::Relaxed) {
                        tracing::error!("accept error: {e}");
                    }
                }
            }
        }

        drop(sweep_tx);
        if sweeper.join().is_err() {
            tracing::error!("sweeper thread panicked");
        }

        tracing::info!("server shutdown complete");
        Ok(())
    }

    fn spawn_connection(&self, stream: std::net::TcpStream, addr: std::net::SocketAddr, id: usize) {
        let engine = Arc::clone(&self.engine);
        let active = Arc::clone(&self.active_connections);

        let count = active.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(%addr, active = count, "accepted connection");

        let spawned = thread::Builder::new()
            .name(format!("emberkv-conn-{id}"))
            .spawn(move || {
                let result = Connection::new(stream, engine).and_then(|mut conn| conn.handle());
                if let Err(err) = result {
                    tracing::debug!(%addr, "connection ended with error: {err}");
                } else {
                    tracing::debug!(%addr, "connection closed");
                }
                active.fetch_sub(1, Ordering::Relaxed);
            });

        if let Err(err) = spawned {
            tracing::error!("failed to spawn connection thread: {err}");
            self.active_connections.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Signal the server to shut down gracefully
    pub fn shutdown(&self) {
        tracing::info!("shutdown signal received");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Check if the server is still accepting connections
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Relaxed)
    }

    /// Get the number of active connections
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }
}
