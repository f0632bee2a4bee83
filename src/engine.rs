//! Engine Module
//!
//! Coordinates the store, topology, and router behind a single
//! `execute(Command) -> Response` surface. Connection handlers call it for
//! every command; it decides whether to serve locally, forward to the
//! shard's primary, mirror to the shard's replica, or reject.
//!
//! ## Dispatch policy (cluster mode)
//! - GET / EXISTS: served locally when this node is primary or replica of
//!   the key's shard, forwarded to the primary otherwise.
//! - PUT / DELETE on the primary: applied locally, then mirrored to the
//!   replica. Replication failures are logged, never surfaced to the client.
//! - PUT / DELETE elsewhere: forwarded; the primary's response is relayed
//!   verbatim.
//! - REPL_PUT / REPL_DELETE: applied locally on the shard's replica and
//!   never forwarded; any other node rejects them.
//!
//! Standalone mode (`node_id == 0`) has no router and serves everything
//! locally.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cluster::{NodeId, Router, Topology};
use crate::config::Config;
use crate::error::Result;
use crate::protocol::{Command, Response};
use crate::store::Store;

struct Cluster {
    topology: Arc<Topology>,
    router: Router,
}

/// The per-node command processor
pub struct Engine {
    node_id: NodeId,
    store: Arc<Mutex<Store>>,
    cluster: Option<Cluster>,
}

impl Engine {
    /// Build a standalone engine: no router, no routing checks.
    pub fn standalone(config: &Config) -> Self {
        Self {
            node_id: 0,
            store: Arc::new(Mutex::new(Store::new(config.max_keys))),
            cluster: None,
        }
    }

    /// Build a clustered engine for `config.node_id`.
    ///
    /// Fails when the topology has no address for this node.
    pub fn clustered(config: &Config, topology: Arc<Topology>) -> Result<Self> {
        topology.addr_of(config.node_id)?;

        let router = Router::new(
            config.node_id,
            Arc::clone(&topology),
            Duration::from_millis(config.peer_timeout_ms),
        );
        Ok(Self {
            node_id: config.node_id,
            store: Arc::new(Mutex::new(Store::new(config.max_keys))),
            cluster: Some(Cluster { topology, router }),
        })
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Shared handle to the store, for the background sweeper.
    pub(crate) fn store(&self) -> Arc<Mutex<Store>> {
        Arc::clone(&self.store)
    }

    /// Execute one command and produce the response to write back.
    pub fn execute(&self, command: Command) -> Response {
        match &self.cluster {
            None => self.execute_local(command),
            Some(cluster) => self.execute_clustered(cluster, command),
        }
    }

    // =========================================================================
    // Local Execution
    // =========================================================================

    fn execute_local(&self, command: Command) -> Response {
        let mut store = self.store.lock();
        match command {
            Command::Put { key, value, ttl } | Command::ReplPut { key, value, ttl } => {
                store.put(&key, &value, ttl);
                Response::stored()
            }
            Command::Get { key } => match store.get(&key) {
                Some(value) => Response::value(value),
                None => Response::key_not_found(),
            },
            Command::Delete { key } => {
                if store.delete(&key) {
                    Response::deleted()
                } else {
                    Response::key_not_found()
                }
            }
            // A missing key on the mirror is already the requested state
            Command::ReplDelete { key } => {
                store.delete(&key);
                Response::deleted()
            }
            Command::Exists { key } => Response::exists(store.exists(&key)),
            Command::Quit => Response::bye(),
        }
    }

    // =========================================================================
    // Clustered Dispatch
    // =========================================================================

    fn execute_clustered(&self, cluster: &Cluster, command: Command) -> Response {
        match &command {
            Command::Get { key } | Command::Exists { key } => {
                let local = cluster.topology.is_primary(self.node_id, key)
                    || cluster.topology.is_replica(self.node_id, key);
                if local {
                    self.execute_local(command)
                } else {
                    self.forward(cluster, command)
                }
            }

            Command::Put { key, .. } | Command::Delete { key } => {
                if cluster.topology.is_primary(self.node_id, key) {
                    self.apply_and_replicate(cluster, command)
                } else {
                    self.forward(cluster, command)
                }
            }

            Command::ReplPut { key, .. } | Command::ReplDelete { key } => {
                if cluster.topology.is_replica(self.node_id, key) {
                    self.execute_local(command)
                } else {
                    Response::error("not a replica for this key")
                }
            }

            Command::Quit => Response::bye(),
        }
    }

    /// Primary write path: apply locally, then mirror synchronously.
    ///
    /// Replication is best-effort: a failure is logged and the client still
    /// sees the local result. Deletes that removed nothing do not replicate.
    fn apply_and_replicate(&self, cluster: &Cluster, command: Command) -> Response {
        let response = self.execute_local(command.clone());

        if response.is_ok() {
            if let Err(err) = cluster.router.replicate(&command) {
                tracing::warn!(
                    key = command.key().unwrap_or_default(),
                    "replication failed: {err}"
                );
            }
        }
        response
    }

    fn forward(&self, cluster: &Cluster, command: Command) -> Response {
        match cluster.router.forward_to_primary(&command) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(kind = ?command.kind(), "forward failed: {err}");
                Response::error("upstream unavailable")
            }
        }
    }
}
