//! Static cluster topology
//!
//! Every node knows the whole table: which node is primary and which is
//! replica for each shard, and where each node listens. Nothing here changes
//! after startup; there is no discovery, membership, or failover.
//!
//! Shard selection hashes the key and reduces modulo the shard count. The
//! standard hasher is deterministic for a given build, and every node of a
//! statically deployed cluster runs the same binary, so all nodes agree on
//! shard placement.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::env;
use std::hash::{Hash, Hasher};

use crate::error::{CacheError, Result};

/// Node identifier; valid cluster nodes are numbered from 1
pub type NodeId = u32;

/// Immutable cluster layout
#[derive(Debug, Clone)]
pub struct Topology {
    /// Per-shard (primary, replica) pairs, indexed by shard id
    shards: Vec<(NodeId, NodeId)>,

    /// Node id to (host, port)
    nodes: HashMap<NodeId, (String, u16)>,
}

impl Topology {
    /// Build and validate a topology.
    ///
    /// Every shard needs distinct primary and replica nodes, and every node
    /// referenced by a shard needs an address.
    pub fn new(
        shards: Vec<(NodeId, NodeId)>,
        nodes: HashMap<NodeId, (String, u16)>,
    ) -> Result<Self> {
        if shards.is_empty() {
            return Err(CacheError::Topology("no shards defined".to_string()));
        }

        for (shard, &(primary, replica)) in shards.iter().enumerate() {
            if primary == replica {
                return Err(CacheError::Topology(format!(
                    "shard {shard}: primary and replica are both node {primary}"
                )));
            }
            for node in [primary, replica] {
                if !nodes.contains_key(&node) {
                    return Err(CacheError::Topology(format!(
                        "shard {shard} references node {node}, which has no address"
                    )));
                }
            }
        }

        Ok(Self { shards, nodes })
    }

    /// The built-in three-node reference layout: shard 0 → (1,3),
    /// shard 1 → (2,1), shard 2 → (3,2), nodes on ports 5001..=5003.
    ///
    /// Hostnames are `localhost` unless `KV_CACHE_DOCKER=true`, in which case
    /// the container names `kv-node-N` are used.
    pub fn reference() -> Self {
        let docker = env::var("KV_CACHE_DOCKER")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let host = |n: NodeId| {
            if docker {
                format!("kv-node-{n}")
            } else {
                "localhost".to_string()
            }
        };

        Self {
            shards: vec![(1, 3), (2, 1), (3, 2)],
            nodes: HashMap::from([
                (1, (host(1), 5001)),
                (2, (host(2), 5002)),
                (3, (host(3), 5003)),
            ]),
        }
    }

    // =========================================================================
    // Pure Lookups
    // =========================================================================

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// The shard owning a key
    pub fn shard_of(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    /// The node holding the authoritative copy of a key's shard
    pub fn primary_for(&self, key: &str) -> NodeId {
        self.shards[self.shard_of(key)].0
    }

    /// The node mirroring a key's shard
    pub fn replica_for(&self, key: &str) -> NodeId {
        self.shards[self.shard_of(key)].1
    }

    pub fn is_primary(&self, node: NodeId, key: &str) -> bool {
        self.primary_for(key) == node
    }

    pub fn is_replica(&self, node: NodeId, key: &str) -> bool {
        self.replica_for(key) == node
    }

    /// Address of a node; a miss is a configuration error.
    pub fn addr_of(&self, node: NodeId) -> Result<&(String, u16)> {
        self.nodes
            .get(&node)
            .ok_or_else(|| CacheError::Topology(format!("unknown node id: {node}")))
    }
}
