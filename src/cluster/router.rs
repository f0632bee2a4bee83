//! Outbound cluster router
//!
//! Maintains one persistent TCP connection per peer, opened on first use and
//! replaced transparently after an I/O error. A per-peer mutex serializes
//! requests so exactly one is in flight per connection. Replication order on
//! a shard therefore matches apply order on its primary.
//!
//! Forwarded commands go out in their client form; only `replicate` produces
//! `REPL_*` lines. The router never sends to the local node.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{CacheError, Result};
use crate::protocol::{encode_command, parse_response, Command, Response};
use super::{NodeId, Topology};

/// Outbound client for the other cluster nodes
pub struct Router {
    node_id: NodeId,
    topology: Arc<Topology>,
    timeout: Duration,
    peers: Mutex<HashMap<NodeId, Arc<Mutex<Peer>>>>,
}

impl Router {
    pub fn new(node_id: NodeId, topology: Arc<Topology>, timeout: Duration) -> Self {
        Self {
            node_id,
            topology,
            timeout,
            peers: Mutex::new(HashMap::new()),
        }
    }

    /// Relay a client command, unchanged, to the primary for its key and
    /// return the primary's response verbatim.
    pub fn forward_to_primary(&self, command: &Command) -> Result<Response> {
        let key = command
            .key()
            .ok_or_else(|| CacheError::Protocol("command has no key to route".to_string()))?;
        let primary = self.topology.primary_for(key);
        debug_assert_ne!(primary, self.node_id);

        tracing::debug!(node = primary, kind = ?command.kind(), key, "forwarding to primary");
        let reply = self.call(primary, &encode_command(command))?;
        parse_response(&reply)
    }

    /// Mirror an applied write to the replica for its key, awaiting the
    /// one-line acknowledgement. Non-write commands are ignored.
    pub fn replicate(&self, command: &Command) -> Result<()> {
        let repl = match command {
            Command::Put { key, value, ttl } => Command::ReplPut {
                key: key.clone(),
                value: value.clone(),
                ttl: *ttl,
            },
            Command::Delete { key } => Command::ReplDelete { key: key.clone() },
            _ => return Ok(()),
        };

        let key = match repl.key() {
            Some(key) => key,
            None => return Ok(()),
        };
        let replica = self.topology.replica_for(key);
        debug_assert_ne!(replica, self.node_id);

        tracing::debug!(node = replica, kind = ?repl.kind(), key, "replicating");
        let reply = self.call(replica, &encode_command(&repl))?;
        match parse_response(&reply)? {
            Response::Ok(_) => Ok(()),
            Response::Error(message) => Err(CacheError::Network(format!(
                "replica {replica} rejected write: {message}"
            ))),
        }
    }

    /// Send one line to a peer and read one response line, serialized per peer.
    fn call(&self, node: NodeId, line: &str) -> Result<String> {
        let peer = self.peer(node)?;
        let mut guard = peer.lock();
        guard.call(line)
    }

    fn peer(&self, node: NodeId) -> Result<Arc<Mutex<Peer>>> {
        let mut peers = self.peers.lock();
        if let Some(peer) = peers.get(&node) {
            return Ok(Arc::clone(peer));
        }

        let (host, port) = self.topology.addr_of(node)?.clone();
        let peer = Arc::new(Mutex::new(Peer::new(node, host, port, self.timeout)));
        peers.insert(node, Arc::clone(&peer));
        Ok(peer)
    }
}

/// One outbound connection, reopened on demand after failures
struct Peer {
    node: NodeId,
    host: String,
    port: u16,
    timeout: Duration,
    conn: Option<BufReader<TcpStream>>,
}

impl Peer {
    fn new(node: NodeId, host: String, port: u16, timeout: Duration) -> Self {
        Self {
            node,
            host,
            port,
            timeout,
            conn: None,
        }
    }

    fn call(&mut self, line: &str) -> Result<String> {
        if self.conn.is_none() {
            self.conn = Some(self.connect()?);
        }

        match self.exchange(line) {
            Ok(reply) => Ok(reply),
            Err(err) => {
                // Connection state is unknown after any I/O failure
                self.conn = None;
                tracing::debug!(node = self.node, "dropping peer connection: {err}");
                Err(err.into())
            }
        }
    }

    fn exchange(&mut self, line: &str) -> io::Result<String> {
        let reader = match self.conn.as_mut() {
            Some(reader) => reader,
            None => return Err(io::Error::new(io::ErrorKind::NotConnected, "no peer connection")),
        };

        reader.get_mut().write_all(line.as_bytes())?;
        reader.get_mut().flush()?;

        let mut reply = String::new();
        let n = reader.read_line(&mut reply)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "peer closed connection",
            ));
        }
        Ok(reply)
    }

    fn connect(&self) -> Result<BufReader<TcpStream>> {
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                CacheError::Network(format!("cannot resolve {}:{}", self.host, self.port))
            })?;

        let stream = TcpStream::connect_timeout(&addr, self.timeout)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        tracing::debug!(node = self.node, %addr, "opened peer connection");
        Ok(BufReader::new(stream))
    }
}
