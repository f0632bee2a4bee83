//! Cluster test suite
//!
//! Spins up real nodes on loopback ports and drives them over TCP, so the
//! routing, forwarding, and replication paths are exercised end to end.

mod routing_tests;

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use emberkv::cluster::{NodeId, Topology};
use emberkv::network::Server;
use emberkv::{Config, Engine};

/// Grab a free loopback port
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// An in-process cluster using the reference shard layout on test ports
pub struct TestCluster {
    pub topology: Arc<Topology>,
    pub ports: HashMap<NodeId, u16>,
    servers: Vec<Arc<Server>>,
    /// Bound-but-never-accepting listeners standing in for absent nodes, so
    /// their ports cannot be claimed by anything else mid-test
    _parked: Vec<TcpListener>,
}

impl TestCluster {
    /// Start all three nodes
    pub fn start() -> Self {
        Self::start_nodes(&[1, 2, 3])
    }

    /// Start a subset of the three nodes; the topology still names all
    /// three, so traffic to an absent node fails like a hung peer.
    pub fn start_nodes(ids: &[NodeId]) -> Self {
        let ports: HashMap<NodeId, u16> = (1..=3).map(|id| (id, free_port())).collect();
        let addrs = ports
            .iter()
            .map(|(&id, &port)| (id, ("127.0.0.1".to_string(), port)))
            .collect();
        let topology =
            Arc::new(Topology::new(vec![(1, 3), (2, 1), (3, 2)], addrs).unwrap());

        let parked = (1..=3)
            .filter(|id| !ids.contains(id))
            .map(|id| TcpListener::bind(("127.0.0.1", ports[&id])).unwrap())
            .collect();

        let mut servers = Vec::new();
        for &id in ids {
            let config = Config::builder()
                .node_id(id)
                .host("127.0.0.1")
                .port(ports[&id])
                .max_keys(1000)
                .peer_timeout_ms(1000)
                .sweep_interval_secs(60)
                .build();
            let engine = Engine::clustered(&config, Arc::clone(&topology)).unwrap();
            let server = Arc::new(Server::new(config, Arc::new(engine)));

            let runner = Arc::clone(&server);
            thread::spawn(move || {
                let _ = runner.run();
            });
            servers.push(server);
        }

        let cluster = Self {
            topology,
            ports,
            servers,
            _parked: parked,
        };

        // Wait until every started node accepts connections
        for &id in ids {
            drop(cluster.client(id));
        }
        cluster
    }

    pub fn client(&self, node: NodeId) -> TestClient {
        TestClient::connect(self.ports[&node])
    }

    /// A key whose shard is owned by `primary`
    pub fn key_for(&self, primary: NodeId) -> String {
        (0..)
            .map(|i| format!("key-{primary}-{i}"))
            .find(|k| self.topology.primary_for(k) == primary)
            .unwrap()
    }

    /// A key whose shard `node` neither owns nor mirrors
    pub fn key_neither(&self, node: NodeId) -> String {
        (0..)
            .map(|i| format!("far-{node}-{i}"))
            .find(|k| {
                !self.topology.is_primary(node, k) && !self.topology.is_replica(node, k)
            })
            .unwrap()
    }
}

impl Drop for TestCluster {
    fn drop(&mut self) {
        for server in &self.servers {
            server.shutdown();
        }
    }
}

/// One persistent client connection speaking the line protocol
pub struct TestClient {
    reader: BufReader<TcpStream>,
}

impl TestClient {
    pub fn connect(port: u16) -> Self {
        let addr = format!("127.0.0.1:{port}");
        for _ in 0..50 {
            if let Ok(stream) = TcpStream::connect(&addr) {
                stream
                    .set_read_timeout(Some(Duration::from_secs(5)))
                    .unwrap();
                stream.set_nodelay(true).unwrap();
                return Self {
                    reader: BufReader::new(stream),
                };
            }
            thread::sleep(Duration::from_millis(50));
        }
        panic!("could not connect to {addr}");
    }

    /// Send one command line, return the one-line response without its newline
    pub fn send(&mut self, line: &str) -> String {
        let stream = self.reader.get_mut();
        stream.write_all(format!("{line}\n").as_bytes()).unwrap();
        stream.flush().unwrap();

        let mut reply = String::new();
        self.reader.read_line(&mut reply).unwrap();
        reply.trim_end().to_string()
    }
}
