//! Routing Tests
//!
//! End-to-end cluster behavior over real TCP: forwarding, synchronous
//! replication, delete propagation, replica write rejection, and degraded
//! operation with a dead peer.

use std::thread::sleep;
use std::time::Duration;

use crate::TestCluster;

#[test]
fn test_write_is_forwarded_and_replicated() {
    let cluster = TestCluster::start();

    // Shard owned by node 3 and mirrored on node 2; the client talks to
    // node 1, which is neither for this shard.
    let key = cluster.key_for(3);
    assert_eq!(cluster.topology.replica_for(&key), 2);

    let mut c1 = cluster.client(1);
    assert_eq!(c1.send(&format!("PUT {key} red")), "OK stored");

    // Primary and replica both answer from their local copies
    let mut c3 = cluster.client(3);
    assert_eq!(c3.send(&format!("GET {key}")), "OK red");
    let mut c2 = cluster.client(2);
    assert_eq!(c2.send(&format!("GET {key}")), "OK red");

    // Node 1 forwards the read to the primary
    assert_eq!(c1.send(&format!("GET {key}")), "OK red");
    assert_eq!(c1.send(&format!("EXISTS {key}")), "OK 1");
}

#[test]
fn test_writes_converge_from_any_entry_node() {
    let cluster = TestCluster::start();
    let key = cluster.key_for(1); // primary 1, replica 3

    for entry_node in 1..=3 {
        let value = format!("v{entry_node}");
        let mut client = cluster.client(entry_node);
        assert_eq!(client.send(&format!("PUT {key} {value}")), "OK stored");

        let mut c1 = cluster.client(1);
        assert_eq!(c1.send(&format!("GET {key}")), format!("OK {value}"));
        let mut c3 = cluster.client(3);
        assert_eq!(c3.send(&format!("GET {key}")), format!("OK {value}"));
    }
}

#[test]
fn test_delete_propagates_to_replica() {
    let cluster = TestCluster::start();
    let key = cluster.key_for(3); // primary 3, replica 2

    let mut c1 = cluster.client(1);
    assert_eq!(c1.send(&format!("PUT {key} red")), "OK stored");

    // Delete submitted to a non-primary node
    let mut c2 = cluster.client(2);
    assert_eq!(c2.send(&format!("DELETE {key}")), "OK deleted");

    assert_eq!(c2.send(&format!("EXISTS {key}")), "OK 0");
    let mut c3 = cluster.client(3);
    assert_eq!(c3.send(&format!("EXISTS {key}")), "OK 0");
}

#[test]
fn test_replica_rejects_repl_for_foreign_shard() {
    let cluster = TestCluster::start();

    // Shard (2,1): node 3 is neither primary nor replica
    let key = cluster.key_neither(3);
    let mut c3 = cluster.client(3);
    assert_eq!(
        c3.send(&format!("REPL_PUT {key} v")),
        "ERROR not a replica for this key"
    );
    assert_eq!(
        c3.send(&format!("REPL_DELETE {key}")),
        "ERROR not a replica for this key"
    );
}

#[test]
fn test_client_write_to_replica_is_forwarded_not_applied() {
    let cluster = TestCluster::start();
    let key = cluster.key_for(2); // primary 2, replica 1

    // Client writes via the replica; the forward still lands on the primary
    let mut c1 = cluster.client(1);
    assert_eq!(c1.send(&format!("PUT {key} v")), "OK stored");

    let mut c2 = cluster.client(2);
    assert_eq!(c2.send(&format!("GET {key}")), "OK v");
}

#[test]
fn test_replication_does_not_cascade() {
    let cluster = TestCluster::start();
    let key = cluster.key_for(3); // primary 3, replica 2

    // Inject replication traffic straight at the replica
    let mut c2 = cluster.client(2);
    assert_eq!(c2.send(&format!("REPL_PUT {key} sneaky")), "OK stored");

    // The replica applied it locally and sent nothing onward: the primary
    // has no copy.
    let mut c3 = cluster.client(3);
    assert_eq!(c3.send(&format!("GET {key}")), "ERROR key not found");
    assert_eq!(c2.send(&format!("GET {key}")), "OK sneaky");
}

#[test]
fn test_repl_delete_of_absent_key_acknowledges() {
    let cluster = TestCluster::start();
    let key = cluster.key_for(3);

    let mut c2 = cluster.client(2);
    assert_eq!(c2.send(&format!("REPL_DELETE {key}")), "OK deleted");
}

#[test]
fn test_ttl_expires_on_primary_and_replica() {
    let cluster = TestCluster::start();
    let key = cluster.key_for(2); // primary 2, replica 1

    let mut c3 = cluster.client(3);
    assert_eq!(c3.send(&format!("PUT {key} v 1")), "OK stored");

    let mut c2 = cluster.client(2);
    assert_eq!(c2.send(&format!("GET {key}")), "OK v");

    sleep(Duration::from_secs(2));

    assert_eq!(c2.send(&format!("GET {key}")), "ERROR key not found");
    let mut c1 = cluster.client(1);
    assert_eq!(c1.send(&format!("EXISTS {key}")), "OK 0");
}

#[test]
fn test_forward_to_dead_primary_reports_upstream_unavailable() {
    // Node 3 never answers; forwards to it time out
    let cluster = TestCluster::start_nodes(&[1, 2]);
    let key = cluster.key_for(3);

    let mut c1 = cluster.client(1);
    assert_eq!(
        c1.send(&format!("PUT {key} v")),
        "ERROR upstream unavailable"
    );

    // The connection survives the failed forward; a write owned by node 1
    // itself still succeeds (its replication to dead node 3 only logs)
    let probe = cluster.key_for(1);
    assert_eq!(c1.send(&format!("PUT {probe} v")), "OK stored");
    assert_eq!(c1.send(&format!("GET {probe}")), "OK v");
}

#[test]
fn test_primary_write_succeeds_with_dead_replica() {
    // Shard (2,1): primary node 2 up, replica node 1 down
    let cluster = TestCluster::start_nodes(&[2, 3]);
    let key = cluster.key_for(2);

    let mut c2 = cluster.client(2);
    // Replication fails and is logged; the client still gets success
    assert_eq!(c2.send(&format!("PUT {key} v")), "OK stored");
    assert_eq!(c2.send(&format!("GET {key}")), "OK v");
}
