//! TTL Tests
//!
//! Expiration is observed consistently: a key past its deadline is absent on
//! any read or existence check and is removed on observation.

use std::thread::sleep;
use std::time::Duration;

use emberkv::store::Store;

#[test]
fn test_zero_ttl_never_expires() {
    let mut store = Store::new(10);

    store.put("k", "v", 0);
    sleep(Duration::from_millis(1100));

    assert_eq!(store.get("k"), Some("v".to_string()));
}

#[test]
fn test_expired_key_is_a_miss() {
    let mut store = Store::new(10);

    store.put("k1", "v1", 1);
    assert_eq!(store.get("k1"), Some("v1".to_string()));

    sleep(Duration::from_millis(1100));

    assert_eq!(store.get("k1"), None);
    assert!(!store.exists("k1"));
    assert_eq!(store.len(), 0);
}

#[test]
fn test_expired_key_is_removed_on_observation() {
    let mut store = Store::new(10);

    store.put("k1", "v1", 1);
    sleep(Duration::from_millis(1100));

    // exists observes and removes; nothing left for delete
    assert!(!store.exists("k1"));
    assert!(!store.delete("k1"));
    assert!(store.is_empty());
}

#[test]
fn test_delete_of_expired_key_reports_absent() {
    let mut store = Store::new(10);

    store.put("k1", "v1", 1);
    sleep(Duration::from_millis(1100));

    assert!(!store.delete("k1"));
    assert_eq!(store.stats().expirations, 1);
}

#[test]
fn test_overwrite_resets_ttl() {
    let mut store = Store::new(10);

    store.put("k", "v1", 1);
    store.put("k", "v2", 3600);

    sleep(Duration::from_millis(1100));

    assert_eq!(store.get("k"), Some("v2".to_string()));
}

#[test]
fn test_overwrite_can_remove_ttl() {
    let mut store = Store::new(10);

    store.put("k", "v1", 1);
    store.put("k", "v2", 0);

    sleep(Duration::from_millis(1100));

    assert_eq!(store.get("k"), Some("v2".to_string()));
}

#[test]
fn test_mixed_ttls_expire_independently() {
    let mut store = Store::new(10);

    store.put("short", "v", 1);
    store.put("long", "v", 3600);
    store.put("forever", "v", 0);

    sleep(Duration::from_millis(1100));

    assert!(!store.exists("short"));
    assert!(store.exists("long"));
    assert!(store.exists("forever"));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_sweep_collects_idle_expired_entries() {
    let mut store = Store::new(100);

    for i in 0..10 {
        store.put(&format!("short{i}"), "v", 1);
    }
    store.put("keeper", "v", 0);

    sleep(Duration::from_millis(1100));

    // Entries are never touched again; sweeping still collects them
    let mut removed = 0;
    for _ in 0..10 {
        removed += store.sweep(4);
    }

    assert_eq!(removed, 10);
    assert_eq!(store.len(), 1);
    assert!(store.exists("keeper"));
}
