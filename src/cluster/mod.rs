//! Cluster Module
//!
//! Static sharding and inter-node communication.
//!
//! ## Architecture
//! - `Topology` is an immutable table fixed at startup: shard → (primary,
//!   replica) and node → address. Lookups are pure and lock-free.
//! - `Router` holds one lazily-opened outbound connection per peer, with a
//!   per-peer mutex enforcing a single in-flight request at a time. It
//!   forwards client writes to a shard's primary and mirrors applied writes
//!   to the shard's replica.

mod topology;
mod router;

pub use topology::{NodeId, Topology};
pub use router::Router;
