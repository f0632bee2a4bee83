//! # EmberKV
//!
//! A small distributed, in-memory key-value cache with:
//! - Per-key TTL expiration and bounded LRU eviction
//! - Line-oriented text protocol over persistent TCP connections
//! - Static three-node sharding with synchronous primary→replica mirroring
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (thread per client connection)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Engine                                  │
//! │     (serve locally / forward to primary / replicate)         │
//! └──────┬──────────────────────────────┬───────────────────────┘
//!        │                              │
//!        ▼                              ▼
//! ┌─────────────┐               ┌─────────────┐
//! │    Store    │               │   Router    │
//! │  (LRU+TTL)  │               │ (peer conns)│
//! └─────────────┘               └──────┬──────┘
//!                                      │
//!                                      ▼
//!                               ┌─────────────┐
//!                               │  Topology   │
//!                               │  (static)   │
//!                               └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod protocol;
pub mod cluster;
pub mod network;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CacheError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
