//! Configuration for EmberKV
//!
//! Centralized configuration with sensible defaults. Every value can also be
//! supplied through the environment (`NODE_ID`, `PORT`, `MAX_KEYS`, ...).

use std::env;

/// Main configuration for an EmberKV node
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Cluster Configuration
    // -------------------------------------------------------------------------
    /// Node identity: 1..N selects cluster mode, 0 selects standalone
    pub node_id: u32,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP bind host
    pub host: String,

    /// TCP listen port
    pub port: u16,

    /// Peer connect/read timeout (milliseconds)
    pub peer_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Maximum number of keys before LRU eviction
    pub max_keys: usize,

    /// Seconds between background expiration sweeps
    pub sweep_interval_secs: u64,

    /// Maximum entries examined per sweep tick
    pub sweep_sample: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: 0,
            host: "0.0.0.0".to_string(),
            port: 7171,
            peer_timeout_ms: 3000,
            max_keys: 10_000,
            sweep_interval_secs: 60,
            sweep_sample: 20,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// Recognized variables: `NODE_ID`, `PORT`, `MAX_KEYS`, `KV_CACHE_HOST`,
    /// `KV_CACHE_PEER_TIMEOUT_MS`, `KV_CACHE_SWEEP_INTERVAL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            node_id: env_parse("NODE_ID", defaults.node_id),
            host: env::var("KV_CACHE_HOST").unwrap_or(defaults.host),
            port: env_parse("PORT", defaults.port),
            peer_timeout_ms: env_parse("KV_CACHE_PEER_TIMEOUT_MS", defaults.peer_timeout_ms),
            max_keys: env_parse("MAX_KEYS", defaults.max_keys),
            sweep_interval_secs: env_parse("KV_CACHE_SWEEP_INTERVAL", defaults.sweep_interval_secs),
            sweep_sample: defaults.sweep_sample,
        }
    }

    /// The `host:port` string the server binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when this node runs without a cluster
    pub fn is_standalone(&self) -> bool {
        self.node_id == 0
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn node_id(mut self, node_id: u32) -> Self {
        self.config.node_id = node_id;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn peer_timeout_ms(mut self, ms: u64) -> Self {
        self.config.peer_timeout_ms = ms;
        self
    }

    pub fn max_keys(mut self, max_keys: usize) -> Self {
        self.config.max_keys = max_keys;
        self
    }

    pub fn sweep_interval_secs(mut self, secs: u64) -> Self {
        self.config.sweep_interval_secs = secs;
        self
    }

    pub fn sweep_sample(mut self, sample: usize) -> Self {
        self.config.sweep_sample = sample;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
