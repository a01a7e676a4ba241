//! # Config — environment-sourced process configuration
//!
//! Centralizes the handful of environment variables that govern where the
//! engine, the facade-level WAL, and replication live. Loaded once at
//! startup into a plain struct and passed down by value/reference, rather
//! than read ad hoc with `std::env::var` scattered across crates.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `STORAGE_FILE` | `/data/kvstore.db` | Directory backing the engine's SSTables/manifest. |
//! | `WAL_FILE` | `/data/kvstore.wal` | Path to the facade-level, human-readable WAL. |
//! | `CACHE_SIZE` | `1000` | LRU hot-cache capacity, in entries. |
//! | `REPLICAS` | `""` | Comma-separated `host:port` peer list. |
//!
//! A few additional knobs tune engine internals treated as a black box at
//! this layer (flush threshold, WAL fsync mode, L0 compaction trigger). They
//! default to the values the engine itself already used and rarely need to
//! be touched.

use std::env;

/// Fully resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory housing the engine's SSTables, manifest, and internal WAL.
    pub storage_dir: String,
    /// Path to the facade-level text WAL.
    pub wal_file: String,
    /// LRU hot-cache capacity, in entries.
    pub cache_size: usize,
    /// Trimmed, non-empty `host:port` peer endpoints.
    pub replicas: Vec<String>,
    /// Memtable byte-size threshold that triggers an engine flush.
    pub flush_threshold_bytes: usize,
    /// If `true`, every engine-internal WAL append calls `fsync`.
    pub wal_sync: bool,
    /// Number of L0 SSTables that triggers automatic compaction (`0` disables it).
    pub l0_compaction_trigger: usize,
    /// `host:port` the HTTP server binds to.
    pub bind_addr: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Splits `REPLICAS` on commas, trims whitespace, and drops empty entries.
///
/// A trailing comma or stray whitespace in `REPLICAS` must not produce a
/// malformed peer URL.
fn parse_replicas(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    /// Loads configuration from the process environment, falling back to
    /// documented defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let cache_size = env_or("CACHE_SIZE", "1000")
            .parse()
            .unwrap_or(cache::DEFAULT_CAPACITY);
        let flush_kb: usize = env_or("KV_FLUSH_KB", "1024").parse().unwrap_or(1024);
        let wal_sync: bool = env_or("KV_WAL_SYNC", "true").parse().unwrap_or(true);
        let l0_compaction_trigger: usize = env_or("KV_L0_TRIGGER", "4").parse().unwrap_or(4);

        Self {
            storage_dir: env_or("STORAGE_FILE", "/data/kvstore.db"),
            wal_file: env_or("WAL_FILE", "/data/kvstore.wal"),
            cache_size,
            replicas: parse_replicas(&env_or("REPLICAS", "")),
            flush_threshold_bytes: flush_kb * 1024,
            wal_sync,
            l0_compaction_trigger,
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
        }
    }
}

#[cfg(test)]
mod tests;
