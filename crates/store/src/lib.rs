//! # Store — the replicated, persistent key-value core.
//!
//! Wires the [`engine`] crate (the ordered-map engine), [`cache`]'s
//! [`HotCache`](cache::HotCache), this crate's own facade-level text WAL
//! ([`walrecord`]), the orchestrating [`Store`] ([`facade`]), startup
//! [`recovery`], and the [`replicator::Replicator`] into the core this
//! workspace's `server` binary sits in front of.

pub mod facade;
pub mod recovery;
pub mod replicator;
pub mod walrecord;

pub use facade::{Store, StoreError, NOT_FOUND};
pub use replicator::Replicator;

use std::path::PathBuf;

/// Builds a fully-recovered [`Store`] from a resolved [`config::Config`].
///
/// Opens the engine eagerly, rather than lazily on first use,
/// replays the facade-level WAL on top of it, and returns a store ready to
/// accept traffic. The engine is never exposed past this point except
/// through the facade — callers should not reach back into `engine`
/// directly (see `store::facade::Store::engine_mut`, which is
/// crate-private for exactly this reason).
pub fn open(cfg: &config::Config) -> anyhow::Result<Store> {
    let sst_dir = PathBuf::from(&cfg.storage_dir);
    let internal_wal_path = sst_dir.join("engine.wal");

    let mut engine = engine::Engine::new(
        &internal_wal_path,
        &sst_dir,
        cfg.flush_threshold_bytes,
        cfg.wal_sync,
    )?;
    engine.set_l0_compaction_trigger(cfg.l0_compaction_trigger);

    let store = Store::new(engine, cfg.cache_size, PathBuf::from(&cfg.wal_file));
    recovery::recover(&store)?;

    Ok(store)
}
