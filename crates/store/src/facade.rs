//! # Store Facade — orchestrates engine + cache + WAL.
//!
//! The single entry point every request handler goes through. Ordering is
//! deliberate: engine commit, then cache update, then WAL append. This is
//! *not* the usual log-ahead discipline — see `Store::put` for why that
//! ordering is kept rather than flipped.

use std::collections::BTreeMap;
use std::path::PathBuf;

use engine::{BatchOp, Engine};
use parking_lot::Mutex;
use thiserror::Error;

use crate::walrecord::{self, GrammarError};

/// The sentinel value `read` returns on a cache-and-engine miss.
pub const NOT_FOUND: &str = "Key not found";

/// Errors surfaced by the facade.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Bad input: empty key/value, mismatched batch lengths, a key that
    /// would make the WAL grammar ambiguous, `start > end` is NOT an error
    /// (it's defined to yield an empty range) but a missing endpoint is.
    #[error("validation error: {0}")]
    Validation(String),
    /// WAL append or engine commit failed.
    #[error("io error: {0}")]
    Io(#[from] anyhow::Error),
}

impl From<GrammarError> for StoreError {
    fn from(e: GrammarError) -> Self {
        StoreError::Validation(e.to_string())
    }
}

/// Orchestrates the engine, the hot cache, and the facade-level text WAL.
///
/// Owned for the life of the process and shared by every request handler
/// through an `Arc<Store>` in `server`'s application state.
pub struct Store {
    engine: Mutex<Engine>,
    cache: cache::HotCache,
    wal_path: PathBuf,
    wal_lock: Mutex<()>,
}

impl Store {
    /// Constructs a `Store` around an already-open, already-recovered
    /// engine. Use [`crate::open`] to build one end-to-end from
    /// [`config::Config`].
    pub fn new(engine: Engine, cache_capacity: usize, wal_path: PathBuf) -> Self {
        Self {
            engine: Mutex::new(engine),
            cache: cache::HotCache::new(cache_capacity),
            wal_path,
            wal_lock: Mutex::new(()),
        }
    }

    /// `put(k, v)`.
    ///
    /// 1. Commit to the engine.
    /// 2. Update the cache.
    /// 3. Append one `Add` record to the WAL.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        walrecord::validate_add_key(&key)?;
        walrecord::validate_value(&value)?;

        self.engine
            .lock()
            .set(key.clone(), value.clone())
            .map_err(StoreError::Io)?;

        self.cache.put(key.clone(), value.clone());

        walrecord::append_add(&self.wal_path, &self.wal_lock, &key, &value)
            .map_err(|e| StoreError::Io(e.into()))?;

        Ok(())
    }

    /// `batch_put(keys, values)`.
    ///
    /// Applies as a single atomic engine batch, then updates the cache for
    /// every pair, then appends one `Add` record per pair in a single WAL
    /// append call, preserving input order.
    pub fn batch_put(&self, keys: Vec<Vec<u8>>, values: Vec<Vec<u8>>) -> Result<(), StoreError> {
        if keys.len() != values.len() {
            return Err(StoreError::Validation(
                "keys and values must be lists of the same length".into(),
            ));
        }
        if keys.is_empty() {
            return Err(StoreError::Validation("batch must not be empty".into()));
        }
        for (key, value) in keys.iter().zip(values.iter()) {
            walrecord::validate_add_key(key)?;
            walrecord::validate_value(value)?;
        }

        let pairs: Vec<(Vec<u8>, Vec<u8>)> = keys.into_iter().zip(values).collect();

        let ops: Vec<BatchOp> = pairs
            .iter()
            .map(|(k, v)| BatchOp::Put {
                key: k.clone(),
                value: v.clone(),
            })
            .collect();
        self.engine.lock().batch(ops).map_err(StoreError::Io)?;

        for (key, value) in &pairs {
            self.cache.put(key.clone(), value.clone());
        }

        walrecord::append_adds(&self.wal_path, &self.wal_lock, &pairs)
            .map_err(|e| StoreError::Io(e.into()))?;

        Ok(())
    }

    /// `read(k)`. Cache lookup first; on miss, engine lookup and
    /// cache fill. Never touches the WAL. Returns the live value, or the
    /// [`NOT_FOUND`] sentinel on a full miss.
    pub fn read(&self, key: &[u8]) -> Result<String, StoreError> {
        if let Some(value) = self.cache.get(key) {
            return Ok(decode(value));
        }

        let found = self.engine.lock().get(key).map_err(StoreError::Io)?;
        match found {
            Some((_seq, value)) => {
                self.cache.put(key.to_vec(), value.clone());
                Ok(decode(value))
            }
            None => Ok(NOT_FOUND.to_string()),
        }
    }

    /// `read_range(start, end)`. Inclusive on both ends. If
    /// `start > end` lexicographically, the result is empty rather than an
    /// error. The cache is neither consulted nor populated.
    pub fn read_range(&self, start: &[u8], end: &[u8]) -> Result<BTreeMap<String, String>, StoreError> {
        if start > end {
            return Ok(BTreeMap::new());
        }

        let engine = self.engine.lock();
        let iter = engine.iterate(start).map_err(StoreError::Io)?;

        let mut result = BTreeMap::new();
        for (key, value) in iter {
            if key.as_slice() > end {
                break;
            }
            result.insert(decode(key), decode(value));
        }
        Ok(result)
    }

    /// `delete(k)`. Engine delete, then cache evict, then append
    /// one `Remove` record. Idempotent at the engine level.
    pub fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        walrecord::validate_remove_key(key)?;

        self.engine.lock().del(key.to_vec()).map_err(StoreError::Io)?;
        self.cache.remove(key);

        walrecord::append_remove(&self.wal_path, &self.wal_lock, key)
            .map_err(|e| StoreError::Io(e.into()))?;

        Ok(())
    }

    /// Direct engine access for [`crate::recovery`] — recovery runs before
    /// the facade accepts traffic, so it bypasses `put`/`delete`'s
    /// validation and WAL/cache side effects and replays straight into the
    /// engine.
    pub(crate) fn engine_mut(&self) -> parking_lot::MutexGuard<'_, Engine> {
        self.engine.lock()
    }

    /// Path to the facade-level text WAL, for [`crate::recovery`].
    pub(crate) fn wal_path(&self) -> &std::path::Path {
        &self.wal_path
    }
}

fn decode(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
