//! # WAL record grammar — the facade-level, human-readable write-ahead log.
//!
//! Distinct from `wal`, which is the LSM engine's own internal binary
//! durability log. This is the text WAL the [`Store` facade](crate::Store)
//! appends to on every accepted mutation, and the only thing
//! [`recovery`](crate::recovery) ever replays.
//!
//! ## Grammar
//!
//! ```text
//! Add == <key> <value>\n
//! Remove == <key>\n
//! ```
//!
//! `Add` splits on the *first* space after the `==` delimiter, so the value
//! may itself contain spaces and runs to the end of the line. There is no
//! checksum, length prefix, or sequence number — just ordered, appended
//! lines.
//!
//! This grammar is ambiguous if a key contains the literal substring
//! `" == "`, an embedded newline, or (for `Add` records) a space — any of
//! those would make the line un-split back into the original key. This
//! module rejects such keys/values at the boundary rather than writing a
//! line recovery could silently mis-parse.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use parking_lot::Mutex;
use thiserror::Error;

/// Keys/values that would make a WAL line ambiguous to re-parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("key must not be empty")]
    EmptyKey,
    #[error("value must not be empty")]
    EmptyValue,
    #[error("key must not contain an embedded newline")]
    KeyHasNewline,
    #[error("value must not contain an embedded newline")]
    ValueHasNewline,
    #[error("key must not contain the WAL delimiter \" == \"")]
    KeyHasDelimiter,
    #[error("key must not contain a space")]
    KeyHasSpace,
}

/// Validates a key destined for an `Add` record (stricter: no spaces either,
/// since the grammar splits key/value on the first space).
pub fn validate_add_key(key: &[u8]) -> Result<(), GrammarError> {
    if key.is_empty() {
        return Err(GrammarError::EmptyKey);
    }
    if key.contains(&b'\n') || key.contains(&b'\r') {
        return Err(GrammarError::KeyHasNewline);
    }
    if contains_delimiter(key) {
        return Err(GrammarError::KeyHasDelimiter);
    }
    if key.contains(&b' ') {
        return Err(GrammarError::KeyHasSpace);
    }
    Ok(())
}

/// Validates a key destined for a `Remove` record (spaces are fine — the
/// whole remainder of the line is the key).
pub fn validate_remove_key(key: &[u8]) -> Result<(), GrammarError> {
    if key.is_empty() {
        return Err(GrammarError::EmptyKey);
    }
    if key.contains(&b'\n') || key.contains(&b'\r') {
        return Err(GrammarError::KeyHasNewline);
    }
    if contains_delimiter(key) {
        return Err(GrammarError::KeyHasDelimiter);
    }
    Ok(())
}

/// Validates a value destined for an `Add` record.
pub fn validate_value(value: &[u8]) -> Result<(), GrammarError> {
    if value.is_empty() {
        return Err(GrammarError::EmptyValue);
    }
    if value.contains(&b'\n') || value.contains(&b'\r') {
        return Err(GrammarError::ValueHasNewline);
    }
    Ok(())
}

fn contains_delimiter(bytes: &[u8]) -> bool {
    bytes.windows(4).any(|w| w == b" == ")
}

/// Appends one `Add` record. Opens the WAL in append mode, writes the line,
/// flushes, and `fsync`s before returning so the mutation is durable on disk
/// before the caller is acknowledged.
pub fn append_add(path: &Path, lock: &Mutex<()>, key: &[u8], value: &[u8]) -> std::io::Result<()> {
    let _guard = lock.lock();
    let mut line = Vec::with_capacity(key.len() + value.len() + 8);
    line.extend_from_slice(b"Add == ");
    line.extend_from_slice(key);
    line.push(b' ');
    line.extend_from_slice(value);
    line.push(b'\n');
    append_bytes(path, &line)
}

/// Appends one `Remove` record.
pub fn append_remove(path: &Path, lock: &Mutex<()>, key: &[u8]) -> std::io::Result<()> {
    let _guard = lock.lock();
    let mut line = Vec::with_capacity(key.len() + 12);
    line.extend_from_slice(b"Remove == ");
    line.extend_from_slice(key);
    line.push(b'\n');
    append_bytes(path, &line)
}

/// Appends one `Add` record per pair in a **single** append call, preserving
/// input order.
pub fn append_adds(path: &Path, lock: &Mutex<()>, pairs: &[(Vec<u8>, Vec<u8>)]) -> std::io::Result<()> {
    let _guard = lock.lock();
    let mut buf = Vec::new();
    for (key, value) in pairs {
        buf.extend_from_slice(b"Add == ");
        buf.extend_from_slice(key);
        buf.push(b' ');
        buf.extend_from_slice(value);
        buf.push(b'\n');
    }
    append_bytes(path, &buf)
}

fn append_bytes(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests;
