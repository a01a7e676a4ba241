//! # Recovery — replays the facade-level WAL on top of the engine.
//!
//! Runs once, synchronously, before the HTTP server starts accepting
//! traffic: the engine opens eagerly and has already recovered its own
//! internal state by the time this runs, so this only replays the
//! *external* text WAL on top of it. The cache is never pre-warmed here.

use std::io::BufRead;

use crate::Store;

/// Replays `store`'s WAL file into its engine, if the file exists.
///
/// Malformed lines are logged and skipped; WAL action lines other than
/// `Add`/`Remove` are logged and skipped. Any I/O or engine error is
/// propagated to the caller instead.
pub fn recover(store: &Store) -> anyhow::Result<()> {
    let wal_path = store.wal_path();
    if !wal_path.exists() {
        tracing::info!(path = %wal_path.display(), "no WAL file found, skipping recovery");
        return Ok(());
    }

    let file = std::fs::File::open(wal_path)?;
    let reader = std::io::BufReader::new(file);

    let mut engine = store.engine_mut();
    let mut applied = 0u64;

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim_end_matches(['\n', '\r']);

        let mut parts = trimmed.splitn(2, " == ");
        let (action, rest) = match (parts.next(), parts.next()) {
            (Some(action), Some(rest)) => (action, rest),
            _ => {
                tracing::warn!(line = %trimmed, "skipping malformed WAL entry");
                continue;
            }
        };

        match action {
            "Add" => {
                let mut kv = rest.splitn(2, ' ');
                match (kv.next(), kv.next()) {
                    (Some(key), Some(value)) => {
                        engine.set(key.as_bytes().to_vec(), value.as_bytes().to_vec())?;
                        applied += 1;
                    }
                    _ => {
                        tracing::warn!(line = %trimmed, "skipping malformed Add entry");
                    }
                }
            }
            "Remove" => {
                let key = rest.trim();
                engine.del(key.as_bytes().to_vec())?;
                applied += 1;
            }
            other => {
                tracing::warn!(action = %other, "unknown WAL action, skipping");
            }
        }
    }

    tracing::info!(applied, "successfully recovered from WAL");
    Ok(())
}
