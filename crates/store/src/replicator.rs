//! # Replicator — best-effort parallel HTTP fan-out.
//!
//! Modeled as a task-spawning primitive: each peer gets its own spawned
//! task, and no result channel is needed because the result is discarded
//! either way. The caller (the HTTP adapter in `server`) is never blocked
//! on this — `replicate` returns as soon as the tasks are spawned, not when
//! they complete.

use std::time::Duration;

use reqwest::Client;

const REPLICATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Fans a locally-accepted mutation out to every configured peer.
#[derive(Clone)]
pub struct Replicator {
    client: Client,
    peers: Vec<String>,
}

impl Replicator {
    /// Builds a replicator over the given (already trimmed/filtered) peer
    /// list. An empty list means replication is a no-op.
    pub fn new(peers: Vec<String>) -> Self {
        Self {
            client: Client::new(),
            peers,
        }
    }

    /// `true` if no peers are configured — callers can skip building a
    /// request body entirely in that case.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Spawns one fire-and-forget task per peer, POSTing `body` to
    /// `http://<peer>/<endpoint>?replication=true`. Errors, non-2xx
    /// responses, and timeouts are logged and otherwise swallowed — this
    /// never surfaces to the original caller.
    pub fn replicate(&self, endpoint: &str, body: serde_json::Value) {
        for peer in &self.peers {
            let client = self.client.clone();
            let peer = peer.clone();
            let endpoint = endpoint.to_string();
            let body = body.clone();

            tokio::spawn(async move {
                let url = format!("http://{peer}/{endpoint}?replication=true");
                tracing::info!(url = %url, "replicating");

                match client
                    .post(&url)
                    .json(&body)
                    .timeout(REPLICATION_TIMEOUT)
                    .send()
                    .await
                {
                    Ok(resp) if resp.status().is_success() => {
                        tracing::info!(peer = %peer, "replicated successfully");
                    }
                    Ok(resp) => {
                        tracing::warn!(peer = %peer, status = %resp.status(), "replication failed");
                    }
                    Err(e) => {
                        tracing::error!(peer = %peer, error = %e, "failed to replicate");
                    }
                }
            });
        }
    }
}
