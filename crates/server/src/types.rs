//! Wire types for the HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /put`, `POST /delete` (key only), and each element of
/// `POST /batchput`'s array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
}

/// Body of `POST /delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub key: String,
}

/// Query string shared by every endpoint: `?replication=true` marks a
/// request as a replica delivery rather than an end-user request.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReplicationFlag {
    #[serde(default)]
    pub replication: bool,
}

/// Query string for `GET /readrange`.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeQuery {
    pub start_key: Option<String>,
    pub end_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueResponse {
    pub value: String,
}

pub type RangeResponse = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
