//! The five HTTP endpoints. Each handler: decode the body/query,
//! dispatch the blocking [`store::Store`] call on a blocking-task pool,
//! then — on success, and only for requests that did not themselves arrive
//! tagged `replication=true` — fan the mutation out to configured peers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{
    DeleteRequest, KeyValuePair, MessageResponse, RangeQuery, RangeResponse, ReplicationFlag,
    StatusResponse, ValueResponse,
};

/// Runs a blocking `Store` call on the blocking-task pool so the async
/// accept loop is never held up by engine/filesystem work.
async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, store::StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Io(e.to_string()))?
        .map_err(ApiError::from)
}

pub async fn put(
    State(state): State<Arc<AppState>>,
    Query(flag): Query<ReplicationFlag>,
    body: Result<Json<KeyValuePair>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(pair) = body?;

    let store = state.store.clone();
    let key = pair.key.clone().into_bytes();
    let value = pair.value.clone().into_bytes();
    blocking(move || store.put(key, value)).await?;

    if !flag.replication && !state.replicator.is_empty() {
        state.replicator.replicate(
            "put",
            json!({"key": pair.key, "value": pair.value}),
        );
    }

    Ok(Json(StatusResponse {
        status: "OK".to_string(),
    }))
}

pub async fn read(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<ValueResponse>, ApiError> {
    let store = state.store.clone();
    let value = blocking(move || store.read(key.as_bytes())).await?;
    Ok(Json(ValueResponse { value }))
}

pub async fn read_range(
    State(state): State<Arc<AppState>>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<RangeResponse>, ApiError> {
    let start = range
        .start_key
        .ok_or_else(|| ApiError::Validation("start_key is required".to_string()))?;
    let end = range
        .end_key
        .ok_or_else(|| ApiError::Validation("end_key is required".to_string()))?;

    let store = state.store.clone();
    let result = blocking(move || store.read_range(start.as_bytes(), end.as_bytes())).await?;
    Ok(Json(result))
}

pub async fn batch_put(
    State(state): State<Arc<AppState>>,
    Query(flag): Query<ReplicationFlag>,
    body: Result<Json<Vec<KeyValuePair>>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(pairs) = body?;
    if pairs.is_empty() {
        return Err(ApiError::Validation("batch must not be empty".to_string()));
    }

    let keys: Vec<Vec<u8>> = pairs.iter().map(|p| p.key.clone().into_bytes()).collect();
    let values: Vec<Vec<u8>> = pairs.iter().map(|p| p.value.clone().into_bytes()).collect();

    let store = state.store.clone();
    blocking(move || store.batch_put(keys, values)).await?;

    if !flag.replication && !state.replicator.is_empty() {
        let body: Vec<_> = pairs
            .iter()
            .map(|p| json!({"key": p.key, "value": p.value}))
            .collect();
        state.replicator.replicate("batchput", json!(body));
    }

    Ok(Json(MessageResponse {
        message: "OK".to_string(),
    }))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Query(flag): Query<ReplicationFlag>,
    body: Result<Json<DeleteRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = body?;

    let store = state.store.clone();
    let key = req.key.clone().into_bytes();
    blocking(move || store.delete(&key)).await?;

    if !flag.replication && !state.replicator.is_empty() {
        state.replicator.replicate("delete", json!({"key": req.key}));
    }

    Ok(Json(StatusResponse {
        status: "OK".to_string(),
    }))
}
