//! HTTP request adapter: wires the five routes onto a [`state::AppState`]
//! built around the core [`store::Store`].

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Builds the axum [`Router`] for the five-endpoint API. Shared by
/// `main.rs` and the integration tests so route wiring lives in one place.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/put", post(routes::put))
        .route("/read/:key", get(routes::read))
        .route("/readrange", get(routes::read_range))
        .route("/batchput", post(routes::batch_put))
        .route("/delete", post(routes::delete))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
