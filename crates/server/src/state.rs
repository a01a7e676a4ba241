//! Shared application state handed to every route handler.

use std::sync::Arc;

use store::{Replicator, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub replicator: Arc<Replicator>,
}
