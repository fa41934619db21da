use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use formfill_core::Capabilities;

use crate::state::AppState;

/// Report which extraction backends this process found at startup, so the
/// extension can hide modes the server cannot honor.
pub async fn capabilities(State(state): State<Arc<AppState>>) -> Json<Capabilities> {
    Json(state.engine.capabilities(state.default_mode))
}
