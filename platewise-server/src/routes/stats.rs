use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use platewise_core::Stats;

use crate::error::ServiceError;
use crate::AppState;

pub(super) fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/stats", get(stats))
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<Stats>, ServiceError> {
    Ok(Json(state.catalog.stats().await?))
}
