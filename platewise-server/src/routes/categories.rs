use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use platewise_core::{Category, CreateCategoryRequest};

use super::ApiJson;
use crate::error::ServiceError;
use crate::AppState;

pub(super) fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/categories", get(list).post(create))
}

async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Category>>, ServiceError> {
    Ok(Json(state.catalog.list_categories().await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ServiceError> {
    let category = state.catalog.create_category(request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}
