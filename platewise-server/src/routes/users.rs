use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use platewise_core::{CreateUserRequest, User};

use super::ApiJson;
use crate::error::ServiceError;
use crate::AppState;

pub(super) fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/users", get(list).post(create))
}

async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, ServiceError> {
    Ok(Json(state.catalog.list_users().await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ServiceError> {
    let user = state.catalog.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
