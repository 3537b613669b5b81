use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use platewise_core::{
    CreateRestaurantRequest, Restaurant, RestaurantFilter, RestaurantId, UpdateRestaurantRequest,
};
use serde_json::{json, Value};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::catalog::RestaurantDetail;
use crate::error::ServiceError;
use crate::AppState;

pub(super) fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/restaurants", get(list).post(create))
        .route(
            "/api/restaurants/:id",
            get(show).put(update).delete(remove),
        )
}

async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<RestaurantFilter>,
) -> Result<Json<Vec<Restaurant>>, ServiceError> {
    Ok(Json(state.catalog.list_restaurants(&filter).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateRestaurantRequest>,
) -> Result<(StatusCode, Json<Restaurant>), ServiceError> {
    let restaurant = state.catalog.create_restaurant(request).await?;
    Ok((StatusCode::CREATED, Json(restaurant)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<RestaurantDetail>, ServiceError> {
    Ok(Json(state.catalog.get_restaurant(RestaurantId(id)).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateRestaurantRequest>,
) -> Result<Json<Restaurant>, ServiceError> {
    Ok(Json(
        state
            .catalog
            .update_restaurant(RestaurantId(id), request)
            .await?,
    ))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ServiceError> {
    state.catalog.delete_restaurant(RestaurantId(id)).await?;
    Ok(Json(json!({ "message": "Restaurant deleted successfully" })))
}
