use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use platewise_core::{CreateReviewRequest, RestaurantId, Review, ReviewId, UpdateReviewRequest};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::error::ServiceError;
use crate::AppState;

pub(super) fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/reviews", get(list).post(create))
        .route("/api/reviews/:id", get(show).put(update).delete(remove))
        .route("/api/reviews/:id/helpful", patch(helpful))
}

#[derive(Debug, Default, Deserialize)]
struct ReviewQuery {
    #[serde(alias = "restaurantId")]
    restaurant_id: Option<i64>,
}

async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Json<Vec<Review>>, ServiceError> {
    let reviews = state
        .reviews
        .list(query.restaurant_id.map(RestaurantId))
        .await?;
    Ok(Json(reviews))
}

async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ServiceError> {
    let review = state.reviews.create(request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Review>, ServiceError> {
    Ok(Json(state.reviews.get(ReviewId(id)).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateReviewRequest>,
) -> Result<Json<Review>, ServiceError> {
    Ok(Json(state.reviews.update(ReviewId(id), request).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ServiceError> {
    state.reviews.delete(ReviewId(id)).await?;
    Ok(Json(json!({ "message": "Review deleted successfully" })))
}

async fn helpful(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ServiceError> {
    let helpful = state.reviews.mark_helpful(ReviewId(id)).await?;
    Ok(Json(json!({ "helpful": helpful })))
}
