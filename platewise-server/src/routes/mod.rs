//! JSON API under `/api`.
//!
//! Handlers are thin: they extract, call a service and serialize. Every
//! failure goes through [`ServiceError`]'s `IntoResponse`, so clients always
//! see `{"error": "..."}`.

mod categories;
mod restaurants;
mod reviews;
mod stats;
mod users;

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::{async_trait, Json, Router};
use platewise_core::ValidationError;
use serde::de::DeserializeOwned;

use crate::error::ServiceError;
use crate::AppState;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(restaurants::router())
        .merge(reviews::router())
        .merge(users::router())
        .merge(categories::router())
        .merge(stats::router())
}

fn malformed(text: String) -> ServiceError {
    ValidationError::Malformed(text).into()
}

/// `Json` whose rejection is a 400 in the API's error shape.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| malformed(e.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// A numeric row id from the path.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: PathRejection| malformed(e.body_text()))?;
        Ok(ApiPath(value))
    }
}

pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| malformed(e.body_text()))?;
        Ok(ApiQuery(value))
    }
}
