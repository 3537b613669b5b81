//! Service-level errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use platewise_core::ValidationError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Storage(RepositoryError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            RepositoryError::Conflict(message) => ServiceError::Conflict(message),
            other => ServiceError::Storage(other),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServiceError::Storage(e) => {
                // Storage details stay in the logs.
                error!("Storage failure: {}", e);
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_map_to_service_errors() {
        let err: ServiceError = RepositoryError::NotFound {
            entity: "review",
            id: 7,
        }
        .into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        insta::assert_snapshot!(err.to_string(), @"review 7 not found");

        let err: ServiceError = RepositoryError::Conflict("category already exists".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ServiceError = RepositoryError::storage("list_reviews", "disk I/O error").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        insta::assert_snapshot!(
            err.to_string(),
            @"storage failure during list_reviews: disk I/O error"
        );

        let err: ServiceError = RepositoryError::corruption("review 3").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err = ServiceError::from(ValidationError::RatingOutOfRange(6));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
