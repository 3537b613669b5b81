pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod repository;
pub mod routes;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use aggregator::RatingAggregator;
pub use catalog::CatalogService;
pub use config::Config;
pub use error::ServiceError;
pub use lifecycle::{DeletePolicy, ReviewService};
pub use repository::{InMemoryRepository, RepositoryError, SqliteRepository, Store};

pub fn get_version() -> String {
    // Release builds may stamp a git hash; otherwise use the crate version.
    match option_env!("PLATEWISE_GIT_HASH") {
        Some(git_hash) if git_hash.len() >= 8 => git_hash[..8].to_string(),
        Some(git_hash) if !git_hash.is_empty() => git_hash.to_string(),
        _ => env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Shared handler state. The store handle is injected, never global.
pub struct AppState {
    pub catalog: CatalogService,
    pub reviews: ReviewService,
    pub aggregator: Arc<RatingAggregator>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, delete_policy: DeletePolicy) -> Self {
        let aggregator = Arc::new(RatingAggregator::new(store.clone()));
        Self {
            catalog: CatalogService::new(store.clone()),
            reviews: ReviewService::new(store, aggregator.clone(), delete_policy),
            aggregator,
        }
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "platewise",
        "version": get_version(),
    }))
}

/// The complete HTTP application.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(routes::api_router())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
