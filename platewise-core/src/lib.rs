//! Core domain model for platewise.
//!
//! Everything here is pure: records, request payloads, validation and the
//! rating arithmetic. Persistence and HTTP live in `platewise-server`.

pub mod category;
pub mod error;
pub mod ids;
pub mod rating;
pub mod restaurant;
pub mod review;
pub mod stats;
pub mod user;

pub use category::*;
pub use error::ValidationError;
pub use ids::*;
pub use rating::*;
pub use restaurant::*;
pub use review::*;
pub use stats::Stats;
pub use user::*;
