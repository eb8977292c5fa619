// ABOUTME: Core types, error model, and shared constants for Revdash
// ABOUTME: Foundational package describing the backend contract used by every other package

pub mod constants;
pub mod error;
pub mod types;
pub mod utils;

// Re-export main types
pub use error::{ApiError, ApiResult};
pub use types::{
    DashboardStats, HealthStatus, OAuthCallbackResponse, Repository, Review, ReviewFilter,
    ReviewPage, ReviewStatus, ReviewUpdate, SyncReport, User,
};

// Re-export utilities
pub use utils::{code_preview, merge_object};
