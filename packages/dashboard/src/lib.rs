// ABOUTME: Revdash dashboard: wires session, gateway, and query cache into one client
// ABOUTME: Auth bootstrap, typed data queries, review mutations, and cache reset when the session ends

pub mod dashboard;
pub mod error;
pub mod keys;
pub mod policy;
pub mod queries;

pub use dashboard::{AuthStatus, Dashboard};
pub use error::{DashboardError, DashboardResult};
pub use policy::QueryPolicy;
