// ABOUTME: Revdash API gateway: every backend call goes through one credentialed HTTP client
// ABOUTME: Normalizes failures into ApiError and expires the session when the backend rejects it

pub mod endpoints;
pub mod gateway;

pub use gateway::ApiGateway;
