// ABOUTME: Configuration package for Revdash
// ABOUTME: Environment variable names plus the typed client configuration built from them

pub mod config;
pub mod constants;

pub use config::{ClientConfig, ConfigError, ConfigResult};
