// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Revdash

// Backend
pub const REVDASH_API_URL: &str = "REVDASH_API_URL";
pub const REVDASH_HTTP_TIMEOUT_SECS: &str = "REVDASH_HTTP_TIMEOUT_SECS";

// GitHub OAuth
pub const REVDASH_GITHUB_CLIENT_ID: &str = "REVDASH_GITHUB_CLIENT_ID";
pub const REVDASH_REDIRECT_URI: &str = "REVDASH_REDIRECT_URI";

// Callback flow timing
pub const REVDASH_REDIRECT_DELAY_MS: &str = "REVDASH_REDIRECT_DELAY_MS";
pub const REVDASH_SETTLE_DELAY_MS: &str = "REVDASH_SETTLE_DELAY_MS";

// Durable session storage
pub const REVDASH_STORAGE_DIR: &str = "REVDASH_STORAGE_DIR";

// Background polling
pub const REVDASH_POLL_INTERVAL_SECS: &str = "REVDASH_POLL_INTERVAL_SECS";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";
