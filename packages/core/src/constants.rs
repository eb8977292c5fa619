// ABOUTME: Backend routes, durable storage keys, and protocol constants
// ABOUTME: Single place for every path and key the client shares with the backend

/// Default backend base URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default route the OAuth provider redirects to
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3737/auth/callback";

/// Route the client lands on after the callback flow finishes
pub const LANDING_ROUTE: &str = "/";

// Durable storage keys (written together, cleared together)
pub const TOKEN_STORAGE_KEY: &str = "auth_token";
pub const USER_STORAGE_KEY: &str = "user_data";

// GitHub OAuth
pub const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const GITHUB_OAUTH_SCOPE: &str = "read:user user:email repo";

// Backend routes
pub const OAUTH_CALLBACK_PATH: &str = "/api/auth/github/callback";
pub const CURRENT_USER_PATH: &str = "/api/auth/me";
pub const USER_REPOSITORIES_PATH: &str = "/api/auth/repositories";
pub const USER_REVIEWS_PATH: &str = "/api/auth/reviews";
pub const USER_DASHBOARD_PATH: &str = "/api/auth/dashboard";
pub const SYNC_REPOS_PATH: &str = "/api/auth/sync-repos";
pub const REVIEWS_PATH: &str = "/api/reviews/";
pub const HEALTH_PATH: &str = "/api/health";

/// Number of reviews per page of the review list
pub const REVIEW_PAGE_SIZE: u32 = 20;

/// HTTP status the backend uses to reject a session
pub const AUTH_REJECTION_STATUS: u16 = 401;
