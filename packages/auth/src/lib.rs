// ABOUTME: Revdash authentication library: session lifecycle and GitHub OAuth callback handling
// ABOUTME: Owns the only process-wide mutable resource, the session, and the single-flight code exchange

pub mod backend;
pub mod error;
pub mod oauth;
pub mod session;
pub mod storage;

// Re-export main types
pub use backend::{AuthBackend, HttpAuthBackend};
pub use error::{AuthError, AuthResult};
pub use oauth::{
    authorize_url, CallbackFlow, CallbackFlowOptions, CallbackListener, CallbackParams,
    CallbackServer, CallbackState, CodeExchanger, Navigator,
};
pub use session::{Session, SessionEvent, SessionStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
