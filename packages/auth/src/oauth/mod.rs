// ABOUTME: GitHub OAuth module: authorize URL, single-flight code exchange, and callback handling
// ABOUTME: Includes the callback state machine and a one-shot localhost listener for terminal logins

pub mod callback;
pub mod exchange;
pub mod login;
pub mod server;

pub use callback::{CallbackFlow, CallbackFlowOptions, CallbackParams, CallbackState, Navigator};
pub use exchange::CodeExchanger;
pub use login::authorize_url;
pub use server::{CallbackListener, CallbackServer};
