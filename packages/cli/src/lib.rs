// ABOUTME: Shared pieces of the revdash terminal client
// ABOUTME: Log setup, table rendering, live-view refresh tracking, and terminal navigation

pub mod logging;
pub mod navigator;
pub mod output;
pub mod watch;

pub use navigator::TerminalNavigator;
pub use watch::RefreshTracker;
