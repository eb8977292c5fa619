// ABOUTME: Navigator for a terminal session, where there is no page to move to
// ABOUTME: The command that ran the callback flow reports the outcome itself

use revdash_auth::Navigator;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: &str) {
        debug!("Flow finished; front end would navigate to {}", route);
    }
}
