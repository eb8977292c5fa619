pub mod auth;
pub mod repos;
pub mod reviews;

use anyhow::{bail, Result};
use revdash_dashboard::{Dashboard, DashboardError};

/// Fail early with a useful hint instead of a disabled-query error
pub fn require_login(dashboard: &Dashboard) -> Result<()> {
    if !dashboard.auth_status().is_authenticated {
        bail!("Not signed in. Run 'revdash login' first");
    }
    Ok(())
}

/// Map a rejected session to the same hint
pub fn explain(e: DashboardError) -> anyhow::Error {
    if e.is_auth_rejection() {
        anyhow::anyhow!("Session expired. Run 'revdash login' to sign in again")
    } else {
        e.into()
    }
}
