// ABOUTME: Typed wrappers for the backend routes the dashboard reads and writes
// ABOUTME: User-scoped routes rely on the gateway attaching the bearer token

use revdash_core::{
    constants::{
        HEALTH_PATH, REVIEWS_PATH, SYNC_REPOS_PATH, USER_DASHBOARD_PATH, USER_REPOSITORIES_PATH,
        USER_REVIEWS_PATH,
    },
    ApiResult, DashboardStats, HealthStatus, Repository, Review, ReviewFilter, ReviewPage,
    ReviewUpdate, SyncReport,
};
use tracing::info;

use crate::gateway::ApiGateway;

impl ApiGateway {
    pub async fn user_repositories(&self) -> ApiResult<Vec<Repository>> {
        self.get(USER_REPOSITORIES_PATH).await
    }

    pub async fn user_reviews(&self) -> ApiResult<Vec<Review>> {
        self.get(USER_REVIEWS_PATH).await
    }

    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        self.get(USER_DASHBOARD_PATH).await
    }

    /// Import the user's GitHub repositories into the backend
    pub async fn sync_repositories(&self) -> ApiResult<SyncReport> {
        info!("Starting repository sync");
        let report: SyncReport = self.post(SYNC_REPOS_PATH).await?;
        info!(
            "Repository sync finished: {} ({} repositories)",
            report.message,
            report.repositories.len()
        );
        Ok(report)
    }

    pub async fn list_reviews(&self, filter: &ReviewFilter) -> ApiResult<ReviewPage> {
        self.get_with_query(REVIEWS_PATH, &filter.query_pairs()).await
    }

    pub async fn update_review(&self, id: i64, update: &ReviewUpdate) -> ApiResult<Review> {
        self.put(&format!("{}{}", REVIEWS_PATH, id), update).await
    }

    pub async fn health(&self) -> ApiResult<HealthStatus> {
        self.get(HEALTH_PATH).await
    }
}
