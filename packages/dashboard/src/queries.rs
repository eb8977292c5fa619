// ABOUTME: Typed dashboard reads and writes on top of the query cache
// ABOUTME: User-scoped reads only run while signed in; review edits are applied optimistically

use std::future::Future;

use revdash_api::ApiGateway;
use revdash_core::{
    merge_object, ApiError, ApiResult, DashboardStats, HealthStatus, Repository, Review,
    ReviewFilter, ReviewPage, ReviewUpdate, SyncReport,
};
use revdash_query::{decode, fetcher, Fetcher, QueryKey, QueryOptions, QuerySubscription};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::{dashboard::Dashboard, error::DashboardResult, keys};

/// Fetcher that runs `call` against the gateway and caches the JSON form of its result
fn gateway_fetcher<T, F, Fut>(gateway: &ApiGateway, call: F) -> Fetcher
where
    T: Serialize,
    F: Fn(ApiGateway) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<T>> + Send + 'static,
{
    let gateway = gateway.clone();
    fetcher(move || {
        let request = call(gateway.clone());
        async move {
            let data = request.await?;
            serde_json::to_value(data).map_err(|e| ApiError::protocol(e.to_string()))
        }
    })
}

/// Apply `update` to every cached review with `id` in a review page
fn patch_review_page(page: &Value, id: i64, update: &Value) -> Option<Value> {
    let items = page.get("items")?.as_array()?;
    if !items.iter().any(|item| item.get("id") == Some(&Value::from(id))) {
        return None;
    }

    let patched: Vec<Value> = items
        .iter()
        .map(|item| {
            if item.get("id") == Some(&Value::from(id)) {
                merge_object(item, update)
            } else {
                item.clone()
            }
        })
        .collect();
    Some(merge_object(page, &serde_json::json!({ "items": patched })))
}

impl Dashboard {
    /// One page of reviews
    pub async fn reviews(&self, filter: &ReviewFilter) -> DashboardResult<ReviewPage> {
        let options = self.policy().reviews(false);
        self.read(keys::reviews(filter), options, self.reviews_fetcher(filter))
            .await
    }

    /// Live review page; with `auto_refresh` it re-reads on the poll interval
    pub fn watch_reviews(&self, filter: &ReviewFilter, auto_refresh: bool) -> QuerySubscription {
        self.queries().watch(
            keys::reviews(filter),
            self.policy().reviews(auto_refresh),
            self.reviews_fetcher(filter),
        )
    }

    /// Update a review, showing the change in every cached page before the backend confirms it
    pub async fn update_review(&self, id: i64, update: ReviewUpdate) -> DashboardResult<Review> {
        let patch = serde_json::to_value(&update).map_err(|e| ApiError::protocol(e.to_string()))?;
        let gateway = self.gateway().clone();

        let review = self
            .queries()
            .mutate_optimistic(
                keys::REVIEWS,
                |page| patch_review_page(page, id, &patch),
                async move { gateway.update_review(id, &update).await },
            )
            .await?;
        info!("Updated review {} to {}", review.id, review.status);
        Ok(review)
    }

    pub async fn user_repositories(&self) -> DashboardResult<Vec<Repository>> {
        let options = self.user_scoped(&self.policy().user_repositories);
        let fetch =
            gateway_fetcher(self.gateway(), |gw| async move { gw.user_repositories().await });
        self.read(keys::user_repositories(), options, fetch).await
    }

    pub async fn user_reviews(&self) -> DashboardResult<Vec<Review>> {
        let options = self.user_scoped(&self.policy().user_reviews);
        let fetch = gateway_fetcher(self.gateway(), |gw| async move { gw.user_reviews().await });
        self.read(keys::user_reviews(), options, fetch).await
    }

    pub async fn user_stats(&self) -> DashboardResult<DashboardStats> {
        let options = self.user_scoped(&self.policy().user_stats);
        let fetch = gateway_fetcher(self.gateway(), |gw| async move { gw.dashboard_stats().await });
        self.read(keys::user_stats(), options, fetch).await
    }

    /// Import repositories from GitHub, then refresh everything derived from them
    pub async fn sync_repositories(&self) -> DashboardResult<SyncReport> {
        match self.queries().mutate(self.gateway().sync_repositories()).await {
            Ok(report) => {
                info!("Sync successful: {}", report.message);
                for scope in keys::SYNC_AFFECTED {
                    self.queries().invalidate_queries(scope).await;
                }
                Ok(report)
            }
            Err(e) => {
                match e.api_error() {
                    Some(api) => error!(
                        "Sync failed: status={} message={} body={:?}",
                        api.status(),
                        api.message(),
                        api.body()
                    ),
                    None => error!("Sync failed: {}", e),
                }
                Err(e.into())
            }
        }
    }

    /// Backend liveness; needs no session
    pub async fn system_health(&self) -> DashboardResult<HealthStatus> {
        let options = self.policy().system_health.clone();
        let fetch = gateway_fetcher(self.gateway(), |gw| async move { gw.health().await });
        self.read(keys::system_health(), options, fetch).await
    }

    fn reviews_fetcher(&self, filter: &ReviewFilter) -> Fetcher {
        let filter = filter.clone();
        gateway_fetcher(self.gateway(), move |gw| {
            let filter = filter.clone();
            async move { gw.list_reviews(&filter).await }
        })
    }

    fn user_scoped(&self, options: &QueryOptions) -> QueryOptions {
        options.clone().enabled(self.session().is_authenticated())
    }

    async fn read<T: DeserializeOwned>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetch: Fetcher,
    ) -> DashboardResult<T> {
        let data = self.queries().fetch_query(key, options, fetch).await?;
        Ok(decode(data)?)
    }
}
