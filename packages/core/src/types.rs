// ABOUTME: Backend data model shared by the gateway, the session store, and the cache
// ABOUTME: Mirrors the JSON contract of the review-automation backend

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::REVIEW_PAGE_SIZE;
use crate::error::{ApiError, ApiResult};

/// Authenticated user profile as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Profile attributes this client does not interpret but must round-trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Name to show for this user, preferring the full name
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

/// Lifecycle of a pull-request review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn all() -> [ReviewStatus; 4] {
        [Self::Pending, Self::Processing, Self::Done, Self::Failed]
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            other => Err(format!(
                "Unknown review status '{}'. Valid statuses: pending, processing, done, failed",
                other
            )),
        }
    }
}

/// A pull-request review record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub pr_number: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub repo_id: i64,
    pub status: ReviewStatus,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial update for a review; unset fields are left untouched server-side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ReviewUpdate {
    pub fn status(status: ReviewStatus) -> Self {
        Self {
            status: Some(status),
            summary: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.summary.is_none()
    }
}

/// One page of the review list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewPage {
    #[serde(default)]
    pub total: u64,
    pub items: Vec<Review>,
}

/// Filter and page selection for the review list
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ReviewFilter {
    pub repo_id: Option<i64>,
    pub status: Option<ReviewStatus>,
    /// 1-based page number; 0 is treated as the first page
    pub page: u32,
}

impl ReviewFilter {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// Effective 1-based page number
    pub fn page_number(&self) -> u32 {
        self.page.max(1)
    }

    /// Offset of the first review on this page. Widened so every page number fits.
    pub fn skip(&self) -> u64 {
        u64::from(self.page_number() - 1) * u64::from(REVIEW_PAGE_SIZE)
    }

    /// Query string parameters; filters are only sent when set
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("skip", self.skip().to_string()),
            ("limit", REVIEW_PAGE_SIZE.to_string()),
        ];
        if let Some(repo_id) = self.repo_id {
            pairs.push(("repo_id", repo_id.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        pairs
    }
}

/// A repository tracked for the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Aggregate numbers for the dashboard header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_repositories: u64,
    #[serde(default)]
    pub total_reviews: u64,
    #[serde(default)]
    pub reviews_by_status: BTreeMap<String, u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a repository import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub repositories: Vec<String>,
}

/// Backend liveness report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub db: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "ok"
    }
}

/// Payload of the OAuth code exchange.
///
/// Every field is optional on the wire so a missing field can be reported as
/// a protocol violation rather than an opaque decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallbackResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl OAuthCallbackResponse {
    /// Split into the token and profile, rejecting incomplete payloads
    pub fn into_session(self) -> ApiResult<(String, User)> {
        match (self.access_token, self.user) {
            (Some(token), Some(user)) if !token.is_empty() => Ok((token, user)),
            _ => Err(ApiError::protocol(
                "Invalid response from OAuth callback - missing token or user data",
            )),
        }
    }
}

/// Lenient timestamp codec: accepts RFC 3339 and the naive ISO form the
/// backend emits for UTC columns.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Some(naive.and_utc()))
            .map_err(serde::de::Error::custom)
    }
}
