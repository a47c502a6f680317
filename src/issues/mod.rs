pub mod languages;

pub use languages::{count_languages, LanguageCounts};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::Credentials;
use crate::http::{ApiRequest, HttpError, Transport};

/// Page size used when walking every page of issues.
pub const ALL_PAGES_SIZE: usize = 100;

const JSON_API: &str = "application/vnd.api+json";
const SNAPSHOT_ID_PATH: [&str; 5] = [
    "data",
    "relationships",
    "latest_default_branch_snapshot",
    "data",
    "id",
];

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("API request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("API response is missing `{0}`")]
    MissingField(String),

    #[error("Failed to parse API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl From<HttpError> for IssueError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Request(e) => IssueError::Request(e),
            HttpError::Status { status, message } => IssueError::Status { status, message },
            HttpError::Decode(e) => IssueError::Decode(e),
        }
    }
}

impl IssueError {
    /// Short machine-readable category used in the error payload.
    pub fn kind(&self) -> &'static str {
        match self {
            IssueError::Status { .. } | IssueError::MissingField(_) => "api_error",
            IssueError::Decode(_) => "json_error",
            IssueError::Request(_) => "request_error",
        }
    }

    /// `{"error": {"type": ..., "message": ...}}`
    pub fn to_payload(&self) -> Value {
        let mut error = json!({
            "type": self.kind(),
            "message": self.to_string(),
        });
        if let IssueError::Status { status, .. } = self {
            error["status"] = json!(status);
        }
        json!({ "error": error })
    }
}

/// Client for the code-quality analysis API.
pub struct IssueClient<'a> {
    transport: &'a dyn Transport,
    base_url: String,
    credentials: Credentials,
}

impl<'a> IssueClient<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: &str, credentials: Credentials) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn request(&self, path: &str) -> ApiRequest {
        ApiRequest::get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Token token={}", self.credentials.token()))
            .header("Accept", JSON_API)
    }

    fn issues_path(&self, snapshot_id: &str) -> String {
        format!(
            "/repos/{}/snapshots/{}/issues",
            self.credentials.repo_id(),
            snapshot_id
        )
    }

    /// Resolve the repository's latest default-branch snapshot id.
    #[instrument(skip(self), fields(repo_id = %self.credentials.repo_id()))]
    pub async fn fetch_snapshot_id(&self) -> Result<String, IssueError> {
        let request = self.request(&format!("/repos/{}", self.credentials.repo_id()));
        let body = self.transport.get_json(&request).await?;

        let mut node = &body;
        for (depth, key) in SNAPSHOT_ID_PATH.iter().enumerate() {
            node = node
                .get(key)
                .filter(|v| !v.is_null())
                .ok_or_else(|| IssueError::MissingField(SNAPSHOT_ID_PATH[..=depth].join(".")))?;
        }

        let snapshot_id = match node {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        debug!(snapshot_id = %snapshot_id, "resolved snapshot");
        Ok(snapshot_id)
    }

    /// Fetch a single page of issues and return the raw response body.
    #[instrument(skip(self))]
    pub async fn fetch_issues(&self, snapshot_id: &str, page_size: usize) -> Result<Value, IssueError> {
        let request = self
            .request(&self.issues_path(snapshot_id))
            .query("page[size]", page_size);
        Ok(self.transport.get_json(&request).await?)
    }

    /// Walk every page until one comes back empty, concatenating issues in fetch order.
    #[instrument(skip(self))]
    pub async fn fetch_all_issues(&self, snapshot_id: &str) -> Result<Vec<Value>, IssueError> {
        let mut issues = Vec::new();
        let mut page_number = 1usize;

        loop {
            let request = self
                .request(&self.issues_path(snapshot_id))
                .query("page[size]", ALL_PAGES_SIZE)
                .query("page[number]", page_number);
            let body = self.transport.get_json(&request).await?;

            let page = match body.get("data") {
                Some(Value::Array(items)) => items,
                _ => return Err(IssueError::MissingField("data".to_string())),
            };
            debug!(page = page_number, issues = page.len(), "fetched issue page");

            if page.is_empty() {
                break;
            }
            issues.extend(page.iter().cloned());
            page_number += 1;
        }

        info!(total = issues.len(), pages = page_number, "fetched all issues");
        Ok(issues)
    }

    /// Every issue in the latest snapshot.
    pub async fn latest_issues(&self) -> Result<Vec<Value>, IssueError> {
        let snapshot_id = self.fetch_snapshot_id().await?;
        self.fetch_all_issues(&snapshot_id).await
    }

    /// Snapshot lookup followed by one page (or every page) of issues.
    pub async fn snapshot_issues(&self, page_size: usize, all: bool) -> Result<Value, IssueError> {
        if all {
            let issues = self.latest_issues().await?;
            return Ok(json!({ "data": issues }));
        }
        let snapshot_id = self.fetch_snapshot_id().await?;
        self.fetch_issues(&snapshot_id, page_size).await
    }
}

/// Top-level issue fetch: failures come back as an error payload instead of an `Err`.
pub async fn fetch_issues_payload(client: &IssueClient<'_>, page_size: usize, all: bool) -> Value {
    match client.snapshot_issues(page_size, all).await {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(error = %err, "issue fetch failed");
            err.to_payload()
        }
    }
}

/// Every issue in the latest snapshot, counted per language. Failures come back
/// as the same error payload `fetch_issues_payload` produces.
pub async fn language_counts_payload(client: &IssueClient<'_>) -> Result<LanguageCounts, Value> {
    match client.latest_issues().await {
        Ok(issues) => {
            let counts = count_languages(&issues);
            info!(issues = issues.len(), languages = counts.len(), "counted languages");
            Ok(counts)
        }
        Err(err) => {
            tracing::warn!(error = %err, "issue fetch failed");
            Err(err.to_payload())
        }
    }
}
