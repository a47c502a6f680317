pub mod index;
pub mod types;

pub use index::FileChangeIndex;
pub use types::{ChangedFile, PullRequest};

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::GitHubSettings;
use crate::http::{ApiRequest, HttpError, Transport};

/// Length of the default look-back window.
pub const DEFAULT_WINDOW_DAYS: i64 = 365;

/// Longest look-back window accepted on the command line.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Changed files requested per PR.
const FILES_PER_PR: usize = 100;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    Api(#[from] HttpError),

    #[error("Unexpected GitHub API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Look-back window of {0} days is out of range")]
    InvalidWindow(i64),
}

/// Oldest creation time still inside a window of `days` ending at `now`.
pub fn cutoff(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, PrError> {
    TimeDelta::try_days(days)
        .filter(|_| days >= 0)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or(PrError::InvalidWindow(days))
}

/// Case-insensitive file-extension match; `ext` may carry a leading dot.
pub fn matches_extension(filename: &str, ext: &str) -> bool {
    let wanted = ext.trim_start_matches('.');
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
}

/// Client for the source-hosting API's pull-request endpoints.
pub struct PrClient<'a> {
    transport: &'a dyn Transport,
    settings: &'a GitHubSettings,
}

impl<'a> PrClient<'a> {
    pub fn new(transport: &'a dyn Transport, settings: &'a GitHubSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    fn request(&self, path: &str) -> ApiRequest {
        ApiRequest::get(format!(
            "{}/repos/{}/{}{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.owner,
            self.settings.name,
            path
        ))
        .header("Authorization", format!("Bearer {}", self.settings.token))
        .header("Accept", "application/vnd.github+json")
    }

    async fn get<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, PrError> {
        let body = self.transport.get_json(&request).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// One page of closed pull requests, 1-based.
    #[instrument(skip(self))]
    pub async fn closed_pulls(&self, page: usize) -> Result<Vec<PullRequest>, PrError> {
        let request = self
            .request("/pulls")
            .query("state", "closed")
            .query("per_page", self.settings.page_size)
            .query("page", page);
        self.get(request).await
    }

    /// Every file the PR touched, paging until a page comes back short.
    #[instrument(skip(self))]
    pub async fn changed_files(&self, pr_number: u64) -> Result<Vec<ChangedFile>, PrError> {
        let mut files = Vec::new();
        let mut page = 1usize;

        loop {
            let request = self
                .request(&format!("/pulls/{}/files", pr_number))
                .query("per_page", FILES_PER_PR)
                .query("page", page);
            let batch: Vec<ChangedFile> = self.get(request).await?;
            let short = batch.len() < FILES_PER_PR;
            files.extend(batch);

            if short {
                break;
            }
            page += 1;
        }

        debug!(pages = page, files = files.len(), "fetched changed files");
        Ok(files)
    }

    /// Page through closed PRs created at or after `cutoff` and index the files each one touched.
    /// Paging stops at the first page shorter than the configured page size.
    #[instrument(skip(self), fields(repo = %format!("{}/{}", self.settings.owner, self.settings.name)))]
    pub async fn aggregate_file_changes(
        &self,
        cutoff: DateTime<Utc>,
        extension: Option<&str>,
    ) -> Result<FileChangeIndex, PrError> {
        let mut index = FileChangeIndex::new();
        let mut page = 1;
        let mut considered = 0usize;

        loop {
            let pulls = self.closed_pulls(page).await?;
            debug!(page, pulls = pulls.len(), "fetched pull request page");

            for pr in pulls.iter().filter(|pr| pr.created_at >= cutoff) {
                considered += 1;
                for file in self.changed_files(pr.number).await? {
                    if extension.map_or(true, |ext| matches_extension(&file.filename, ext)) {
                        index.record(&file.filename, pr.number);
                    }
                }
            }

            if pulls.len() < self.settings.page_size {
                break;
            }
            page += 1;
        }

        info!(pages = page, pulls = considered, files = index.len(), "aggregated file changes");
        Ok(index)
    }
}
