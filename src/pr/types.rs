use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A closed pull request as listed by the GitHub REST API.
/// Only the fields the file counter needs are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    /// PR number (e.g., 42)
    pub number: u64,
    /// When the PR was opened
    pub created_at: DateTime<Utc>,
}

/// A single entry of a PR's changed-file list.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the repository root (e.g., "src/auth/config.rs")
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pull_request_ignores_extra_fields() {
        let pr: PullRequest = serde_json::from_value(json!({
            "number": 42,
            "title": "Add OAuth2 login flow",
            "created_at": "2026-01-02T03:04:05Z",
            "user": { "login": "alice" }
        }))
        .unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.created_at.to_rfc3339(), "2026-01-02T03:04:05+00:00");
    }

    #[test]
    fn test_changed_file_fields() {
        let file: ChangedFile =
            serde_json::from_value(json!({ "filename": "src/main.rs", "additions": 3 })).unwrap();
        assert_eq!(file.filename, "src/main.rs");
    }
}
