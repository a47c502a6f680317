use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = ".climate-tally.toml";
pub const CODECLIMATE_TOKEN_VAR: &str = "CODECLIMATE_API_TOKEN";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

const DEFAULT_CODECLIMATE_URL: &str = "https://api.codeclimate.com/v1";
const DEFAULT_GITHUB_URL: &str = "https://api.github.com";
const DEFAULT_PR_PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required value: {field}")]
    Missing { field: &'static str },

    #[error("Invalid repository (expected owner/name): {0}")]
    InvalidRepo(String),

    #[error("Invalid page size: {0}")]
    InvalidPageSize(usize),
}

/// Top-level configuration loaded from .climate-tally.toml.
/// All fields are optional; command-line flags fill in the rest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub codeclimate: CodeClimateConfig,

    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeClimateConfig {
    /// API token. If None, falls back to CODECLIMATE_API_TOKEN.
    pub token: Option<String>,
    pub repo_id: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// Access token. If None, falls back to GITHUB_TOKEN.
    pub token: Option<String>,
    /// Repository as `owner/name`
    pub repo: Option<String>,
    pub base_url: Option<String>,
    pub page_size: Option<usize>,
}

impl Config {
    /// Load configuration from .climate-tally.toml in the current directory,
    /// falling back to defaults when the file doesn't exist. Token fields
    /// left empty by the file are filled from the environment.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        config.apply_env_fallback(
            std::env::var(CODECLIMATE_TOKEN_VAR).ok(),
            std::env::var(GITHUB_TOKEN_VAR).ok(),
        );
        Ok(config)
    }

    /// Fill tokens the file left absent or blank from the environment values.
    fn apply_env_fallback(&mut self, codeclimate: Option<String>, github: Option<String>) {
        self.codeclimate.token = non_empty(self.codeclimate.token.take()).or(codeclimate);
        self.github.token = non_empty(self.github.token.take()).or(github);
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Build analysis-API credentials. Flag values take precedence over the file/env.
    pub fn codeclimate_credentials(
        &self,
        token: Option<String>,
        repo_id: Option<String>,
    ) -> Result<Credentials, ConfigError> {
        Credentials::new(
            token.or_else(|| self.codeclimate.token.clone()),
            repo_id.or_else(|| self.codeclimate.repo_id.clone()),
        )
    }

    pub fn codeclimate_base_url(&self) -> &str {
        self.codeclimate
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_CODECLIMATE_URL)
    }

    /// Build source-hosting settings for the PR file counter.
    pub fn github_settings(
        &self,
        token: Option<String>,
        repo: Option<String>,
    ) -> Result<GitHubSettings, ConfigError> {
        let credentials = Credentials::new(
            token.or_else(|| self.github.token.clone()),
            repo.or_else(|| self.github.repo.clone()),
        )
        .map_err(|err| match err {
            ConfigError::Missing { field: "repo-id" } => ConfigError::Missing { field: "repo" },
            other => other,
        })?;

        let (owner, name) = credentials
            .repo_id()
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
            .ok_or_else(|| ConfigError::InvalidRepo(credentials.repo_id().to_string()))?;

        let page_size = self.github.page_size.unwrap_or(DEFAULT_PR_PAGE_SIZE);
        if page_size == 0 {
            return Err(ConfigError::InvalidPageSize(page_size));
        }

        Ok(GitHubSettings {
            owner: owner.to_string(),
            name: name.to_string(),
            base_url: self
                .github
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GITHUB_URL.to_string()),
            page_size,
            token: credentials.token().to_string(),
        })
    }
}

/// A validated token + repository identifier pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    repo_id: String,
}

impl Credentials {
    /// Fails if either value is absent or empty.
    pub fn new(token: Option<String>, repo_id: Option<String>) -> Result<Self, ConfigError> {
        let token = non_empty(token).ok_or(ConfigError::Missing { field: "token" })?;
        let repo_id = non_empty(repo_id).ok_or(ConfigError::Missing { field: "repo-id" })?;
        Ok(Self { token, repo_id })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub owner: String,
    pub name: String,
    pub base_url: String,
    pub page_size: usize,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.codeclimate.token.is_none());
        assert!(config.github.repo.is_none());
        assert_eq!(config.codeclimate_base_url(), DEFAULT_CODECLIMATE_URL);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[codeclimate]
repo_id = "abc123"
base_url = "http://localhost:9000"

[github]
repo = "org/repo"
page_size = 50
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.codeclimate.repo_id.as_deref(), Some("abc123"));
        assert_eq!(config.codeclimate_base_url(), "http://localhost:9000");
        assert_eq!(config.github.page_size, Some(50));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[github]\nrepo = \"org/repo\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.github.repo.as_deref(), Some("org/repo"));
    }

    #[test]
    fn test_blank_file_token_falls_back_to_env() {
        let mut config: Config =
            toml::from_str("[codeclimate]\ntoken = \"\"\n[github]\ntoken = \"  \"\n").unwrap();
        config.apply_env_fallback(Some("cc-env".into()), Some("gh-env".into()));
        assert_eq!(config.codeclimate.token.as_deref(), Some("cc-env"));
        assert_eq!(config.github.token.as_deref(), Some("gh-env"));
    }

    #[test]
    fn test_file_token_wins_over_env() {
        let mut config: Config = toml::from_str("[github]\ntoken = \"from-file\"\n").unwrap();
        config.apply_env_fallback(None, Some("gh-env".into()));
        assert_eq!(config.github.token.as_deref(), Some("from-file"));
        assert!(config.codeclimate.token.is_none());
    }

    #[test]
    fn test_credentials_reject_empty_values() {
        assert!(matches!(
            Credentials::new(Some(String::new()), Some("repo".into())),
            Err(ConfigError::Missing { field: "token" })
        ));
        assert!(matches!(
            Credentials::new(Some("tok".into()), Some("".into())),
            Err(ConfigError::Missing { field: "repo-id" })
        ));
        assert!(matches!(
            Credentials::new(None, Some("repo".into())),
            Err(ConfigError::Missing { field: "token" })
        ));
    }

    #[test]
    fn test_credentials_accessors() {
        let creds = Credentials::new(Some("tok".into()), Some("repo".into())).unwrap();
        assert_eq!(creds.token(), "tok");
        assert_eq!(creds.repo_id(), "repo");
    }

    #[test]
    fn test_flag_overrides_file_value() {
        let mut config = Config::default();
        config.codeclimate.token = Some("from-file".into());
        config.codeclimate.repo_id = Some("file-repo".into());
        let creds = config
            .codeclimate_credentials(Some("from-flag".into()), None)
            .unwrap();
        assert_eq!(creds.token(), "from-flag");
        assert_eq!(creds.repo_id(), "file-repo");
    }

    #[test]
    fn test_github_settings_split_repo() {
        let config = Config::default();
        let settings = config
            .github_settings(Some("tok".into()), Some("org/repo".into()))
            .unwrap();
        assert_eq!(settings.owner, "org");
        assert_eq!(settings.name, "repo");
        assert_eq!(settings.page_size, DEFAULT_PR_PAGE_SIZE);
        assert_eq!(settings.base_url, DEFAULT_GITHUB_URL);
    }

    #[test]
    fn test_github_settings_invalid_repo() {
        let config = Config::default();
        assert!(matches!(
            config.github_settings(Some("tok".into()), Some("no-slash".into())),
            Err(ConfigError::InvalidRepo(_))
        ));
        assert!(matches!(
            config.github_settings(Some("tok".into()), Some("a/b/c".into())),
            Err(ConfigError::InvalidRepo(_))
        ));
    }

    #[test]
    fn test_github_settings_missing_repo() {
        let config = Config::default();
        assert!(matches!(
            config.github_settings(Some("tok".into()), None),
            Err(ConfigError::Missing { field: "repo" })
        ));
    }

    #[test]
    fn test_github_settings_zero_page_size() {
        let mut config = Config::default();
        config.github.page_size = Some(0);
        assert!(matches!(
            config.github_settings(Some("tok".into()), Some("org/repo".into())),
            Err(ConfigError::InvalidPageSize(0))
        ));
    }
}
