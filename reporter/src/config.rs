use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid TOML in config: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Describes the CI run that produced the results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
}

impl ReportMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(mut self, snapshot: impl Into<String>) -> Self {
        self.snapshot = Some(snapshot.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_hub(mut self, version: Option<String>, platform: Option<String>) -> Self {
        self.hub_version = version;
        self.hub_platform = platform;
        self
    }

    pub fn with_import(mut self, version: Option<String>, platform: Option<String>) -> Self {
        self.import_version = version;
        self.import_platform = platform;
        self
    }

    pub fn with_job(mut self, job_url: Option<String>, build_id: Option<String>) -> Self {
        self.job_url = job_url;
        self.build_id = build_id;
        self
    }
}

/// Links to artifacts published alongside the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLinks {
    pub must_gather_url: Option<String>,
    pub results_url: Option<String>,
    pub markdown_url: Option<String>,
    pub snapshot_diff_url: Option<String>,
}

impl ArtifactLinks {
    pub fn is_empty(&self) -> bool {
        self.must_gather_url.is_none()
            && self.results_url.is_none()
            && self.markdown_url.is_none()
            && self.snapshot_diff_url.is_none()
    }
}

/// Where and how GitHub issues are opened.
///
/// Loadable from a TOML file; the token is never written back out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub organization: String,
    pub repository: String,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub tags: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            organization: "open-cluster-management".to_string(),
            repository: "backlog".to_string(),
            token: None,
            tags: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl GitHubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Fill a missing token from `GITHUB_TOKEN`.
    pub fn with_token_from_env(mut self) -> Self {
        if self.token.is_none() {
            self.token = std::env::var(GITHUB_TOKEN_ENV)
                .ok()
                .filter(|token| !token.is_empty());
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn repository_slug(&self) -> String {
        format!("{}/{}", self.organization, self.repository)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("API URL cannot be empty".to_string());
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err("API URL must start with http:// or https://".to_string());
        }

        if self.organization.is_empty() {
            return Err("GitHub organization cannot be empty".to_string());
        }

        if self.repository.is_empty() {
            return Err("GitHub repository cannot be empty".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
