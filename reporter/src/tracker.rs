use crate::config::GitHubConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication failed")]
    Authentication,

    #[error("Repository not found: {repository}")]
    NotFound { repository: String },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Issue tracker rejected the request ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("No GitHub token configured; pass --github-token or set GITHUB_TOKEN")]
    MissingToken,

    #[error("Issue tracker unavailable: {message}")]
    Unavailable { message: String },
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// A rendered issue ready to be filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl IssueDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            labels: Vec::new(),
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }
}

/// Where a submitted issue ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReference {
    pub number: Option<u64>,
    pub url: String,
}

#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn submit(&self, draft: &IssueDraft) -> TrackerResult<IssueReference>;

    fn tracker_name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    labels: &'a Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CreateIssueResponse {
    number: u64,
    html_url: String,
}

pub struct GitHubTracker {
    client: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubTracker {
    pub fn new(config: GitHubConfig) -> TrackerResult<Self> {
        config
            .validate()
            .map_err(|message| TrackerError::InvalidConfig { message })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("canary-reporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TrackerError::InvalidConfig {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn issues_url(&self) -> String {
        format!(
            "{}/repos/{}/issues",
            self.config.api_url.trim_end_matches('/'),
            self.config.repository_slug()
        )
    }

    fn status_error(&self, status: reqwest::StatusCode, message: String) -> TrackerError {
        match status.as_u16() {
            401 | 403 => TrackerError::Authentication,
            404 => TrackerError::NotFound {
                repository: self.config.repository_slug(),
            },
            429 => TrackerError::RateLimit,
            code => TrackerError::Remote {
                status: code,
                message,
            },
        }
    }

    fn handle_http_error(err: reqwest::Error) -> TrackerError {
        if err.is_timeout() {
            TrackerError::Unavailable {
                message: "Request timeout".to_string(),
            }
        } else if err.is_connect() {
            TrackerError::Unavailable {
                message: "Cannot connect to GitHub".to_string(),
            }
        } else {
            TrackerError::Network(err)
        }
    }
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    async fn submit(&self, draft: &IssueDraft) -> TrackerResult<IssueReference> {
        let token = self.config.token.as_deref().ok_or(TrackerError::MissingToken)?;
        let url = self.issues_url();
        debug!("Creating issue at {}", url);

        let request = CreateIssueRequest {
            title: &draft.title,
            body: &draft.body,
            labels: &draft.labels,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&request)
            .send()
            .await
            .map_err(Self::handle_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("GitHub API error ({}): {}", status, error_text);
            return Err(self.status_error(status, error_text));
        }

        let created: CreateIssueResponse =
            response.json().await.map_err(Self::handle_http_error)?;
        info!("Created issue #{} at {}", created.number, created.html_url);

        Ok(IssueReference {
            number: Some(created.number),
            url: created.html_url,
        })
    }

    fn tracker_name(&self) -> &'static str {
        "github"
    }
}

/// Logs the issue it would have opened instead of calling out.
pub struct DryRunTracker {
    repository: String,
}

impl DryRunTracker {
    pub fn new(config: &GitHubConfig) -> Self {
        Self {
            repository: config.repository_slug(),
        }
    }
}

#[async_trait]
impl IssueTracker for DryRunTracker {
    async fn submit(&self, draft: &IssueDraft) -> TrackerResult<IssueReference> {
        info!(
            "Dry run: would open \"{}\" in {} with labels {:?}",
            draft.title, self.repository, draft.labels
        );
        debug!("Dry run issue body:\n{}", draft.body);
        Ok(IssueReference {
            number: None,
            url: format!("https://github.com/{}/issues", self.repository),
        })
    }

    fn tracker_name(&self) -> &'static str {
        "dry-run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_rejects_invalid_config() {
        let config = GitHubConfig::default().with_repository("");
        assert!(matches!(
            GitHubTracker::new(config),
            Err(TrackerError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_issues_url() {
        let config = GitHubConfig::default()
            .with_api_url("https://github.example.com/api/v3/")
            .with_organization("acme")
            .with_repository("canaries");
        let tracker = GitHubTracker::new(config).unwrap();
        assert_eq!(
            tracker.issues_url(),
            "https://github.example.com/api/v3/repos/acme/canaries/issues"
        );
        assert_eq!(tracker.tracker_name(), "github");
    }

    #[test]
    fn test_status_mapping() {
        let tracker = GitHubTracker::new(GitHubConfig::default()).unwrap();
        let map = |code: u16| {
            tracker.status_error(
                reqwest::StatusCode::from_u16(code).unwrap(),
                "body".to_string(),
            )
        };

        assert!(matches!(map(401), TrackerError::Authentication));
        assert!(matches!(map(403), TrackerError::Authentication));
        assert!(matches!(map(404), TrackerError::NotFound { .. }));
        assert!(matches!(map(429), TrackerError::RateLimit));
        assert!(matches!(
            map(422),
            TrackerError::Remote { status: 422, .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_request() {
        let tracker = GitHubTracker::new(GitHubConfig::default()).unwrap();
        let err = tracker
            .submit(&IssueDraft::new("title", "body"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::MissingToken));
    }

    #[test]
    fn test_request_omits_empty_labels() {
        let draft = IssueDraft::new("title", "body");
        let request = CreateIssueRequest {
            title: &draft.title,
            body: &draft.body,
            labels: &draft.labels,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("labels").is_none());
    }

    #[tokio::test]
    async fn test_dry_run_tracker() {
        let tracker = DryRunTracker::new(&GitHubConfig::default().with_organization("acme"));
        let draft = IssueDraft::new("Canary failure", "body").with_labels(vec!["bug".to_string()]);

        let reference = tracker.submit(&draft).await.unwrap();
        assert_eq!(reference.number, None);
        assert_eq!(reference.url, "https://github.com/acme/backlog/issues");
        assert_eq!(tracker.tracker_name(), "dry-run");
    }
}
