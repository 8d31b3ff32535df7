pub mod config;
pub mod discovery;
pub mod json;
pub mod markdown;
pub mod pipeline;
pub mod publish;
pub mod tracker;

pub use config::{
    ArtifactLinks, ConfigError, ConfigResult, GitHubConfig, ReportMetadata, GITHUB_TOKEN_ENV,
};
pub use discovery::{discover_result_files, DiscoveryError, DiscoveryResult};
pub use json::JsonReport;
pub use markdown::{header_icon, status_icon, verdict_icon, GitHubIssueReport};
pub use pipeline::{ReportRun, RunError, RunResult};
pub use publish::{
    publish_issue, publish_issue_with, write_output, PublishError, PublishResult,
};
pub use tracker::{
    DryRunTracker, GitHubTracker, IssueDraft, IssueReference, IssueTracker, TrackerError,
    TrackerResult,
};
