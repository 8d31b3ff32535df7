use crate::tracker::{IssueDraft, IssueReference, IssueTracker, TrackerError, TrackerResult};
use std::borrow::Borrow;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Issue submission failed: {0}")]
    Tracker(#[from] TrackerError),
}

pub type PublishResult<T> = Result<T, PublishError>;

/// Write `content` to `path`, creating missing parent directories.
pub fn write_output(path: &Path, content: &str) -> PublishResult<()> {
    let io_error = |source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, content).map_err(io_error)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Save the issue body locally when asked, then file it with `tracker`.
///
/// A failed submission only fails the call when nothing was saved; with a
/// local copy on disk the error is logged and `Ok(None)` returned.
pub async fn publish_issue(
    draft: &IssueDraft,
    output_file: Option<&Path>,
    tracker: &dyn IssueTracker,
) -> PublishResult<Option<IssueReference>> {
    publish_issue_with(draft, output_file, || Ok(tracker)).await
}

/// Like [`publish_issue`], but the tracker is built after the local copy is
/// saved. A tracker that cannot be built is handled like a failed submission.
pub async fn publish_issue_with<'t, F, T>(
    draft: &IssueDraft,
    output_file: Option<&Path>,
    build_tracker: F,
) -> PublishResult<Option<IssueReference>>
where
    F: FnOnce() -> TrackerResult<T>,
    T: Borrow<dyn IssueTracker + 't>,
{
    if let Some(path) = output_file {
        write_output(path, &draft.body)?;
    }
    let saved = output_file.is_some();

    let owned = match build_tracker() {
        Ok(tracker) => tracker,
        Err(e) => return tolerate(e, saved, "set up the issue tracker"),
    };
    let tracker: &(dyn IssueTracker + 't) = owned.borrow();

    match tracker.submit(draft).await {
        Ok(reference) => {
            info!(
                "Filed \"{}\" with {}: {}",
                draft.title,
                tracker.tracker_name(),
                reference.url
            );
            Ok(Some(reference))
        }
        Err(e) => tolerate(e, saved, tracker.tracker_name()),
    }
}

fn tolerate(
    error: TrackerError,
    saved: bool,
    context: &str,
) -> PublishResult<Option<IssueReference>> {
    if saved {
        error!(
            "Failed to file issue ({}: {}); the report was saved locally",
            context, error
        );
        Ok(None)
    } else {
        Err(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::TrackerResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FailingTracker {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IssueTracker for FailingTracker {
        async fn submit(&self, _draft: &IssueDraft) -> TrackerResult<IssueReference> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TrackerError::RateLimit)
        }

        fn tracker_name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_failure_tolerated_with_output_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("issue.md");
        let tracker = FailingTracker {
            calls: AtomicUsize::new(0),
        };
        let draft = IssueDraft::new("title", "# body\n");

        let reference = publish_issue(&draft, Some(path.as_path()), &tracker).await.unwrap();
        assert_eq!(reference, None);
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# body\n");
    }

    #[tokio::test]
    async fn test_failure_propagates_without_output_file() {
        let tracker = FailingTracker {
            calls: AtomicUsize::new(0),
        };
        let draft = IssueDraft::new("title", "body");

        let err = publish_issue(&draft, None, &tracker).await.unwrap_err();
        assert!(matches!(err, PublishError::Tracker(TrackerError::RateLimit)));
    }

    #[tokio::test]
    async fn test_tracker_setup_failure_still_saves_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("issue.md");
        let draft = IssueDraft::new("title", "# body\n");
        let unbuildable = || -> TrackerResult<Box<dyn IssueTracker>> {
            Err(TrackerError::InvalidConfig {
                message: "API URL cannot be empty".to_string(),
            })
        };

        let reference = publish_issue_with(&draft, Some(path.as_path()), unbuildable)
            .await
            .unwrap();
        assert_eq!(reference, None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# body\n");

        let err = publish_issue_with(&draft, None, unbuildable)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PublishError::Tracker(TrackerError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_write_output_reports_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let err = write_output(&blocker.join("issue.md"), "body").unwrap_err();
        match err {
            PublishError::Io { path, .. } => assert!(path.ends_with("issue.md")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
