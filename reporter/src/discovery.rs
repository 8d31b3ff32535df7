//! Locating JUnit result files inside result directories.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Results directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Results directory path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("Invalid results directory pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to list results directory: {0}")]
    Glob(#[from] glob::GlobError),
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Every `*.xml` regular file directly inside each directory.
///
/// Directories are visited in the order given; files within a directory are
/// sorted by path so repeated runs see the same order.
pub fn discover_result_files<P: AsRef<Path>>(dirs: &[P]) -> DiscoveryResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for dir in dirs {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DiscoveryError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut found = Vec::new();
        for entry in glob::glob(&xml_pattern(dir)?)? {
            let path = entry?;
            if path.is_file() {
                found.push(path);
            }
        }
        found.sort();

        debug!("Found {} result files in {}", found.len(), dir.display());
        files.extend(found);
    }

    Ok(files)
}

/// `dir/*.xml`, with any glob metacharacters in `dir` escaped.
fn xml_pattern(dir: &Path) -> DiscoveryResult<String> {
    let dir_str = dir
        .to_str()
        .ok_or_else(|| DiscoveryError::NonUtf8Path(dir.to_path_buf()))?;
    let escaped = glob::Pattern::escape(dir_str);
    Ok(format!("{}/*.xml", escaped.trim_end_matches('/')))
}
