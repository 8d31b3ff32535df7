//! Known-failure allow-list
//!
//! An ignorelist is a JSON document of the form
//!
//! ```json
//! { "ignored_tests": [ { "name": "...", "squad": "...", "owner": "..." } ] }
//! ```
//!
//! Failed cases whose name matches an entry are reclassified as ignored and
//! pick up the entry's squad and owner. An entry may optionally pin a
//! `testsuite` to avoid catching an identically named case in another suite.

use crate::types::{TestCaseResult, TestState};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const IGNORED_TESTS_KEY: &str = "ignored_tests";

#[derive(Error, Debug)]
pub enum IgnorelistError {
    #[error("Failed to read ignorelist {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Ignorelist is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ignorelist is missing the top-level \"ignored_tests\" key")]
    MissingKey,
}

pub type IgnorelistResult<T> = Result<T, IgnorelistError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnorelistEntry {
    pub name: String,
    #[serde(default)]
    pub squad: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testsuite: Option<String>,
}

impl IgnorelistEntry {
    pub fn new(name: impl Into<String>, squad: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            squad: squad.into(),
            owner: owner.into(),
            testsuite: None,
        }
    }

    pub fn in_suite(mut self, testsuite: impl Into<String>) -> Self {
        self.testsuite = Some(testsuite.into());
        self
    }

    /// Exact name match, additionally constrained by suite when one is pinned.
    pub fn matches(&self, result: &TestCaseResult) -> bool {
        self.name == result.name
            && self
                .testsuite
                .as_ref()
                .map_or(true, |suite| *suite == result.testsuite)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ignorelist {
    #[serde(rename = "ignored_tests")]
    entries: Vec<IgnorelistEntry>,
}

impl Ignorelist {
    pub fn new(entries: Vec<IgnorelistEntry>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Strictly parse an ignorelist document.
    pub fn from_json(json: &str) -> IgnorelistResult<Self> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        let entries = document
            .get(IGNORED_TESTS_KEY)
            .cloned()
            .ok_or(IgnorelistError::MissingKey)?;
        Ok(Self::new(serde_json::from_value(entries)?))
    }

    pub fn from_path(path: impl AsRef<Path>) -> IgnorelistResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| IgnorelistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load an optional ignorelist, degrading to an empty one.
    ///
    /// No path or a path that does not exist means "no ignorelist". Any other
    /// problem is logged as a warning and also yields an empty ignorelist.
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::empty();
        };
        if !path.is_file() {
            debug!("No ignorelist found at {}", path.display());
            return Self::empty();
        }
        match Self::from_path(path) {
            Ok(ignorelist) => {
                debug!(
                    "Loaded {} ignorelist entries from {}",
                    ignorelist.len(),
                    path.display()
                );
                ignorelist
            }
            Err(e) => {
                warn!(
                    "Ignoring ignorelist at {}, treating it as empty: {}",
                    path.display(),
                    e
                );
                Self::empty()
            }
        }
    }

    pub fn entries(&self) -> &[IgnorelistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First matching entry in ignorelist order.
    pub fn find(&self, result: &TestCaseResult) -> Option<&IgnorelistEntry> {
        self.entries.iter().find(|entry| entry.matches(result))
    }

    /// Reclassify matching failures as ignored. Every other result passes
    /// through untouched, and the order of results is preserved.
    pub fn apply(&self, results: impl IntoIterator<Item = TestCaseResult>) -> Vec<TestCaseResult> {
        results
            .into_iter()
            .map(|result| {
                if result.state != TestState::Failed {
                    return result;
                }
                match self.find(&result) {
                    Some(entry) => result.into_ignored(&entry.squad, &entry.owner),
                    None => result,
                }
            })
            .collect()
    }
}
