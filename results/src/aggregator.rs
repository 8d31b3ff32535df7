//! Results aggregation
//!
//! A [`ResultsAggregator`] is built once per run from the list of result
//! files and an ignorelist. Construction parses every file, applies the
//! ignorelist over the concatenated results and caches the outcome; every
//! query afterwards is a read of that cached state.
//!
//! A file that cannot be parsed is excluded and remembered in
//! [`ResultsAggregator::skipped_files`]. The run only fails when files were
//! given and none of them could be read.

use crate::ignorelist::Ignorelist;
use crate::parser::{self, ParseError};
use crate::quality_gate::{QualityGateVerdict, QualityGates};
use crate::types::{AggregateCounts, TestCaseResult, TestState};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("None of the {attempted} result files could be parsed")]
    NoReadableInput {
        attempted: usize,
        errors: Vec<ParseError>,
    },
}

pub type AggregatorResult<T> = Result<T, AggregatorError>;

/// A results file that was excluded from the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

impl From<&ParseError> for SkippedFile {
    fn from(error: &ParseError) -> Self {
        Self {
            path: error.path().to_path_buf(),
            reason: error.to_string(),
        }
    }
}

/// Machine-readable projection of a run: counts plus every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResults {
    #[serde(flatten)]
    pub counts: AggregateCounts,
    pub results: Vec<TestCaseResult>,
}

#[derive(Debug, Clone)]
pub struct ResultsAggregator {
    results: Vec<TestCaseResult>,
    counts: AggregateCounts,
    parsed_files: Vec<PathBuf>,
    skipped_files: Vec<SkippedFile>,
}

impl ResultsAggregator {
    /// Parse `files` in order and apply `ignorelist` to the combined results.
    pub fn new<P: AsRef<Path>>(files: &[P], ignorelist: &Ignorelist) -> AggregatorResult<Self> {
        let mut parsed = Vec::new();
        let mut parsed_files = Vec::new();
        let mut errors = Vec::new();

        for file in files {
            let path = file.as_ref();
            match parser::parse_file(path) {
                Ok(results) => {
                    parsed.extend(results);
                    parsed_files.push(path.to_path_buf());
                }
                Err(e) => {
                    warn!("Skipping results file: {}", e);
                    errors.push(e);
                }
            }
        }

        if !files.is_empty() && parsed_files.is_empty() {
            return Err(AggregatorError::NoReadableInput {
                attempted: files.len(),
                errors,
            });
        }

        let mut aggregator = Self::from_results(parsed, ignorelist);
        aggregator.parsed_files = parsed_files;
        aggregator.skipped_files = errors.iter().map(SkippedFile::from).collect();

        info!(
            "Aggregated {} test cases from {} files ({} skipped)",
            aggregator.counts.total,
            aggregator.parsed_files.len(),
            aggregator.skipped_files.len()
        );
        Ok(aggregator)
    }

    /// Aggregate results that were already parsed elsewhere.
    pub fn from_results(results: Vec<TestCaseResult>, ignorelist: &Ignorelist) -> Self {
        let results = ignorelist.apply(results);
        let counts = AggregateCounts::from_results(&results);
        Self {
            results,
            counts,
            parsed_files: Vec::new(),
            skipped_files: Vec::new(),
        }
    }

    /// The most severe state observed, `Passed` for an empty run.
    pub fn status(&self) -> TestState {
        self.results
            .iter()
            .map(|result| result.state)
            .max()
            .unwrap_or(TestState::Passed)
    }

    pub fn counts(&self) -> AggregateCounts {
        self.counts
    }

    /// All results in file order, then document order within each file.
    pub fn results(&self) -> &[TestCaseResult] {
        &self.results
    }

    pub fn results_with_state(&self, state: TestState) -> impl Iterator<Item = &TestCaseResult> {
        self.results.iter().filter(move |result| result.state == state)
    }

    /// Failed and ignored results, in result order.
    pub fn failures(&self) -> impl Iterator<Item = &TestCaseResult> {
        self.results.iter().filter(|result| result.state.is_failure())
    }

    pub fn raw_results(&self) -> RawResults {
        RawResults {
            counts: self.counts,
            results: self.results.clone(),
        }
    }

    pub fn evaluate(&self, gates: &QualityGates) -> QualityGateVerdict {
        gates.evaluate(&self.counts)
    }

    pub fn parsed_files(&self) -> &[PathBuf] {
        &self.parsed_files
    }

    pub fn skipped_files(&self) -> &[SkippedFile] {
        &self.skipped_files
    }
}
