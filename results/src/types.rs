use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single test case.
///
/// Variants are declared in ascending severity, so `Ord` gives the
/// precedence used when picking the headline status of a run:
/// `Failed > Ignored > Skipped > Passed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TestState {
    Passed,
    Skipped,
    Ignored,
    Failed,
}

impl TestState {
    pub const ALL: [TestState; 4] = [
        TestState::Passed,
        TestState::Skipped,
        TestState::Ignored,
        TestState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestState::Passed => "passed",
            TestState::Skipped => "skipped",
            TestState::Ignored => "ignored",
            TestState::Failed => "failed",
        }
    }

    /// Title-cased label, e.g. `Failed`.
    pub fn label(&self) -> &'static str {
        match self {
            TestState::Passed => "Passed",
            TestState::Skipped => "Skipped",
            TestState::Ignored => "Ignored",
            TestState::Failed => "Failed",
        }
    }

    /// Failed and ignored cases both carry a failure message worth reporting.
    pub fn is_failure(&self) -> bool {
        matches!(self, TestState::Failed | TestState::Ignored)
    }
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultMetadata {
    /// Failure or error text; empty for passed and skipped cases.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squad: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Execution time in seconds, from the JUnit `time` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// One executed or skipped test case, normalized from a JUnit document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCaseResult {
    pub testsuite: String,
    pub name: String,
    pub state: TestState,
    pub metadata: ResultMetadata,
}

impl TestCaseResult {
    pub fn passed(testsuite: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_state(testsuite, name, TestState::Passed)
    }

    pub fn skipped(testsuite: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_state(testsuite, name, TestState::Skipped)
    }

    pub fn failed(
        testsuite: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let mut result = Self::with_state(testsuite, name, TestState::Failed);
        result.metadata.message = message.into();
        result
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.metadata.duration = Some(seconds);
        self
    }

    /// Reclassify a failure as a known, ignored failure owned by `squad`/`owner`.
    ///
    /// Empty ownership strings leave the corresponding metadata untouched.
    pub fn into_ignored(mut self, squad: &str, owner: &str) -> Self {
        self.state = TestState::Ignored;
        if !squad.is_empty() {
            self.metadata.squad = Some(squad.to_string());
        }
        if !owner.is_empty() {
            self.metadata.owner = Some(owner.to_string());
        }
        self
    }

    fn with_state(testsuite: impl Into<String>, name: impl Into<String>, state: TestState) -> Self {
        Self {
            testsuite: testsuite.into(),
            name: name.into(),
            state,
            metadata: ResultMetadata::default(),
        }
    }
}

/// Per-state totals of an aggregation run.
///
/// Built by counting results, which keeps `total` equal to the sum of the
/// four state counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregateCounts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub ignored: usize,
}

impl AggregateCounts {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a TestCaseResult>) -> Self {
        let mut counts = Self::default();
        for result in results {
            counts.record(result.state);
        }
        counts
    }

    fn record(&mut self, state: TestState) {
        self.total += 1;
        match state {
            TestState::Passed => self.passed += 1,
            TestState::Failed => self.failed += 1,
            TestState::Skipped => self.skipped += 1,
            TestState::Ignored => self.ignored += 1,
        }
    }

    pub fn get(&self, state: TestState) -> usize {
        match state {
            TestState::Passed => self.passed,
            TestState::Failed => self.failed,
            TestState::Skipped => self.skipped,
            TestState::Ignored => self.ignored,
        }
    }

    /// Cases that actually ran: everything except skipped.
    pub fn executed(&self) -> usize {
        self.total.saturating_sub(self.skipped)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
