//! Quality gate evaluation
//!
//! Two metrics are derived from [`AggregateCounts`]:
//!
//! - percentage executed: `100 - skipped / total * 100`, or 100 for an empty run
//! - percentage passing: `passed / (total - skipped) * 100`, or 100 when
//!   nothing was executed
//!
//! Both are rounded half-up to whole percentages before being compared with
//! their gate. A metric at or above its gate passes, at or above 80% of the
//! gate warns, and fails otherwise.

use crate::types::AggregateCounts;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fraction of a gate (as `WARN_NUMERATOR / WARN_DENOMINATOR`) that still
/// earns a warning instead of a failure.
const WARN_NUMERATOR: u32 = 4;
const WARN_DENOMINATOR: u32 = 5;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GateError {
    #[error("{gate} quality gate must be between 0 and 100, got {value}")]
    OutOfRange { gate: &'static str, value: u8 },
}

pub type GateResult<T> = Result<T, GateError>;

/// Validated pair of gate thresholds, each a whole percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityGates {
    executed: u8,
    passing: u8,
}

impl Default for QualityGates {
    fn default() -> Self {
        Self {
            executed: 100,
            passing: 100,
        }
    }
}

impl QualityGates {
    pub fn new(executed: u8, passing: u8) -> GateResult<Self> {
        if executed > 100 {
            return Err(GateError::OutOfRange {
                gate: "executed",
                value: executed,
            });
        }
        if passing > 100 {
            return Err(GateError::OutOfRange {
                gate: "passing",
                value: passing,
            });
        }
        Ok(Self { executed, passing })
    }

    pub fn executed(&self) -> u8 {
        self.executed
    }

    pub fn passing(&self) -> u8 {
        self.passing
    }

    pub fn evaluate(&self, counts: &AggregateCounts) -> QualityGateVerdict {
        evaluate(counts, self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

impl Verdict {
    pub fn classify(percentage: u32, gate: u8) -> Self {
        let gate = u32::from(gate);
        if percentage >= gate {
            Verdict::Pass
        } else if percentage * WARN_DENOMINATOR >= gate * WARN_NUMERATOR {
            Verdict::Warn
        } else {
            Verdict::Fail
        }
    }
}

/// One metric measured against its gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub percentage: u32,
    pub gate: u8,
    pub verdict: Verdict,
}

impl GateOutcome {
    fn measure(percentage: u32, gate: u8) -> Self {
        Self {
            percentage,
            gate,
            verdict: Verdict::classify(percentage, gate),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGateVerdict {
    pub executed: GateOutcome,
    pub passing: GateOutcome,
}

impl QualityGateVerdict {
    /// The worse of the two metric verdicts.
    pub fn overall(&self) -> Verdict {
        self.executed.verdict.max(self.passing.verdict)
    }
}

pub fn evaluate(counts: &AggregateCounts, gates: &QualityGates) -> QualityGateVerdict {
    QualityGateVerdict {
        executed: GateOutcome::measure(percentage_executed(counts), gates.executed),
        passing: GateOutcome::measure(percentage_passing(counts), gates.passing),
    }
}

pub fn percentage_executed(counts: &AggregateCounts) -> u32 {
    if counts.total == 0 {
        return 100;
    }
    rounded_percentage(counts.executed(), counts.total)
}

pub fn percentage_passing(counts: &AggregateCounts) -> u32 {
    let executed = counts.executed();
    if executed == 0 {
        return 100;
    }
    rounded_percentage(counts.passed, executed)
}

/// `round(part / whole * 100)` with ties rounded up, in exact integer math.
fn rounded_percentage(part: usize, whole: usize) -> u32 {
    let part = part as u64;
    let whole = whole as u64;
    ((200 * part + whole) / (2 * whole)) as u32
}
