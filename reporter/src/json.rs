//! Machine-readable run report.

use crate::config::ReportMetadata;
use chrono::{DateTime, Utc};
use results::{
    IgnorelistEntry, QualityGateVerdict, QualityGates, RawResults, ResultsAggregator, SkippedFile,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    #[serde(flatten)]
    pub raw: RawResults,
    #[serde(flatten)]
    pub metadata: ReportMetadata,
    pub ignorelist: Vec<IgnorelistEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_url: Option<String>,
    pub executed_quality_gate: u8,
    pub passing_quality_gate: u8,
    pub quality_gate: QualityGateVerdict,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<SkippedFile>,
    pub generated_at: DateTime<Utc>,
}

impl JsonReport {
    pub fn build(
        aggregator: &ResultsAggregator,
        metadata: &ReportMetadata,
        ignorelist: &[IgnorelistEntry],
        gates: QualityGates,
        issue_url: Option<String>,
    ) -> Self {
        Self {
            raw: aggregator.raw_results(),
            metadata: metadata.clone(),
            ignorelist: ignorelist.to_vec(),
            issue_url,
            executed_quality_gate: gates.executed(),
            passing_quality_gate: gates.passing(),
            quality_gate: aggregator.evaluate(&gates),
            skipped_files: aggregator.skipped_files().to_vec(),
            generated_at: Utc::now(),
        }
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
