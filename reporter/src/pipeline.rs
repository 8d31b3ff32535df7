use crate::discovery::{discover_result_files, DiscoveryError};
use results::{AggregatorError, Ignorelist, QualityGates, QualityGateVerdict, ResultsAggregator};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Aggregation(#[from] AggregatorError),
}

pub type RunResult<T> = Result<T, RunError>;

/// One aggregation run over a set of result directories.
#[derive(Debug, Clone)]
pub struct ReportRun {
    pub aggregator: ResultsAggregator,
    pub ignorelist: Ignorelist,
    pub gates: QualityGates,
}

impl ReportRun {
    pub fn load(
        dirs: &[PathBuf],
        ignore_list: Option<&Path>,
        gates: QualityGates,
    ) -> RunResult<Self> {
        let files = discover_result_files(dirs)?;
        let ignorelist = Ignorelist::load_or_empty(ignore_list);
        info!(
            "Aggregating {} result files with {} ignorelist entries",
            files.len(),
            ignorelist.len()
        );
        let aggregator = ResultsAggregator::new(&files, &ignorelist)?;

        Ok(Self {
            aggregator,
            ignorelist,
            gates,
        })
    }

    pub fn verdict(&self) -> QualityGateVerdict {
        self.aggregator.evaluate(&self.gates)
    }
}
