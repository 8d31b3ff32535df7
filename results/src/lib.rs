pub mod aggregator;
pub mod ignorelist;
pub mod parser;
pub mod quality_gate;
pub mod types;

pub use aggregator::{
    AggregatorError, AggregatorResult, RawResults, ResultsAggregator, SkippedFile,
};
pub use ignorelist::{Ignorelist, IgnorelistEntry, IgnorelistError, IgnorelistResult};
pub use parser::{parse_bytes, parse_file, parse_str, ParseError, ParseResult};
pub use quality_gate::{
    evaluate, percentage_executed, percentage_passing, GateError, GateOutcome, GateResult,
    QualityGateVerdict, QualityGates, Verdict,
};
pub use types::{AggregateCounts, ResultMetadata, TestCaseResult, TestState};

pub mod prelude {
    pub use crate::aggregator::*;
    pub use crate::ignorelist::*;
    pub use crate::parser::*;
    pub use crate::quality_gate::*;
    pub use crate::types::*;
}
