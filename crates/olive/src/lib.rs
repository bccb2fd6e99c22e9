mod artifact;
mod error;
mod report;
mod workflow;

pub use artifact::{
    DATA_PREFIX, ProcessedArtifact, RESULTS_PREFIX, UtteranceRow, data_key, key_basename,
    processed_results_name, raw_results_name, results_key, short_stem,
};
pub use error::Error;
pub use report::{EngineReport, REPORT_PREAMBLE_LINES, parse_report};
pub use workflow::Engine;
