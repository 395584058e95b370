// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns

//! Reads one column of an Excel workbook, checks that every path listed in
//! it exists and writes a `;`-delimited log of the ones that do not.

pub mod config;
pub mod error;
pub mod exporter;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod spreadsheet;
pub mod utils;
pub mod verifier;

pub use config::{Config, ExtractionConfig, LogConfig, VerificationConfig};
pub use error::{CheckerError, Result};
pub use exporter::JsonExporter;
pub use models::{PathEntry, RunOutcome, RunReport, RunSummary, VerificationRecord};
pub use pipeline::{
    CancelHandle, PipelineCoordinator, ProgressSenders, ProgressTracker, RunRequest, RunState,
    progress_channels,
};
pub use report::MissLogger;
pub use spreadsheet::{ColumnExtractor, ColumnRef, WorkbookPackage};
pub use utils::{StageTimer, Validator};
pub use verifier::{ExistenceProbe, ExistenceVerifier};
