// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod record;
pub mod summary;

pub use record::{PathEntry, VerificationRecord};
pub use summary::{RunOutcome, RunReport, RunSummary};
