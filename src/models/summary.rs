// file: src/models/summary.rs
// description: run summary statistics and the final report of a pipeline run
// reference: derived metrics for run reporting

use crate::models::record::VerificationRecord;
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub total_checked: usize,
    pub total_missing: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub log_location: PathBuf,
}

impl RunSummary {
    pub fn from_records(
        records: &[VerificationRecord],
        elapsed: Duration,
        log_location: PathBuf,
    ) -> Self {
        Self {
            total_checked: records.len(),
            total_missing: records.iter().filter(|r| r.is_missing()).count(),
            elapsed,
            log_location,
        }
    }

    pub fn total_found(&self) -> usize {
        self.total_checked - self.total_missing
    }

    pub fn paths_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total_checked as f64 / secs
    }

    pub fn missing_rate(&self) -> f64 {
        if self.total_checked == 0 {
            return 0.0;
        }
        (self.total_missing as f64 / self.total_checked as f64) * 100.0
    }

    /// Elapsed time as `hh:mm:ss`.
    pub fn elapsed_hms(&self) -> String {
        let secs = self.elapsed.as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// How a run that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    /// Stopped on request; the report carries partial results.
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub summary: RunSummary,
    pub rows_scanned: usize,
    pub records: Vec<VerificationRecord>,
}

impl RunReport {
    pub fn is_cancelled(&self) -> bool {
        self.outcome == RunOutcome::Cancelled
    }

    pub fn missing(&self) -> impl Iterator<Item = &VerificationRecord> {
        self.records.iter().filter(|r| r.is_missing())
    }
}
