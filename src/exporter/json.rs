// file: src/exporter/json.rs
// description: json export of finished run reports

use crate::error::Result;
use crate::models::{PathEntry, RunOutcome, RunReport, RunSummary};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ExportedReport<'a> {
    pub exported_at: String,
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub rows_scanned: usize,
    #[serde(flatten)]
    pub summary: &'a RunSummary,
    pub missing: Vec<&'a PathEntry>,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes `run-<run_id>.json` and returns its path.
    pub fn export_report(&self, report: &RunReport, pretty: bool) -> Result<PathBuf> {
        let exported = ExportedReport {
            exported_at: Utc::now().to_rfc3339(),
            run_id: report.run_id,
            outcome: report.outcome,
            rows_scanned: report.rows_scanned,
            summary: &report.summary,
            missing: report.missing().map(|r| &r.path).collect(),
        };

        let json = if pretty {
            serde_json::to_string_pretty(&exported)?
        } else {
            serde_json::to_string(&exported)?
        };

        let path = self.output_dir.join(format!("run-{}.json", report.run_id));
        fs::write(&path, json)?;

        info!(
            "Exported report for run {} ({} missing) to {}",
            report.run_id,
            exported.missing.len(),
            path.display()
        );
        Ok(path)
    }
}
