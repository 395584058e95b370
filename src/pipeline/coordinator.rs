// file: src/pipeline/coordinator.rs
// description: sequences extraction, verification and logging for one run
// reference: orchestrates the asynchronous check workflow

use crate::config::Config;
use crate::error::{CheckerError, Result};
use crate::models::{RunOutcome, RunReport, RunSummary, VerificationRecord};
use crate::pipeline::progress::{ProgressReporter, ProgressSenders, Stage};
use crate::report::MissLogger;
use crate::spreadsheet::{ColumnExtractor, ColumnRef};
use crate::utils::StageTimer;
use crate::verifier::{ExistenceProbe, ExistenceVerifier};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Reading,
    Verifying,
    Done,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Reading | RunState::Verifying)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Reading => "reading",
            RunState::Verifying => "verifying",
            RunState::Done => "done",
            RunState::Cancelled => "cancelled",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub spreadsheet: PathBuf,
    pub column: String,
}

impl RunRequest {
    pub fn new(spreadsheet: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self {
            spreadsheet: spreadsheet.into(),
            column: column.into(),
        }
    }
}

/// External stop control. Cancels whichever run is current; calling it
/// repeatedly, or after the run finished, has no further effect. A cancel
/// issued before a run has entered `Reading` belongs to the previous run.
#[derive(Clone)]
pub struct CancelHandle {
    current: Arc<Mutex<CancellationToken>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.current.lock().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.current.lock().is_cancelled()
    }
}

pub struct PipelineCoordinator {
    config: Config,
    probe: Option<ExistenceProbe>,
    current: Arc<Mutex<CancellationToken>>,
    state: watch::Sender<RunState>,
}

struct StageResults {
    outcome: RunOutcome,
    rows_scanned: usize,
    records: Vec<VerificationRecord>,
}

impl PipelineCoordinator {
    pub fn new(config: Config) -> Self {
        let (state, _) = watch::channel(RunState::Idle);

        Self {
            config,
            probe: None,
            current: Arc::new(Mutex::new(CancellationToken::new())),
            state,
        }
    }

    /// Replaces the filesystem probe used by the verifier.
    pub fn with_probe(mut self, probe: ExistenceProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            current: self.current.clone(),
        }
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Runs the whole pipeline. Returns a report for completed and cancelled
    /// runs; fatal errors end the run in `Failed` and are returned as-is.
    /// Input errors leave the state untouched.
    pub async fn run(&self, request: RunRequest, progress: ProgressSenders) -> Result<RunReport> {
        let column = ColumnRef::parse(&request.column)?;
        let cancel = self.begin()?;
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);

        self.execute(run_id, request, column, cancel, progress)
            .instrument(span)
            .await
    }

    /// Claims the coordinator for a new run. The active-run check, the
    /// token swap and the move to `Reading` happen under the state lock, so
    /// two runs cannot both start and any cancel issued once `Reading` is
    /// observable reaches the new run.
    fn begin(&self) -> Result<CancellationToken> {
        let cancel = CancellationToken::new();
        let mut previous = None;

        self.state.send_if_modified(|state| {
            if state.is_active() {
                return false;
            }
            *self.current.lock() = cancel.clone();
            previous = Some(*state);
            *state = RunState::Reading;
            true
        });

        match previous {
            Some(previous) => {
                info!("State {} -> {}", previous, RunState::Reading);
                Ok(cancel)
            }
            None => Err(CheckerError::InvalidInput(
                "A run is already in progress".to_string(),
            )),
        }
    }

    async fn execute(
        &self,
        run_id: Uuid,
        request: RunRequest,
        column: ColumnRef,
        cancel: CancellationToken,
        progress: ProgressSenders,
    ) -> Result<RunReport> {
        let started = Instant::now();

        info!(
            "Checking column {} of {}",
            column,
            request.spreadsheet.display()
        );

        let logger = match MissLogger::create(&self.config.log) {
            Ok(logger) => logger,
            Err(e) => return Err(self.fail(e)),
        };

        let staged = self
            .run_stages(&request, &column, &cancel, &logger, progress)
            .await;
        let closed = logger.close();

        let staged = match (staged, closed) {
            (Err(e), _) => {
                if let Err(cleanup) = logger.discard_if_empty() {
                    warn!(
                        "Could not remove empty miss log {}: {}",
                        logger.path().display(),
                        cleanup
                    );
                }
                return Err(self.fail(e));
            }
            (Ok(_), Err(e)) => return Err(self.fail(e)),
            (Ok(staged), Ok(())) => staged,
        };

        let summary = RunSummary::from_records(
            &staged.records,
            started.elapsed(),
            logger.path().to_path_buf(),
        );

        self.transition(match staged.outcome {
            RunOutcome::Completed => RunState::Done,
            RunOutcome::Cancelled => RunState::Cancelled,
        });

        info!(
            "Run {}: {} checked, {} missing in {:.2}s",
            self.state(),
            summary.total_checked,
            summary.total_missing,
            summary.elapsed.as_secs_f64()
        );

        Ok(RunReport {
            run_id,
            outcome: staged.outcome,
            summary,
            rows_scanned: staged.rows_scanned,
            records: staged.records,
        })
    }

    async fn run_stages(
        &self,
        request: &RunRequest,
        column: &ColumnRef,
        cancel: &CancellationToken,
        logger: &MissLogger,
        progress: ProgressSenders,
    ) -> Result<StageResults> {
        let timer = StageTimer::start(Stage::Reading);
        let extractor = ColumnExtractor::new(self.config.extraction.clone());
        let mut reading = ProgressReporter::new(Stage::Reading, progress.reading);
        let extraction = {
            let path = request.spreadsheet.clone();
            let column = column.clone();
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || {
                extractor.extract(&path, &column, &cancel, &mut reading)
            })
            .await
            .map_err(|e| CheckerError::Task(format!("Extraction task failed: {}", e)))??
        };
        timer.finish(extraction.entries.len());

        if extraction.cancelled && extraction.entries.is_empty() {
            return Ok(StageResults {
                outcome: RunOutcome::Cancelled,
                rows_scanned: extraction.rows_scanned,
                records: Vec::new(),
            });
        }

        self.transition(RunState::Verifying);

        let timer = StageTimer::start(Stage::Verifying);
        let mut verifier = ExistenceVerifier::new(&self.config.verification);
        if let Some(probe) = &self.probe {
            verifier = verifier.with_probe(probe.clone());
        }
        let mut verifying = ProgressReporter::new(Stage::Verifying, progress.verifying);
        let verification = verifier
            .verify(extraction.entries, cancel, logger, &mut verifying)
            .await?;
        timer.finish(verification.records.len());

        let outcome = if extraction.cancelled || verification.cancelled {
            RunOutcome::Cancelled
        } else {
            RunOutcome::Completed
        };

        Ok(StageResults {
            outcome,
            rows_scanned: extraction.rows_scanned,
            records: verification.records,
        })
    }

    fn transition(&self, next: RunState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!("State {} -> {}", previous, next);
        }
    }

    fn fail(&self, err: CheckerError) -> CheckerError {
        error!("Run failed: {}", err);
        self.transition(RunState::Failed);
        err
    }
}

impl Drop for PipelineCoordinator {
    fn drop(&mut self) {
        if self.state().is_active() {
            warn!("Coordinator dropped during an active run; cancelling");
            self.current.lock().cancel();
        }
    }
}
