// file: src/verifier/existence.rs
// description: checks extracted paths against the filesystem with bounded concurrency
// reference: asynchronous fan-out over blocking filesystem probes

use crate::config::VerificationConfig;
use crate::error::Result;
use crate::models::{PathEntry, VerificationRecord};
use crate::pipeline::progress::ProgressReporter;
use crate::report::MissLogger;
use futures::stream::{self, BoxStream, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Answers "does this path exist?" for one literal path string. Any error
/// along the way (permission denied, malformed path) must be reported as
/// `false`.
pub type ExistenceProbe = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Probe backed by a filesystem stat. When `require_regular_file` is set,
/// directories do not count as existing.
pub fn filesystem_probe(require_regular_file: bool) -> ExistenceProbe {
    Arc::new(move |path: &str| match std::fs::metadata(Path::new(path)) {
        Ok(metadata) => !require_regular_file || metadata.is_file(),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("Treating {} as missing: {}", path, e);
            }
            false
        }
    })
}

#[derive(Debug, Default)]
pub struct Verification {
    pub records: Vec<VerificationRecord>,
    pub cancelled: bool,
}

impl Verification {
    pub fn missing_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_missing()).count()
    }
}

pub struct ExistenceVerifier {
    workers: usize,
    preserve_order: bool,
    probe: ExistenceProbe,
}

impl ExistenceVerifier {
    pub fn new(config: &VerificationConfig) -> Self {
        Self {
            workers: config.effective_workers(),
            preserve_order: config.preserve_order,
            probe: filesystem_probe(config.require_regular_file),
        }
    }

    pub fn with_probe(mut self, probe: ExistenceProbe) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Produces one record per non-blank entry. Missing paths are appended
    /// to `logger` as soon as they are seen, so a cancelled run still leaves
    /// a log covering exactly the paths that were processed. Checks still
    /// running when the token trips are dropped without a record.
    pub async fn verify(
        &self,
        entries: Vec<PathEntry>,
        cancel: &CancellationToken,
        logger: &MissLogger,
        progress: &mut ProgressReporter<VerificationRecord>,
    ) -> Result<Verification> {
        let candidates: Vec<PathEntry> = entries.into_iter().filter(|e| !e.is_blank()).collect();
        let total = candidates.len();

        if total == 0 {
            progress.complete(0);
            return Ok(Verification {
                records: Vec::new(),
                cancelled: cancel.is_cancelled(),
            });
        }

        info!(
            "Checking {} paths with {} workers{}",
            total,
            self.workers,
            if self.preserve_order { " (ordered)" } else { "" }
        );

        let mut checks = self.checks(candidates, cancel.clone());
        let mut records = Vec::with_capacity(total);
        let mut cancelled = false;

        loop {
            // In-flight probes are abandoned as soon as the token trips.
            let checked = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                checked = checks.next() => checked,
            };

            let Some(checked) = checked else {
                break;
            };

            let Some(record) = checked else {
                continue;
            };

            if record.is_missing() {
                logger.append(record.path.as_str())?;
            }

            records.push(record.clone());
            progress.report(records.len(), total, records.len(), vec![record]);
        }

        if cancelled {
            info!("Verification cancelled after {} of {} paths", records.len(), total);
        }

        Ok(Verification { records, cancelled })
    }

    fn checks(
        &self,
        candidates: Vec<PathEntry>,
        cancel: CancellationToken,
    ) -> BoxStream<'static, Option<VerificationRecord>> {
        let probe = self.probe.clone();

        let checks = stream::iter(candidates).map(move |entry| {
            let probe = probe.clone();
            let cancel = cancel.clone();

            async move {
                if cancel.is_cancelled() {
                    return None;
                }

                let path = entry.as_str().to_string();
                let exists = match tokio::task::spawn_blocking(move || probe(&path)).await {
                    Ok(exists) => exists,
                    Err(e) => {
                        warn!("Existence check for {} did not complete: {}", entry, e);
                        false
                    }
                };

                Some(VerificationRecord::new(entry, exists))
            }
        });

        if self.preserve_order {
            checks.buffered(self.workers).boxed()
        } else {
            checks.buffer_unordered(self.workers).boxed()
        }
    }
}
