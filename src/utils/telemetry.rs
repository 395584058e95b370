// file: src/utils/telemetry.rs
// description: stage timing and throughput logging
// reference: structured tracing fields

use crate::pipeline::progress::Stage;
use std::time::{Duration, Instant};
use tracing::info;

/// Times one pipeline stage and logs its throughput when finished.
pub struct StageTimer {
    stage: Stage,
    start: Instant,
}

impl StageTimer {
    pub fn start(stage: Stage) -> Self {
        info!(stage = %stage, "Stage started");
        Self {
            stage,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self, items: usize) -> Duration {
        let elapsed = self.elapsed();
        info!(
            stage = %self.stage,
            items,
            elapsed_ms = elapsed.as_millis() as u64,
            rate = format_args!("{:.2}/s", throughput(items, elapsed)),
            "Stage finished"
        );
        elapsed
    }
}

pub fn throughput(items: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { items as f64 / secs } else { 0.0 }
}
