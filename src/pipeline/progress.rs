// file: src/pipeline/progress.rs
// description: per-stage progress events, reporters and terminal progress bars
// reference: uses indicatif for progress bars and tokio channels for delivery

use crate::models::{PathEntry, VerificationRecord};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Reading,
    Verifying,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Reading => f.write_str("reading"),
            Stage::Verifying => f.write_str("verifying"),
        }
    }
}

/// One unit of stage progress. `latest` holds only the items produced
/// since the previous event; `items_so_far` is the running total.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent<T> {
    pub stage: Stage,
    pub percentage_completed: u8,
    pub items_so_far: usize,
    pub latest: Vec<T>,
}

/// `floor(completed * 100 / total)`, with an empty workload counted as done.
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed.min(total) * 100) / total) as u8
}

/// Publishing side of one stage's progress channel. Owned by the stage that
/// is currently running, so events leave in order.
pub struct ProgressReporter<T> {
    stage: Stage,
    sender: Option<UnboundedSender<ProgressEvent<T>>>,
    last_percentage: u8,
    events_sent: usize,
}

impl<T> ProgressReporter<T> {
    pub fn new(stage: Stage, sender: Option<UnboundedSender<ProgressEvent<T>>>) -> Self {
        Self {
            stage,
            sender,
            last_percentage: 0,
            events_sent: 0,
        }
    }

    pub fn disabled(stage: Stage) -> Self {
        Self::new(stage, None)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn report(&mut self, completed: usize, total: usize, items_so_far: usize, latest: Vec<T>) {
        let pct = percentage(completed, total).max(self.last_percentage);
        self.publish(pct, items_so_far, latest);
    }

    /// Publishes a final 100% event.
    pub fn complete(&mut self, items_so_far: usize) {
        self.publish(100, items_so_far, Vec::new());
    }

    pub fn last_percentage(&self) -> u8 {
        self.last_percentage
    }

    pub fn events_sent(&self) -> usize {
        self.events_sent
    }

    fn publish(&mut self, pct: u8, items_so_far: usize, latest: Vec<T>) {
        self.last_percentage = pct;
        self.events_sent += 1;

        if let Some(sender) = &self.sender {
            // A closed receiver means nobody is watching any more.
            let _ = sender.send(ProgressEvent {
                stage: self.stage,
                percentage_completed: pct,
                items_so_far,
                latest,
            });
        }
    }
}

/// Sending halves handed to the coordinator for one run.
#[derive(Default)]
pub struct ProgressSenders {
    pub reading: Option<UnboundedSender<ProgressEvent<PathEntry>>>,
    pub verifying: Option<UnboundedSender<ProgressEvent<VerificationRecord>>>,
}

impl ProgressSenders {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Receiving halves kept by the caller.
pub struct ProgressReceivers {
    pub reading: UnboundedReceiver<ProgressEvent<PathEntry>>,
    pub verifying: UnboundedReceiver<ProgressEvent<VerificationRecord>>,
}

pub fn progress_channels() -> (ProgressSenders, ProgressReceivers) {
    let (reading_tx, reading_rx) = unbounded_channel();
    let (verifying_tx, verifying_rx) = unbounded_channel();

    (
        ProgressSenders {
            reading: Some(reading_tx),
            verifying: Some(verifying_tx),
        },
        ProgressReceivers {
            reading: reading_rx,
            verifying: verifying_rx,
        },
    )
}

/// Terminal rendering of both stage channels.
pub struct ProgressTracker {
    reading_bar: ProgressBar,
    verifying_bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let reading_bar = create_stage_bar(&multi_progress, "Reading the file", colored);
        let verifying_bar = create_stage_bar(&multi_progress, "Checking filepaths", colored);

        Self {
            reading_bar,
            verifying_bar,
        }
    }

    pub fn hidden() -> Self {
        Self {
            reading_bar: ProgressBar::hidden(),
            verifying_bar: ProgressBar::hidden(),
        }
    }

    /// Drains both channels until their senders are dropped.
    pub async fn drive(self, mut receivers: ProgressReceivers) {
        let mut reading_open = true;
        let mut verifying_open = true;

        while reading_open || verifying_open {
            tokio::select! {
                event = receivers.reading.recv(), if reading_open => match event {
                    Some(event) => self.on_reading(&event),
                    None => reading_open = false,
                },
                event = receivers.verifying.recv(), if verifying_open => match event {
                    Some(event) => self.on_verifying(&event),
                    None => verifying_open = false,
                },
            }
        }

        self.finish();
    }

    pub fn on_reading(&self, event: &ProgressEvent<PathEntry>) {
        self.reading_bar
            .set_position(u64::from(event.percentage_completed));
        self.reading_bar
            .set_message(format!("{} paths found", event.items_so_far));
    }

    pub fn on_verifying(&self, event: &ProgressEvent<VerificationRecord>) {
        self.verifying_bar
            .set_position(u64::from(event.percentage_completed));
        if let Some(record) = event.latest.iter().rev().find(|r| r.is_missing()) {
            self.verifying_bar
                .set_message(format!("missing: {}", record.path));
        }
    }

    pub fn finish(&self) {
        self.reading_bar.abandon();
        self.verifying_bar.abandon();
    }
}

fn create_stage_bar(multi_progress: &MultiProgress, label: &str, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(100));
    let template = if colored {
        "{prefix:.bold} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}"
    } else {
        "{prefix} [{elapsed_precise}] [{bar:40}] {pos:>3}% {msg}"
    };

    bar.set_style(
        ProgressStyle::default_bar()
            .template(template)
            .expect("Failed to create progress bar template")
            .progress_chars(if colored { "█▓▒░" } else { "=>-" }),
    );

    let prefix = format!("{:<18}", label);
    bar.set_prefix(if colored {
        prefix.cyan().to_string()
    } else {
        prefix
    });
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_percentage_floors() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 66);
        assert_eq!(percentage(3, 3), 100);
    }

    #[test]
    fn test_percentage_empty_total_is_complete() {
        assert_eq!(percentage(0, 0), 100);
    }

    #[test]
    fn test_percentage_clamps_overshoot() {
        assert_eq!(percentage(7, 5), 100);
    }

    #[test]
    fn test_reporter_is_monotonic() {
        let (tx, mut rx) = unbounded_channel();
        let mut reporter = ProgressReporter::<PathEntry>::new(Stage::Reading, Some(tx));

        reporter.report(2, 4, 2, vec![]);
        reporter.report(1, 4, 2, vec![]);
        reporter.report(4, 4, 3, vec![PathEntry::from("c")]);
        drop(reporter);

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event.percentage_completed);
        }
        assert_eq!(seen, vec![50, 50, 100]);
    }

    #[test]
    fn test_reporter_without_receiver_does_not_fail() {
        let (tx, rx) = unbounded_channel::<ProgressEvent<PathEntry>>();
        drop(rx);

        let mut reporter = ProgressReporter::new(Stage::Reading, Some(tx));
        reporter.complete(0);
        assert_eq!(reporter.last_percentage(), 100);
        assert_eq!(reporter.events_sent(), 1);
    }

    #[tokio::test]
    async fn test_tracker_drains_until_senders_drop() {
        let (senders, receivers) = progress_channels();
        let mut reading = ProgressReporter::new(Stage::Reading, senders.reading);
        let mut verifying = ProgressReporter::new(Stage::Verifying, senders.verifying);

        reading.complete(3);
        verifying.report(1, 2, 1, vec![VerificationRecord::new(PathEntry::from("x"), false)]);
        drop(reading);
        drop(verifying);

        ProgressTracker::hidden().drive(receivers).await;
    }

    #[test]
    fn test_channels_deliver_events_in_order() {
        let (senders, mut receivers) = progress_channels();
        let mut reading = ProgressReporter::new(Stage::Reading, senders.reading);

        reading.report(1, 2, 1, vec![PathEntry::from("/a")]);
        reading.complete(1);
        drop(reading);

        let events = tokio_test::block_on(async {
            let mut events = Vec::new();
            while let Some(event) = receivers.reading.recv().await {
                events.push(event);
            }
            events
        });

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].latest, vec![PathEntry::from("/a")]);
        assert_eq!(events[1].percentage_completed, 100);
        assert!(events[1].latest.is_empty());
    }
}
