// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod coordinator;
pub mod progress;

pub use coordinator::{CancelHandle, PipelineCoordinator, RunRequest, RunState};
pub use progress::{
    ProgressEvent, ProgressReceivers, ProgressReporter, ProgressSenders, ProgressTracker, Stage,
    progress_channels,
};
