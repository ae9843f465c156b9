pub mod config;
mod controller;
mod orchestrator;
mod store;
mod types;

pub use config::{OutputConfig, PipelineConfig};
pub use controller::{RunController, RunState, SessionRun};
pub use orchestrator::{run_batch, run_pipeline, run_pipeline_reported};
pub use store::{Baseline, BaselineStore};
pub use types::{
    BatchOutput, GroupFailure, PipelineStage, ProgressReporter, SampleDayGroup,
};
