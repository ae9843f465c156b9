use crate::error::PsiiError;
use crate::frame::{GroupKey, Parameter, SampleDay};
use crate::stats::RoiStatRow;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Reading,
    Measuring,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading manifest"),
            Self::Measuring => write!(f, "Measuring plants"),
            Self::Writing => write!(f, "Writing table"),
        }
    }
}

/// All measurements of one tray on one day.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleDayGroup {
    pub treatment: String,
    pub sample_day: SampleDay,
    /// Measurements in processing order; `FvFm` first when present.
    pub parameters: Vec<Parameter>,
}

impl SampleDayGroup {
    pub fn key(&self, parameter: &Parameter) -> GroupKey {
        GroupKey {
            treatment: self.treatment.clone(),
            sample: self.sample_day.sample.clone(),
            day: self.sample_day.day.clone(),
            parameter: parameter.clone(),
        }
    }

    /// The baseline measurement, if the session has one.
    pub fn baseline_key(&self) -> Option<GroupKey> {
        self.parameters
            .iter()
            .find(|p| p.is_baseline())
            .map(|p| self.key(p))
    }

    /// Every induction measurement, in order.
    pub fn induction_keys(&self) -> Vec<GroupKey> {
        self.parameters
            .iter()
            .filter(|p| !p.is_baseline())
            .map(|p| self.key(p))
            .collect()
    }
}

/// A measurement, or a whole session, that failed.
#[derive(Debug)]
pub struct GroupFailure {
    pub treatment: String,
    pub sample_day: SampleDay,
    /// The failed measurement; `None` when the session as a whole failed.
    pub parameter: Option<Parameter>,
    pub error: PsiiError,
}

impl GroupFailure {
    /// Failure of a single measurement.
    pub fn measurement(key: &GroupKey, error: PsiiError) -> Self {
        Self {
            treatment: key.treatment.clone(),
            sample_day: key.sample_day(),
            parameter: Some(key.parameter.clone()),
            error,
        }
    }
}

/// Rows of every measurement that completed, plus those that did not.
#[derive(Debug, Default)]
pub struct BatchOutput {
    pub rows: Vec<RoiStatRow>,
    pub failures: Vec<GroupFailure>,
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., measurement count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
