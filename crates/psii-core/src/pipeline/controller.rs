use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{PsiiError, Result};
use crate::fluorescence::{compute_baseline, compute_induction};
use crate::frame::{FramePair, GroupKey, Mask, RatioImage, SampleDay};
use crate::io::{Artifact, FramePairProvider, OutputSink};
use crate::objects::{locate, LocatedObjects};
use crate::roi::{assign, RoiAssignment};
use crate::segmentation::segment;
use crate::stats::{aggregate, to_rows, RoiStatRow, RoiStatistics};

use super::config::PipelineConfig;
use super::store::{Baseline, BaselineStore};

/// Runs single measurements: segmentation (baseline only), object location,
/// ROI assignment, ratio images, per-ROI statistics.
pub struct RunController<'a> {
    config: &'a PipelineConfig,
    store: &'a BaselineStore,
    sink: &'a dyn OutputSink,
}

impl<'a> RunController<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        store: &'a BaselineStore,
        sink: &'a dyn OutputSink,
    ) -> Self {
        Self {
            config,
            store,
            sink,
        }
    }

    pub fn store(&self) -> &BaselineStore {
        self.store
    }

    /// Process one measurement. Induction measurements fail with
    /// `MissingBaseline` until the session's FvFm measurement has run.
    pub fn process(&self, key: &GroupKey, pair: &FramePair) -> Result<Vec<RoiStatRow>> {
        if key.parameter != pair.parameter {
            return Err(PsiiError::InvalidConfig(format!(
                "frame pair for {} was requested as {}",
                pair.parameter, key
            )));
        }
        if pair.parameter.is_baseline() {
            self.run_baseline(key, pair)
        } else {
            self.run_induction(key, pair)
        }
    }

    fn run_baseline(&self, key: &GroupKey, pair: &FramePair) -> Result<Vec<RoiStatRow>> {
        let mask = segment(&pair.bright, &self.config.segmentation);
        let located = locate(&pair.bright, &mask)?;
        let assignments = self.assign_all(&located, pair.dim())?;

        let fluor = compute_baseline(&pair.dark, &pair.bright, &mask)?;

        let mut plant_mask = Mask::empty(pair.dim());
        for assignment in &assignments {
            plant_mask.union_with(&assignment.mask);
        }
        debug!(group = %key, plant_pixels = plant_mask.count(), "Baseline plant mask");

        self.sink.persist(key, Artifact::BaselineMask(&plant_mask))?;
        self.sink.persist(key, Artifact::FvFm(&fluor.yii))?;
        self.sink.persist(key, Artifact::Fmax(&pair.bright))?;
        self.store.insert(
            key.sample_day(),
            Baseline {
                mask: plant_mask,
                bright: pair.bright.clone(),
            },
        );

        Ok(self.summarize(key, pair, &fluor.yii, &fluor.npq, &assignments))
    }

    fn run_induction(&self, key: &GroupKey, pair: &FramePair) -> Result<Vec<RoiStatRow>> {
        let baseline = self.store.get(&key.sample_day())?;
        let located = locate(&pair.bright, &baseline.mask)?;
        let assignments = self.assign_all(&located, pair.dim())?;

        let fluor = compute_induction(&pair.dark, &pair.bright, &baseline.mask, &baseline.bright)?;

        self.sink.persist(key, Artifact::Yii(&fluor.yii))?;
        self.sink.persist(key, Artifact::Npq(&fluor.npq))?;

        Ok(self.summarize(key, pair, &fluor.yii, &fluor.npq, &assignments))
    }

    fn assign_all(
        &self,
        located: &LocatedObjects,
        dim: (usize, usize),
    ) -> Result<Vec<RoiAssignment>> {
        let rois = self.config.grid.define_within(dim)?;
        Ok(rois.iter().map(|roi| assign(located, roi)).collect())
    }

    fn summarize(
        &self,
        key: &GroupKey,
        pair: &FramePair,
        yii: &RatioImage,
        npq: &RatioImage,
        assignments: &[RoiAssignment],
    ) -> Vec<RoiStatRow> {
        let stats: Vec<RoiStatistics> = assignments
            .iter()
            .map(|a| aggregate(pair, yii, npq, a, self.config.pixel_resolution))
            .collect();
        to_rows(key, &stats)
    }
}

/// Progress of one (sample, day) session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    AwaitingBaseline,
    /// Baseline mask is stored; induction measurements may run.
    BaselineComputed,
    /// Number of induction measurements processed.
    InductionProcessed(usize),
    Complete,
}

/// Drives one session through its states: the FvFm measurement first, then
/// the induction measurements, which only read the stored baseline and so
/// run in parallel.
pub struct SessionRun<'c, 'a> {
    controller: &'c RunController<'a>,
    sample_day: SampleDay,
    state: RunState,
    rows: Vec<RoiStatRow>,
}

impl<'c, 'a> SessionRun<'c, 'a> {
    pub fn new(controller: &'c RunController<'a>, sample_day: SampleDay) -> Self {
        let state = if controller.store().contains(&sample_day) {
            RunState::BaselineComputed
        } else {
            RunState::AwaitingBaseline
        };
        Self {
            controller,
            sample_day,
            state,
            rows: Vec::new(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Process the FvFm measurement and store its plant mask.
    pub fn baseline(&mut self, key: &GroupKey, pair: &FramePair) -> Result<()> {
        if !pair.parameter.is_baseline() {
            return Err(PsiiError::InvalidConfig(format!(
                "{key} is not a baseline measurement"
            )));
        }
        let rows = self.controller.process(key, pair)?;
        self.rows.extend(rows);
        self.state = RunState::BaselineComputed;
        info!(
            sample = %self.sample_day.sample,
            day = %self.sample_day.day,
            "Baseline computed"
        );
        Ok(())
    }

    /// Process induction measurements, loading frames through `provider`.
    /// Rows keep the order of `keys`.
    ///
    /// Measurements fail one by one: a pair that cannot be loaded or
    /// measured is returned with its error while the rows of the others are
    /// kept. Only a missing baseline fails the whole call.
    pub fn induction(
        &mut self,
        keys: &[GroupKey],
        provider: &dyn FramePairProvider,
        on_done: &(dyn Fn() + Sync),
    ) -> Result<Vec<(GroupKey, PsiiError)>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        if self.state == RunState::AwaitingBaseline {
            return Err(PsiiError::MissingBaseline {
                sample: self.sample_day.sample.clone(),
                day: self.sample_day.day.clone(),
            });
        }

        let results: Vec<Result<Vec<RoiStatRow>>> = keys
            .par_iter()
            .map(|key| {
                let result = provider
                    .frame_pair(key)
                    .and_then(|pair| self.controller.process(key, &pair));
                on_done();
                result
            })
            .collect();

        let mut processed = 0;
        let mut failures = Vec::new();
        for (key, result) in keys.iter().zip(results) {
            match result {
                Ok(rows) => {
                    self.rows.extend(rows);
                    processed += 1;
                }
                Err(error) => {
                    warn!(group = %key, %error, "Measurement failed");
                    failures.push((key.clone(), error));
                }
            }
        }
        self.state = match self.state {
            RunState::InductionProcessed(n) => RunState::InductionProcessed(n + processed),
            _ => RunState::InductionProcessed(processed),
        };
        Ok(failures)
    }

    /// Close the session and hand back its rows.
    pub fn finish(&mut self) -> Vec<RoiStatRow> {
        self.state = RunState::Complete;
        debug!(
            sample = %self.sample_day.sample,
            day = %self.sample_day.day,
            rows = self.rows.len(),
            "Session finished"
        );
        std::mem::take(&mut self.rows)
    }
}
