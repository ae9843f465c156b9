use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{PsiiError, Result};
use crate::frame::GroupKey;
use crate::io::table::write_table;
use crate::io::{FramePairProvider, FsSink, Manifest, OutputSink};
use crate::stats::RoiStatRow;

use super::config::PipelineConfig;
use super::controller::{RunController, SessionRun};
use super::store::BaselineStore;
use super::types::{
    BatchOutput, GroupFailure, NoOpReporter, PipelineStage, ProgressReporter, SampleDayGroup,
};

/// Run every session of a batch.
///
/// Sessions are independent and run in parallel. Within a session the FvFm
/// measurement completes, and its mask is stored, before any induction
/// measurement starts. Failures are reported in [`BatchOutput::failures`]:
/// a failing induction measurement only drops its own rows, a failing or
/// missing baseline drops its session. Neither stops the other sessions. Rows come back in
/// the order of `groups`.
pub fn run_batch(
    groups: &[SampleDayGroup],
    provider: &dyn FramePairProvider,
    config: &PipelineConfig,
    store: &BaselineStore,
    sink: &dyn OutputSink,
    reporter: &dyn ProgressReporter,
) -> BatchOutput {
    let controller = RunController::new(config, store, sink);
    let done = AtomicUsize::new(0);
    let on_done = || {
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        reporter.advance(n);
    };

    let results: Vec<Result<SessionOutcome>> = groups
        .par_iter()
        .map(|group| run_session(&controller, provider, group, &on_done))
        .collect();

    let mut output = BatchOutput::default();
    for (group, result) in groups.iter().zip(results) {
        match result {
            Ok(outcome) => {
                output.rows.extend(outcome.rows);
                output.failures.extend(
                    outcome
                        .failures
                        .into_iter()
                        .map(|(key, error)| GroupFailure::measurement(&key, error)),
                );
            }
            Err(error) => {
                warn!(
                    treatment = %group.treatment,
                    sample = %group.sample_day.sample,
                    day = %group.sample_day.day,
                    %error,
                    "Session failed"
                );
                output.failures.push(GroupFailure {
                    treatment: group.treatment.clone(),
                    sample_day: group.sample_day.clone(),
                    parameter: None,
                    error,
                });
            }
        }
    }
    output
}

struct SessionOutcome {
    rows: Vec<RoiStatRow>,
    failures: Vec<(GroupKey, PsiiError)>,
}

/// A failing baseline fails the session; induction measurements fail
/// individually.
fn run_session(
    controller: &RunController<'_>,
    provider: &dyn FramePairProvider,
    group: &SampleDayGroup,
    on_done: &(dyn Fn() + Sync),
) -> Result<SessionOutcome> {
    let mut session = SessionRun::new(controller, group.sample_day.clone());
    if let Some(key) = group.baseline_key() {
        let pair = provider.frame_pair(&key)?;
        session.baseline(&key, &pair)?;
        on_done();
    }
    let failures = session.induction(&group.induction_keys(), provider, on_done)?;
    Ok(SessionOutcome {
        rows: session.finish(),
        failures,
    })
}

/// Run the full pipeline on a manifest with a thread-safe progress reporter:
/// load the manifest, measure every session, write the statistics table.
pub fn run_pipeline_reported(
    manifest_path: &Path,
    config: &PipelineConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BatchOutput> {
    config.validate()?;

    reporter.begin_stage(PipelineStage::Reading, None);
    let manifest = Manifest::load(manifest_path)?;
    reporter.finish_stage();

    let sink = FsSink::new(&config.output.dir, config.output.write_images)?;
    let store = BaselineStore::new();
    let total: usize = manifest.groups().iter().map(|g| g.parameters.len()).sum();
    info!(
        sessions = manifest.groups().len(),
        measurements = total,
        output = %config.output.dir.display(),
        "Processing measurements"
    );

    reporter.begin_stage(PipelineStage::Measuring, Some(total));
    let output = run_batch(
        manifest.groups(),
        &manifest,
        config,
        &store,
        &sink,
        reporter.as_ref(),
    );
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Writing, None);
    let table = config.output.table_path();
    write_table(&output.rows, &table)?;
    reporter.finish_stage();
    info!(rows = output.rows.len(), path = %table.display(), "Wrote statistics table");

    Ok(output)
}

/// Run the full pipeline without progress reporting.
pub fn run_pipeline(manifest_path: &Path, config: &PipelineConfig) -> Result<BatchOutput> {
    run_pipeline_reported(manifest_path, config, Arc::new(NoOpReporter))
}
