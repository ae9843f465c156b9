#[allow(dead_code)]
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use approx::assert_relative_eq;
use tempfile::tempdir;

use psii_core::error::PsiiError;
use psii_core::frame::{FrameKind, Parameter};
use psii_core::io::image_io::{load_mask, save_frame_tiff};
use psii_core::io::table::write_rows;
use psii_core::io::{FramePairProvider, MemorySink};
use psii_core::pipeline::{
    run_batch, run_pipeline, BaselineStore, PipelineStage, ProgressReporter, RunController,
    RunState, SampleDayGroup, SessionRun,
};
use psii_core::stats::RoiStatRow;

use common::MemoryProvider;

struct CountingReporter {
    done: AtomicUsize,
}

impl ProgressReporter for CountingReporter {
    fn advance(&self, items_done: usize) {
        self.done.fetch_max(items_done, Ordering::Relaxed);
    }
}

fn run(
    provider: &MemoryProvider,
    groups: &[SampleDayGroup],
) -> (psii_core::pipeline::BatchOutput, MemorySink) {
    let config = common::small_config();
    let store = BaselineStore::new();
    let sink = MemorySink::new();
    let reporter = CountingReporter {
        done: AtomicUsize::new(0),
    };
    let output = run_batch(groups, provider, &config, &store, &sink, &reporter);
    (output, sink)
}

fn csv_bytes(rows: &[RoiStatRow]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_rows(rows, &mut buf).unwrap();
    buf
}

#[test]
fn test_session_produces_two_rows_per_roi_per_measurement() {
    let (provider, groups) = MemoryProvider::sessions(&["tray1"]);
    let (output, _) = run(&provider, &groups);

    assert!(output.failures.is_empty(), "{:?}", output.failures);
    let rois = common::small_grid().len();
    assert_eq!(output.rows.len(), 2 * 2 * rois);

    let baseline: Vec<_> = output.rows.iter().filter(|r| r.parameter == "FvFm").collect();
    let light: Vec<_> = output.rows.iter().filter(|r| r.parameter == "t300_ALon").collect();
    assert_eq!(baseline.len(), 2 * rois);
    assert_eq!(light.len(), 2 * rois);
    // Baseline rows come first.
    assert_eq!(output.rows[0].parameter, "FvFm");
}

#[test]
fn test_baseline_statistics_match_synthetic_plants() {
    let (provider, groups) = MemoryProvider::sessions(&["tray1"]);
    let (output, _) = run(&provider, &groups);

    let rows: Vec<_> = output.rows.iter().filter(|r| r.parameter == "FvFm").collect();
    for i in 0..3 {
        let dark = rows[2 * i];
        let bright = rows[2 * i + 1];
        assert_eq!(dark.roi, i);
        assert_eq!(dark.frame, FrameKind::Fo);
        assert_eq!(bright.frame, FrameKind::Fm);

        let fo = 1000.0 + 50.0 * i as f64;
        let fm = 3000.0 + 100.0 * i as f64;
        assert_relative_eq!(dark.frame_avg, fo);
        assert_relative_eq!(bright.frame_avg, fm);
        assert_relative_eq!(dark.yii_avg, (fm - fo) / fm, epsilon = 1e-6);
        assert_relative_eq!(dark.yii_std, 0.0, epsilon = 1e-6);
        assert_eq!(dark.npq_avg, 0.0);
        assert!(dark.plantarea > 0.0);
        assert_eq!(dark.plantarea, bright.plantarea);
        assert_eq!(dark.obj_in_frame, Some(true));
        assert!(dark.unique_roi);
    }

    let empty: Vec<_> = rows.iter().filter(|r| r.roi == 3).collect();
    assert_eq!(empty.len(), 2);
    for row in empty {
        assert!(row.yii_avg.is_nan());
        assert!(row.npq_avg.is_nan());
        assert!(row.frame_avg.is_nan());
        assert_eq!(row.plantarea, 0.0);
        assert_eq!(row.obj_in_frame, None);
    }
}

#[test]
fn test_induction_reuses_baseline_mask_and_fm() {
    let (provider, groups) = MemoryProvider::sessions(&["tray1"]);
    let (output, sink) = run(&provider, &groups);

    let baseline: Vec<_> = output.rows.iter().filter(|r| r.parameter == "FvFm").collect();
    let light: Vec<_> = output.rows.iter().filter(|r| r.parameter == "t300_ALon").collect();
    for i in 0..3 {
        let row = light[2 * i];
        assert_eq!(row.frame, FrameKind::Fp);
        assert_eq!(light[2 * i + 1].frame, FrameKind::Fmp);
        // Same plant mask as the baseline measurement.
        assert_eq!(row.plantarea, baseline[2 * i].plantarea);

        let fmp = 2000.0 + 100.0 * i as f64;
        let fm = 3000.0 + 100.0 * i as f64;
        assert_relative_eq!(row.yii_avg, (fmp - 1200.0) / fmp, epsilon = 1e-6);
        assert_relative_eq!(row.npq_avg, fm / fmp - 1.0, epsilon = 1e-6);
    }

    let baseline_key = common::key("tray1", Parameter::Baseline);
    let mask = sink.mask(&baseline_key).expect("baseline mask persisted");
    let plant_px: f64 = baseline
        .iter()
        .filter(|r| r.frame == FrameKind::Fo)
        .map(|r| r.plantarea / (0.35 * 0.35))
        .sum();
    assert_relative_eq!(mask.count() as f64, plant_px, epsilon = 1e-6);

    let written = sink.written();
    let stem = baseline_key.file_stem();
    assert!(written.contains(&(stem.clone(), "mask")));
    assert!(written.contains(&(stem.clone(), "fvfm")));
    assert!(written.contains(&(stem, "fmax")));
    let light_stem = common::key("tray1", common::induction()).file_stem();
    assert!(written.contains(&(light_stem.clone(), "yii")));
    assert!(written.contains(&(light_stem, "npq")));
}

#[test]
fn test_missing_baseline_fails_only_that_session() {
    let (provider, mut groups) = MemoryProvider::sessions(&["tray1", "tray2"]);
    groups[1].parameters.retain(|p| !p.is_baseline());

    let (output, _) = run(&provider, &groups);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].sample_day.sample, "tray2");
    assert_eq!(output.failures[0].parameter, None);
    assert!(matches!(
        output.failures[0].error,
        PsiiError::MissingBaseline { .. }
    ));
    assert!(output.rows.iter().all(|r| r.sample == "tray1"));
    assert_eq!(output.rows.len(), 2 * 2 * common::small_grid().len());
}

#[test]
fn test_unreadable_induction_pair_keeps_sibling_rows() {
    let (provider, mut groups) = MemoryProvider::sessions(&["tray1"]);
    let missing = Parameter::Induction("t40_ALon".into());
    groups[0].parameters.push(missing.clone());

    let (output, sink) = run(&provider, &groups);
    assert_eq!(output.failures.len(), 1);
    let failure = &output.failures[0];
    assert_eq!(failure.parameter, Some(missing));
    assert!(matches!(
        failure.error,
        PsiiError::IncompleteFramePair { .. }
    ));

    // Baseline and the readable induction measurement survive.
    let rois = common::small_grid().len();
    assert_eq!(output.rows.len(), 2 * 2 * rois);
    assert!(output.rows.iter().any(|r| r.parameter == "FvFm"));
    assert!(output.rows.iter().any(|r| r.parameter == "t300_ALon"));
    assert!(output.rows.iter().all(|r| r.parameter != "t40_ALon"));
    assert!(sink.mask(&common::key("tray1", Parameter::Baseline)).is_some());
}

#[test]
fn test_controller_rejects_induction_before_baseline() {
    let config = common::small_config();
    let store = BaselineStore::new();
    let sink = MemorySink::new();
    let controller = RunController::new(&config, &store, &sink);

    let (_, light) = common::session_pairs();
    let err = controller
        .process(&common::key("tray9", common::induction()), &light)
        .unwrap_err();
    assert!(matches!(err, PsiiError::MissingBaseline { ref sample, .. } if sample == "tray9"));
}

#[test]
fn test_session_state_transitions() {
    let config = common::small_config();
    let store = BaselineStore::new();
    let sink = MemorySink::new();
    let controller = RunController::new(&config, &store, &sink);
    let (provider, groups) = MemoryProvider::sessions(&["tray5"]);
    let group = &groups[0];

    let mut session = SessionRun::new(&controller, group.sample_day.clone());
    assert_eq!(session.state(), RunState::AwaitingBaseline);

    let induction_keys = group.induction_keys();
    let err = session
        .induction(&induction_keys, &provider, &|| {})
        .unwrap_err();
    assert!(matches!(err, PsiiError::MissingBaseline { .. }));
    assert_eq!(session.state(), RunState::AwaitingBaseline);

    let key = group.baseline_key().unwrap();
    let pair = provider.frame_pair(&key).unwrap();
    session.baseline(&key, &pair).unwrap();
    assert_eq!(session.state(), RunState::BaselineComputed);
    assert!(store.contains(&group.sample_day));

    session.induction(&induction_keys, &provider, &|| {}).unwrap();
    assert_eq!(session.state(), RunState::InductionProcessed(1));

    let rows = session.finish();
    assert_eq!(session.state(), RunState::Complete);
    assert_eq!(rows.len(), 2 * 2 * common::small_grid().len());
}

#[test]
fn test_batch_is_idempotent() {
    let (provider, groups) = MemoryProvider::sessions(&["tray1", "tray2", "tray3"]);
    let (first, _) = run(&provider, &groups);
    let (second, _) = run(&provider, &groups);
    assert_eq!(csv_bytes(&first.rows), csv_bytes(&second.rows));

    let samples: Vec<_> = first.rows.iter().map(|r| r.sample.as_str()).collect();
    let mut sorted = samples.clone();
    sorted.sort();
    assert_eq!(samples, sorted, "rows follow group order");
}

#[test]
fn test_progress_counts_every_measurement() {
    let (provider, groups) = MemoryProvider::sessions(&["tray1", "tray2"]);
    let config = common::small_config();
    let store = BaselineStore::new();
    let sink = MemorySink::new();
    let reporter = Arc::new(CountingReporter {
        done: AtomicUsize::new(0),
    });
    run_batch(&groups, &provider, &config, &store, &sink, reporter.as_ref());
    assert_eq!(reporter.done.load(Ordering::Relaxed), 4);
}

#[test]
fn test_pipeline_stage_display() {
    assert_eq!(PipelineStage::Reading.to_string(), "Reading manifest");
    assert_eq!(PipelineStage::Measuring.to_string(), "Measuring plants");
    assert_eq!(PipelineStage::Writing.to_string(), "Writing table");
}

#[test]
fn test_run_pipeline_from_manifest() {
    let dir = tempdir().unwrap();
    let (baseline, light) = common::session_pairs();
    for (name, frame) in [
        ("fo.tif", &baseline.dark),
        ("fm.tif", &baseline.bright),
        ("fp.tif", &light.dark),
        ("fmp.tif", &light.bright),
    ] {
        save_frame_tiff(frame, &dir.path().join(name)).unwrap();
    }
    std::fs::write(
        dir.path().join("manifest.csv"),
        "treatment,sampleid,date,parameter,frame,filename\n\
         control,tray1,2019-08-10,FvFm,Fo,fo.tif\n\
         control,tray1,2019-08-10,FvFm,Fm,fm.tif\n\
         control,tray1,2019-08-10,FvFm,Fp,missing.tif\n\
         control,tray1,2019-08-10,t300_ALon,Fp,fp.tif\n\
         control,tray1,2019-08-10,t300_ALon,Fmp,fmp.tif\n\
         control,tray1,2019-08-10,Abs1,Fo,missing.tif\n",
    )
    .unwrap();

    let mut config = common::small_config();
    config.output.dir = dir.path().join("out");
    let output = run_pipeline(&dir.path().join("manifest.csv"), &config).unwrap();
    assert!(output.failures.is_empty());
    assert_eq!(output.rows.len(), 16);

    let table = std::fs::read_to_string(config.output.table_path()).unwrap();
    assert_eq!(table.lines().count(), 1 + 16);

    let baseline_key = common::key("tray1", Parameter::Baseline);
    let mask_path = config
        .output
        .dir
        .join("masks")
        .join(format!("{}_mask.png", baseline_key.file_stem()));
    let mask = load_mask(&mask_path).unwrap();
    assert!(!mask.is_empty());

    let light_key = common::key("tray1", common::induction());
    assert!(config
        .output
        .dir
        .join("fluorescence/tray1")
        .join(format!("{}_yii.tif", light_key.file_stem()))
        .exists());
}
