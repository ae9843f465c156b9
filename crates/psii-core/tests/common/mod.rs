use std::collections::HashMap;

use ndarray::Array2;

use psii_core::error::{PsiiError, Result};
use psii_core::frame::{Frame, FramePair, GroupKey, Mask, Parameter};
use psii_core::io::FramePairProvider;
use psii_core::pipeline::{PipelineConfig, SampleDayGroup};
use psii_core::roi::RoiGrid;

pub const DIM: (usize, usize) = (160, 160);
pub const PLANT_RADIUS: usize = 12;

/// 2x2 grid on a 160x160 frame: centers (40,40), (120,40), (40,120), (120,120).
pub fn small_grid() -> RoiGrid {
    RoiGrid {
        origin: (40, 40),
        radius: 15,
        spacing: (80, 80),
        rows: 2,
        cols: 2,
    }
}

pub fn small_config() -> PipelineConfig {
    PipelineConfig {
        grid: small_grid(),
        ..Default::default()
    }
}

/// Centers (x, y) of the small grid's ROIs in row-major order.
pub fn grid_centers() -> Vec<(usize, usize)> {
    vec![(40, 40), (120, 40), (40, 120), (120, 120)]
}

pub fn in_disc(row: usize, col: usize, center: (usize, usize), radius: usize) -> bool {
    let dx = col as i64 - center.0 as i64;
    let dy = row as i64 - center.1 as i64;
    dx * dx + dy * dy <= (radius * radius) as i64
}

/// Frame with `background` everywhere and one disc per (center, value).
pub fn disc_frame(dim: (usize, usize), background: u16, discs: &[((usize, usize), u16)]) -> Frame {
    let data = Array2::from_shape_fn(dim, |(row, col)| {
        discs
            .iter()
            .find(|(center, _)| in_disc(row, col, *center, PLANT_RADIUS))
            .map(|&(_, v)| v)
            .unwrap_or(background)
    });
    Frame::new(data, 16)
}

/// Mask with a filled axis-aligned rectangle [r0, r1) x [c0, c1).
pub fn rect_mask(dim: (usize, usize), rect: (usize, usize, usize, usize)) -> Mask {
    let (r0, r1, c0, c1) = rect;
    Mask::new(Array2::from_shape_fn(dim, |(row, col)| {
        row >= r0 && row < r1 && col >= c0 && col < c1
    }))
}

/// Mask from an ASCII picture, `#` = plant.
pub fn ascii_mask(rows: &[&str]) -> Mask {
    let h = rows.len();
    let w = rows[0].len();
    Mask::new(Array2::from_shape_fn((h, w), |(r, c)| {
        rows[r].as_bytes()[c] == b'#'
    }))
}

/// Induction label used by the synthetic sessions.
pub fn induction() -> Parameter {
    Parameter::Induction("t300_ALon".into())
}

pub fn key(sample: &str, parameter: Parameter) -> GroupKey {
    GroupKey {
        treatment: "control".into(),
        sample: sample.into(),
        day: "2019-08-10".into(),
        parameter,
    }
}

/// Plants in the first three ROIs, the fourth ROI empty.
///
/// Baseline: dark 1000 + 50i, bright 3000 + 100i on a 100/200 background.
/// Induction: dark 1200, bright 2000 + 100i on a 100/150 background.
pub fn session_pairs() -> (FramePair, FramePair) {
    let centers = grid_centers();
    let plants = &centers[..3];

    let fo: Vec<_> = plants.iter().enumerate().map(|(i, &c)| (c, 1000 + 50 * i as u16)).collect();
    let fm: Vec<_> = plants.iter().enumerate().map(|(i, &c)| (c, 3000 + 100 * i as u16)).collect();
    let fp: Vec<_> = plants.iter().map(|&c| (c, 1200)).collect();
    let fmp: Vec<_> = plants.iter().enumerate().map(|(i, &c)| (c, 2000 + 100 * i as u16)).collect();

    let baseline = FramePair::new(
        Parameter::Baseline,
        disc_frame(DIM, 100, &fo),
        disc_frame(DIM, 200, &fm),
    )
    .unwrap();
    let induction = FramePair::new(
        induction(),
        disc_frame(DIM, 100, &fp),
        disc_frame(DIM, 150, &fmp),
    )
    .unwrap();
    (baseline, induction)
}

/// Frame pairs held in memory, keyed by group.
#[derive(Default)]
pub struct MemoryProvider {
    pub pairs: HashMap<GroupKey, FramePair>,
}

impl MemoryProvider {
    /// One session for each sample, all sharing the synthetic frames.
    pub fn sessions(samples: &[&str]) -> (Self, Vec<SampleDayGroup>) {
        let (baseline, light) = session_pairs();
        let mut provider = Self::default();
        let mut groups = Vec::new();
        for sample in samples {
            provider.pairs.insert(key(sample, Parameter::Baseline), baseline.clone());
            provider.pairs.insert(key(sample, induction()), light.clone());
            groups.push(SampleDayGroup {
                treatment: "control".into(),
                sample_day: key(sample, Parameter::Baseline).sample_day(),
                parameters: vec![Parameter::Baseline, induction()],
            });
        }
        (provider, groups)
    }
}

impl FramePairProvider for MemoryProvider {
    fn frame_pair(&self, key: &GroupKey) -> Result<FramePair> {
        self.pairs
            .get(key)
            .cloned()
            .ok_or_else(|| PsiiError::IncompleteFramePair {
                group: key.to_string(),
                missing: "dark and bright".into(),
            })
    }
}
