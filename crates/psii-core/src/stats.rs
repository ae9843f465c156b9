//! Per-ROI aggregation of raw intensity, YII and NPQ.

use ndarray::Array2;
use num_traits::ToPrimitive;
use serde::Serialize;
use tracing::warn;

use crate::consts::UNIQUENESS_DECIMALS;
use crate::frame::{FrameKind, FramePair, GroupKey, Mask, RatioImage};
use crate::io::table::{serialize_bool, serialize_flag, serialize_float};
use crate::roi::RoiAssignment;

/// Mean of `data` over plant pixels of `mask`. NaN when the mask is empty.
pub fn masked_mean<T: ToPrimitive + Copy>(data: &Array2<T>, mask: &Mask) -> f64 {
    let (sum, count) = data
        .iter()
        .zip(mask.data.iter())
        .filter(|&(_, &plant)| plant)
        .fold((0.0_f64, 0usize), |(sum, count), (v, _)| {
            (sum + v.to_f64().unwrap_or(f64::NAN), count + 1)
        });
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Population standard deviation of `data` over plant pixels of `mask`.
/// NaN when the mask is empty.
pub fn masked_std<T: ToPrimitive + Copy>(data: &Array2<T>, mask: &Mask) -> f64 {
    let mean = masked_mean(data, mask);
    if mean.is_nan() {
        return f64::NAN;
    }
    let (sq, count) = data
        .iter()
        .zip(mask.data.iter())
        .filter(|&(_, &plant)| plant)
        .fold((0.0_f64, 0usize), |(sq, count), (v, _)| {
            let d = v.to_f64().unwrap_or(f64::NAN) - mean;
            (sq + d * d, count + 1)
        });
    (sq / count as f64).sqrt()
}

/// Convert a pixel count to square millimetres.
pub fn area_mm2(pixels: usize, pixel_resolution: f64) -> f64 {
    pixels as f64 * pixel_resolution * pixel_resolution
}

/// Statistics of one ROI for one frame pair.
#[derive(Clone, Debug, PartialEq)]
pub struct RoiStatistics {
    pub roi: usize,
    /// Mean intensity of the dark frame.
    pub dark_avg: f64,
    /// Mean intensity of the bright frame.
    pub bright_avg: f64,
    pub yii_avg: f64,
    pub yii_std: f64,
    pub npq_avg: f64,
    pub npq_std: f64,
    pub area_px: usize,
    pub plantarea: f64,
    /// `None` when the ROI holds no plant.
    pub in_frame: Option<bool>,
}

/// Aggregate one ROI. An ROI without plant yields NaN statistics and zero
/// area so every acquisition keeps the same number of rows.
pub fn aggregate(
    pair: &FramePair,
    yii: &RatioImage,
    npq: &RatioImage,
    assignment: &RoiAssignment,
    pixel_resolution: f64,
) -> RoiStatistics {
    let roi = assignment.roi.index;
    if !assignment.has_plant() {
        warn!(roi, parameter = %pair.parameter, "No plant object found in ROI");
        return RoiStatistics {
            roi,
            dark_avg: f64::NAN,
            bright_avg: f64::NAN,
            yii_avg: f64::NAN,
            yii_std: f64::NAN,
            npq_avg: f64::NAN,
            npq_std: f64::NAN,
            area_px: 0,
            plantarea: 0.0,
            in_frame: None,
        };
    }

    let mask = &assignment.mask;
    RoiStatistics {
        roi,
        dark_avg: masked_mean(&pair.dark.data, mask),
        bright_avg: masked_mean(&pair.bright.data, mask),
        yii_avg: masked_mean(yii, mask),
        yii_std: masked_std(yii, mask),
        npq_avg: masked_mean(npq, mask),
        npq_std: masked_std(npq, mask),
        area_px: assignment.area,
        plantarea: area_mm2(assignment.area, pixel_resolution),
        in_frame: assignment.in_frame(),
    }
}

/// Decimal rendering of `value` at the comparison precision. Formatting is
/// correctly rounded with ties to even, so `0.0625` and `0.0624` agree.
fn rounded(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let text = format!("{:.*}", UNIQUENESS_DECIMALS, value);
    Some(match text.strip_prefix('-') {
        Some(abs) if abs.bytes().all(|b| b == b'0' || b == b'.') => abs.to_string(),
        _ => text,
    })
}

/// False when every ROI reports the same YII mean and standard deviation
/// after rounding to three decimals: the grid most likely collapsed onto
/// one merged plant. A lone ROI with finite statistics agrees with itself
/// and is therefore not unique. Missing (NaN) statistics never compare
/// equal.
pub fn rois_are_unique(stats: &[RoiStatistics]) -> bool {
    let Some(first) = stats.first() else {
        return true;
    };
    let Some(reference) = rounded(first.yii_avg).zip(rounded(first.yii_std)) else {
        return true;
    };
    !stats.iter().all(|s| {
        rounded(s.yii_avg)
            .zip(rounded(s.yii_std))
            .is_some_and(|key| key == reference)
    })
}

/// One output record: one ROI of one frame of one measurement.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoiStatRow {
    pub treatment: String,
    #[serde(rename = "sampleid")]
    pub sample: String,
    #[serde(rename = "date")]
    pub day: String,
    pub parameter: String,
    pub frame: FrameKind,
    pub roi: usize,
    #[serde(serialize_with = "serialize_float")]
    pub frame_avg: f64,
    #[serde(serialize_with = "serialize_float")]
    pub yii_avg: f64,
    #[serde(serialize_with = "serialize_float")]
    pub yii_std: f64,
    #[serde(serialize_with = "serialize_float")]
    pub npq_avg: f64,
    #[serde(serialize_with = "serialize_float")]
    pub npq_std: f64,
    #[serde(serialize_with = "serialize_float")]
    pub plantarea: f64,
    #[serde(serialize_with = "serialize_flag")]
    pub obj_in_frame: Option<bool>,
    #[serde(serialize_with = "serialize_bool")]
    pub unique_roi: bool,
}

/// Expand per-ROI statistics into output rows: a dark-frame row and a
/// bright-frame row per ROI, sharing everything but the frame mean.
pub fn to_rows(key: &GroupKey, stats: &[RoiStatistics]) -> Vec<RoiStatRow> {
    let unique = rois_are_unique(stats);
    if !unique {
        warn!(group = %key, "All ROIs report identical YII statistics; plants may have merged");
    }
    let (dark_kind, bright_kind) = key.parameter.frame_labels();

    stats
        .iter()
        .flat_map(|s| {
            [(dark_kind, s.dark_avg), (bright_kind, s.bright_avg)]
                .into_iter()
                .map(move |(frame, frame_avg)| RoiStatRow {
                    treatment: key.treatment.clone(),
                    sample: key.sample.clone(),
                    day: key.day.clone(),
                    parameter: key.parameter.to_string(),
                    frame,
                    roi: s.roi,
                    frame_avg,
                    yii_avg: s.yii_avg,
                    yii_std: s.yii_std,
                    npq_avg: s.npq_avg,
                    npq_std: s.npq_std,
                    plantarea: s.plantarea,
                    obj_in_frame: s.in_frame,
                    unique_roi: unique,
                })
        })
        .collect()
}
