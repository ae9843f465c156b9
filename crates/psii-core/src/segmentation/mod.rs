//! Plant/background segmentation of maximum-fluorescence frames.

pub mod components;
pub mod config;
pub mod morphology;
pub mod threshold;

pub use config::{MaskMode, SegmentationConfig};

use tracing::debug;

use crate::frame::{Frame, Mask};

use morphology::{erode, fill};
use threshold::{threshold_light, yen_threshold};

/// Segment plant material in a maximum-fluorescence frame.
///
/// Pipeline: Yen threshold -> keep light pixels -> drop small components ->
/// erode to split touching leaves -> drop erosion debris.
pub fn segment(frame: &Frame, config: &SegmentationConfig) -> Mask {
    match config.mode {
        MaskMode::Thresh => {
            let level = yen_threshold(&frame.data);
            let binary = threshold_light(&frame.data, level);
            debug!(threshold = level, light_pixels = binary.count(), "Thresholded frame");

            let filled = fill(&binary.data, config.first_fill_area);
            let eroded = erode(&filled, config.erode_kernel, config.erode_iterations);
            let mask = Mask::new(fill(&eroded, config.second_fill_area));
            debug!(plant_pixels = mask.count(), "Segmented plant mask");
            mask
        }
    }
}
