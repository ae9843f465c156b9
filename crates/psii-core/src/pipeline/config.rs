use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_PIXEL_RESOLUTION, DEFAULT_TABLE_NAME};
use crate::error::{PsiiError, Result};
use crate::roi::RoiGrid;
use crate::segmentation::SegmentationConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Millimetres per pixel, used to convert plant area.
    #[serde(default = "default_pixel_resolution")]
    pub pixel_resolution: f64,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub grid: RoiGrid,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_pixel_resolution() -> f64 {
    DEFAULT_PIXEL_RESOLUTION
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pixel_resolution: DEFAULT_PIXEL_RESOLUTION,
            segmentation: SegmentationConfig::default(),
            grid: RoiGrid::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Reject settings no acquisition can satisfy.
    pub fn validate(&self) -> Result<()> {
        if !(self.pixel_resolution.is_finite() && self.pixel_resolution > 0.0) {
            return Err(PsiiError::InvalidConfig(format!(
                "pixel_resolution must be positive, got {}",
                self.pixel_resolution
            )));
        }
        if self.grid.is_empty() {
            return Err(PsiiError::InvalidConfig(
                "ROI grid needs at least one row and one column".into(),
            ));
        }
        if self.grid.radius == 0 {
            return Err(PsiiError::InvalidConfig("ROI radius must be positive".into()));
        }
        if self.segmentation.erode_kernel == 0 {
            return Err(PsiiError::InvalidConfig(
                "erode_kernel must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// Write YII/NPQ/Fv/Fm float images next to the masks.
    #[serde(default = "default_write_images")]
    pub write_images: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}
fn default_write_images() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            table_name: default_table_name(),
            write_images: true,
        }
    }
}

impl OutputConfig {
    pub fn table_path(&self) -> PathBuf {
        self.dir.join(&self.table_name)
    }
}
