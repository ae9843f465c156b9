use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ERODE_ITERATIONS, DEFAULT_ERODE_KERNEL, DEFAULT_FIRST_FILL_AREA,
    DEFAULT_SECOND_FILL_AREA,
};
use crate::error::PsiiError;

/// How the plant mask is derived from the maximum-fluorescence frame.
///
/// Only automatic thresholding is supported; any other mode name is a
/// configuration error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MaskMode {
    /// Yen's maximum-correlation threshold. Holds up when algae grow on the soil.
    #[default]
    Thresh,
}

impl fmt::Display for MaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thresh => write!(f, "thresh"),
        }
    }
}

impl FromStr for MaskMode {
    type Err = PsiiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thresh" => Ok(Self::Thresh),
            other => Err(PsiiError::UnsupportedMaskMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for MaskMode {
    type Error = PsiiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MaskMode> for String {
    fn from(value: MaskMode) -> Self {
        value.to_string()
    }
}

/// Configuration for plant segmentation of a single frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    #[serde(default)]
    pub mode: MaskMode,
    /// Components smaller than this (pixels) are removed right after thresholding.
    #[serde(default = "default_first_fill_area")]
    pub first_fill_area: usize,
    /// Side length of the square erosion kernel.
    #[serde(default = "default_erode_kernel")]
    pub erode_kernel: usize,
    #[serde(default = "default_erode_iterations")]
    pub erode_iterations: usize,
    /// Components smaller than this (pixels) are removed after erosion.
    #[serde(default = "default_second_fill_area")]
    pub second_fill_area: usize,
}

fn default_first_fill_area() -> usize {
    DEFAULT_FIRST_FILL_AREA
}
fn default_erode_kernel() -> usize {
    DEFAULT_ERODE_KERNEL
}
fn default_erode_iterations() -> usize {
    DEFAULT_ERODE_ITERATIONS
}
fn default_second_fill_area() -> usize {
    DEFAULT_SECOND_FILL_AREA
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            mode: MaskMode::default(),
            first_fill_area: DEFAULT_FIRST_FILL_AREA,
            erode_kernel: DEFAULT_ERODE_KERNEL,
            erode_iterations: DEFAULT_ERODE_ITERATIONS,
            second_fill_area: DEFAULT_SECOND_FILL_AREA,
        }
    }
}
