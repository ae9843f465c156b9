use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::BASELINE_PARAMETER;
use crate::error::{PsiiError, Result};

/// A single-channel fluorescence frame.
/// Pixel values are the raw camera counts, row-major, shape = (height, width).
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub data: Array2<u16>,
    /// Original bit depth of the source file (8 or 16)
    pub original_bit_depth: u8,
}

impl Frame {
    pub fn new(data: Array2<u16>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// Binary plant/background mask congruent with a [`Frame`]. `true` = plant.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    pub data: Array2<bool>,
}

impl Mask {
    pub fn new(data: Array2<bool>) -> Self {
        Self { data }
    }

    /// An all-background mask of the given (height, width).
    pub fn empty(dim: (usize, usize)) -> Self {
        Self {
            data: Array2::from_elem(dim, false),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Number of plant pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Set every pixel that is plant in `other` (logical OR in place).
    pub fn union_with(&mut self, other: &Mask) {
        self.data.zip_mut_with(&other.data, |a, &b| *a |= b);
    }
}

/// Per-pixel float image (YII, NPQ, Fv). Zero is the sentinel outside the valid region.
pub type RatioImage = Array2<f32>;

/// Measurement label of a frame pair: the dark-adapted `FvFm` reference or
/// an induction-period label such as `t300_ALon`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Parameter {
    Baseline,
    Induction(String),
}

impl Parameter {
    pub fn is_baseline(&self) -> bool {
        matches!(self, Self::Baseline)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Baseline => BASELINE_PARAMETER,
            Self::Induction(label) => label,
        }
    }

    /// Label of the (dark, bright) frames of this measurement.
    pub fn frame_labels(&self) -> (FrameKind, FrameKind) {
        match self {
            Self::Baseline => (FrameKind::Fo, FrameKind::Fm),
            Self::Induction(_) => (FrameKind::Fp, FrameKind::Fmp),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = PsiiError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PsiiError::InvalidConfig("empty parameter label".into()));
        }
        if s == BASELINE_PARAMETER {
            Ok(Self::Baseline)
        } else {
            Ok(Self::Induction(s.to_string()))
        }
    }
}

impl TryFrom<String> for Parameter {
    type Error = PsiiError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Parameter> for String {
    fn from(value: Parameter) -> Self {
        value.as_str().to_string()
    }
}

/// Which frame of the induction protocol an image is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    /// Minimal fluorescence, dark adapted.
    Fo,
    /// Maximal fluorescence, dark adapted.
    Fm,
    /// Steady-state fluorescence, light adapted.
    Fp,
    /// Maximal fluorescence, light adapted.
    Fmp,
}

impl FrameKind {
    /// Dark frames carry the minimum fluorescence of a pair.
    pub fn is_dark(self) -> bool {
        matches!(self, Self::Fo | Self::Fp)
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fo => write!(f, "Fo"),
            Self::Fm => write!(f, "Fm"),
            Self::Fp => write!(f, "Fp"),
            Self::Fmp => write!(f, "Fmp"),
        }
    }
}

/// The two frames of one measurement of one sample.
#[derive(Clone, Debug)]
pub struct FramePair {
    pub parameter: Parameter,
    /// Minimum fluorescence (Fo or Fp).
    pub dark: Frame,
    /// Maximum fluorescence (Fm or Fmp).
    pub bright: Frame,
}

impl FramePair {
    pub fn new(parameter: Parameter, dark: Frame, bright: Frame) -> Result<Self> {
        if dark.dim() != bright.dim() {
            return Err(PsiiError::DimensionMismatch {
                expected: bright.dim(),
                actual: dark.dim(),
            });
        }
        Ok(Self {
            parameter,
            dark,
            bright,
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.bright.dim()
    }
}

/// Identity of one tray imaging session: baseline masks are shared within it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleDay {
    pub sample: String,
    pub day: String,
}

/// Typed key of one processing task.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub treatment: String,
    pub sample: String,
    pub day: String,
    pub parameter: Parameter,
}

impl GroupKey {
    pub fn sample_day(&self) -> SampleDay {
        SampleDay {
            sample: self.sample.clone(),
            day: self.day.clone(),
        }
    }

    /// File stem shared by every artifact of this group, e.g. `ctrl-20190810-tray4-t300_ALon`.
    pub fn file_stem(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.treatment, self.day, self.sample, self.parameter
        )
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.treatment, self.sample, self.day, self.parameter
        )
    }
}
