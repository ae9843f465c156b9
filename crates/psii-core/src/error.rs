use thiserror::Error;

#[derive(Error, Debug)]
pub enum PsiiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("TIFF encoding error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No baseline mask for sample {sample} on {day}; the FvFm measurement must be processed first")]
    MissingBaseline { sample: String, day: String },

    #[error("Unsupported mask mode: {0} (only \"thresh\" is available)")]
    UnsupportedMaskMode(String),

    #[error("Image dimensions {actual:?} do not match expected {expected:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("ROI {index} (center {center:?}, radius {radius}) extends outside the {width}x{height} frame")]
    RoiOutOfFrame {
        index: usize,
        center: (usize, usize),
        radius: usize,
        width: usize,
        height: usize,
    },

    #[error("Incomplete frame pair for {group}: missing {missing} frame")]
    IncompleteFramePair { group: String, missing: String },

    #[error("Duplicate {frame} frame for {group}")]
    DuplicateFrame { group: String, frame: String },

    #[error("Sample {sample} on {day} is listed under treatments {first} and {second}")]
    ConflictingTreatment {
        sample: String,
        day: String,
        first: String,
        second: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PsiiError>;
