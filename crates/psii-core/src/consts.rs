/// Default pixel resolution of the fluorescence camera in millimetres per pixel.
pub const DEFAULT_PIXEL_RESOLUTION: f64 = 0.35;

/// Minimum component area (pixels) kept by the first fill pass after thresholding.
pub const DEFAULT_FIRST_FILL_AREA: usize = 150;

/// Minimum component area (pixels) kept by the fill pass that follows erosion.
pub const DEFAULT_SECOND_FILL_AREA: usize = 45;

/// Side length of the square erosion kernel.
pub const DEFAULT_ERODE_KERNEL: usize = 2;

/// Number of erosion iterations.
pub const DEFAULT_ERODE_ITERATIONS: usize = 1;

/// Center (x, y) of the first ROI in the tray grid.
pub const DEFAULT_GRID_ORIGIN: (usize, usize) = (160, 90);

/// Radius of every circular ROI, in pixels.
pub const DEFAULT_ROI_RADIUS: usize = 30;

/// Horizontal and vertical distance between ROI centers.
pub const DEFAULT_GRID_SPACING: (usize, usize) = (160, 175);

/// Pots per tray row.
pub const DEFAULT_GRID_COLS: usize = 3;

/// Pot rows per tray.
pub const DEFAULT_GRID_ROWS: usize = 3;

/// Decimal places used when comparing per-ROI YII statistics for collapse.
pub const UNIQUENESS_DECIMALS: usize = 3;

/// Parameter label of the dark-adapted reference measurement.
pub const BASELINE_PARAMETER: &str = "FvFm";

/// Default file name of the per-plant statistics table.
pub const DEFAULT_TABLE_NAME: &str = "output_psII_level0.csv";
