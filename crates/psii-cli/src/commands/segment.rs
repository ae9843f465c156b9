use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use psii_core::io::image_io::{load_frame, save_mask_png};
use psii_core::segmentation::components::{label_components, Connectivity};
use psii_core::segmentation::{segment, SegmentationConfig};

#[derive(Args)]
pub struct SegmentArgs {
    /// Maximum-fluorescence image (TIFF or PNG)
    pub file: PathBuf,

    /// Components smaller than this are removed after thresholding
    #[arg(long, default_value = "150")]
    pub first_fill: usize,

    /// Side of the square erosion kernel
    #[arg(long, default_value = "2")]
    pub erode_kernel: usize,

    /// Number of erosion passes
    #[arg(long, default_value = "1")]
    pub erode_iterations: usize,

    /// Components smaller than this are removed after erosion
    #[arg(long, default_value = "45")]
    pub second_fill: usize,

    /// Output mask path
    #[arg(short, long, default_value = "mask.png")]
    pub output: PathBuf,
}

pub fn run(args: &SegmentArgs) -> Result<()> {
    let frame = load_frame(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let config = SegmentationConfig {
        first_fill_area: args.first_fill,
        erode_kernel: args.erode_kernel.max(1),
        erode_iterations: args.erode_iterations,
        second_fill_area: args.second_fill,
        ..Default::default()
    };

    let mask = segment(&frame, &config);
    let objects = label_components(&mask.data, Connectivity::Eight).components.len();
    save_mask_png(&mask, &args.output)?;

    let total = frame.width() * frame.height();
    println!("Image:       {} ({}x{})", args.file.display(), frame.width(), frame.height());
    println!(
        "Plant:       {} px ({:.1}%)",
        mask.count(),
        100.0 * mask.count() as f64 / total.max(1) as f64
    );
    println!("Objects:     {}", objects);
    println!("Mask saved to {}", args.output.display());

    Ok(())
}
