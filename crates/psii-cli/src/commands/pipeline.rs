use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use psii_core::pipeline::{run_pipeline_reported, PipelineConfig, PipelineStage, ProgressReporter};
use tracing::info;

use crate::summary::{print_failures, print_pipeline_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Manifest CSV (treatment, sampleid, date, parameter, frame, filename)
    pub manifest: PathBuf,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory for masks, images and the statistics table
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Millimetres per pixel
    #[arg(long)]
    pub pixel_resolution: Option<f64>,

    /// Only write masks and the table, skip YII/NPQ images
    #[arg(long)]
    pub no_images: bool,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    pub threads: Option<usize>,
}

/// Drives an indicatif bar from pipeline progress callbacks.
struct BarReporter {
    pb: ProgressBar,
}

impl BarReporter {
    fn new() -> Result<Self> {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg:20} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
        );
        Ok(Self { pb })
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.pb.set_message(stage.to_string());
        self.pb.set_length(total_items.unwrap_or(1) as u64);
        self.pb.set_position(0);
    }

    fn advance(&self, items_done: usize) {
        self.pb.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.pb.length() {
            self.pb.set_position(len);
        }
    }
}

pub fn run(args: &RunArgs) -> Result<()> {
    let mut config: PipelineConfig = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid pipeline config")?
    } else {
        PipelineConfig::default()
    };
    if let Some(ref dir) = args.output {
        config.output.dir = dir.clone();
    }
    if let Some(res) = args.pixel_resolution {
        config.pixel_resolution = res;
    }
    if args.no_images {
        config.output.write_images = false;
    }

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
        info!(threads, "Configured worker pool");
    }

    print_pipeline_summary(&args.manifest, &config);

    let reporter = Arc::new(BarReporter::new()?);
    let output = run_pipeline_reported(&args.manifest, &config, reporter.clone())?;
    reporter.pb.finish_with_message("Done");

    println!(
        "\n{} rows written to {}",
        output.rows.len(),
        config.output.table_path().display()
    );

    if !output.failures.is_empty() {
        print_failures(&output.failures);
        bail!("{} measurement(s) failed", output.failures.len());
    }

    Ok(())
}
