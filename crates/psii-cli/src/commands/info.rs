use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use psii_core::io::Manifest;

#[derive(Args)]
pub struct InfoArgs {
    /// Manifest CSV (treatment, sampleid, date, parameter, frame, filename)
    pub manifest: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;
    let groups = manifest.groups();
    let measurements: usize = groups.iter().map(|g| g.parameters.len()).sum();

    println!("Manifest:      {}", args.manifest.display());
    println!("Sessions:      {}", groups.len());
    println!("Measurements:  {}", measurements);
    println!();
    println!("{:<14}{:<10}{:<12}{}", "Treatment", "Sample", "Date", "Parameters");
    println!("{}", "-".repeat(60));

    for group in groups {
        let params: Vec<_> = group.parameters.iter().map(|p| p.as_str()).collect();
        let marker = if group.baseline_key().is_some() { "" } else { "  (no FvFm)" };
        println!(
            "{:<14}{:<10}{:<12}{}{}",
            group.treatment,
            group.sample_day.sample,
            group.sample_day.day,
            params.join(","),
            marker
        );
    }

    Ok(())
}
