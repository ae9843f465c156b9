use std::path::Path;

use console::Style;
use psii_core::pipeline::{GroupFailure, PipelineConfig};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    disabled: Style,
    error: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            disabled: Style::new().dim().yellow(),
            error: Style::new().red().bold(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_pipeline_summary(manifest: &Path, config: &PipelineConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("PSII Pipeline"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(13)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Manifest"),
        s.path.apply_to(manifest.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Resolution"),
        s.value.apply_to(format!("{} mm/px", config.pixel_resolution))
    );
    println!();

    let seg = &config.segmentation;
    println!("  {}", s.header.apply_to("Segmentation"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Mode"),
        s.value.apply_to(seg.mode)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Fill"),
        s.value.apply_to(format!("{} / {} px", seg.first_fill_area, seg.second_fill_area))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Erode"),
        s.value.apply_to(format!(
            "{k}x{k} kernel, {} pass(es)",
            seg.erode_iterations,
            k = seg.erode_kernel
        ))
    );
    println!();

    let grid = &config.grid;
    println!("  {}", s.header.apply_to("ROI Grid"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Layout"),
        s.value.apply_to(format!("{} x {}", grid.cols, grid.rows))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Origin"),
        s.value.apply_to(format!("({}, {})", grid.origin.0, grid.origin.1))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Spacing"),
        s.value.apply_to(format!("({}, {})", grid.spacing.0, grid.spacing.1))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Radius"),
        s.value.apply_to(format!("{} px", grid.radius))
    );
    println!();

    if config.output.write_images {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Images"),
            s.value.apply_to("Fv/Fm, YII, NPQ")
        );
    } else {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Images"),
            s.disabled.apply_to("masks only")
        );
    }
    println!();
}

pub fn print_failures(failures: &[GroupFailure]) {
    let s = Styles::new();

    println!();
    println!("  {}", s.error.apply_to("Failed measurements"));
    for failure in failures {
        let parameter = failure
            .parameter
            .as_ref()
            .map_or("all", |p| p.as_str());
        println!(
            "    {} {} {} {}  {}",
            s.label.apply_to(&failure.treatment),
            s.value.apply_to(&failure.sample_day.sample),
            s.label.apply_to(&failure.sample_day.day),
            s.value.apply_to(parameter),
            s.error.apply_to(&failure.error)
        );
    }
    println!();
}
