use std::path::Path;

use console::Style;
use octrack_core::config::TrackingConfig;
use octrack_core::frame::FrameSize;
use octrack_core::session::SessionSummary;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    good: Style,
    bad: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            good: Style::new().green(),
            bad: Style::new().red(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

const RULE: &str = "\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}";

pub fn print_track_header(
    input: &Path,
    frames: usize,
    size: FrameSize,
    reference_index: usize,
    config: &TrackingConfig,
) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("octrack"));
    println!("  {}", s.title.apply_to(RULE));
    println!();

    println!("  {:<14}{}", s.label.apply_to("Input"), s.path.apply_to(input.display()));
    println!("  {:<14}{}", s.label.apply_to("Frames"), s.value.apply_to(frames));
    println!("  {:<14}{}", s.label.apply_to("Size"), s.value.apply_to(size));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Reference"),
        s.value.apply_to(format!("frame {reference_index}"))
    );
    println!();

    let pre = &config.preprocess;
    println!("  {}", s.header.apply_to("Preprocessing"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Kernel"),
        s.value.apply_to(format!("{:.4} of width", pre.kernel_size))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Reflection"),
        s.value.apply_to(format!("> {}", pre.reflection_threshold))
    );
    match pre.roi {
        Some(roi) => println!(
            "    {:<12}{}",
            s.label.apply_to("ROI"),
            s.value.apply_to(format!(
                "r={} at ({}, {})",
                roi.radius, roi.center.0, roi.center.1
            ))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("ROI"),
            s.disabled.apply_to("disabled")
        ),
    }
    println!();

    let est = &config.estimation;
    println!("  {}", s.header.apply_to("Estimation"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Keypoints"),
        s.value.apply_to(config.features.max_keypoints)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Min matches"),
        s.value.apply_to(est.min_matches)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Max std"),
        s.value.apply_to(format!("{} px", est.std_dev_threshold))
    );
    match est.ransac.seed {
        Some(seed) => println!(
            "    {:<12}{}",
            s.label.apply_to("Seed"),
            s.value.apply_to(seed)
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Seed"),
            s.disabled.apply_to("random")
        ),
    }
    println!();
}

pub fn print_session_summary(summary: &SessionSummary, reference_keypoints: usize) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Results"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Ref keypoints"),
        s.value.apply_to(reference_keypoints)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Found"),
        s.good
            .apply_to(format!("{} / {}", summary.found, summary.total))
    );
    if summary.not_found > 0 {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Not found"),
            s.bad.apply_to(summary.not_found)
        );
    }
    if let (Some(dx), Some(dy)) = (summary.mean_dx, summary.mean_dy) {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Mean shift"),
            s.value.apply_to(format!("({dx:.2}, {dy:.2}) px"))
        );
    }
    if let Some(inliers) = summary.mean_inliers {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Mean inliers"),
            s.value.apply_to(format!("{inliers:.1}"))
        );
    }
    println!();
}
