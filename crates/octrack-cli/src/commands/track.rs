use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use octrack_core::io::image_io::save_history_png;
use octrack_core::io::source::open_source;
use octrack_core::session::{build_tracker, track_all, ProgressReporter, SessionStage};
use tracing::info;

use super::load_config;
use crate::summary::{print_session_summary, print_track_header};

#[derive(Args)]
pub struct TrackArgs {
    /// Input SER file or directory of images
    pub input: PathBuf,

    /// Tracking config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Index of the reference frame
    #[arg(long, conflicts_with = "reference_time")]
    pub reference_frame: Option<usize>,

    /// Time of the reference frame in seconds from the start
    #[arg(long)]
    pub reference_time: Option<f64>,

    /// Rescale frames to this width, keeping the aspect ratio
    #[arg(long)]
    pub width: Option<usize>,

    /// Write per-frame results as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the reference frame with every found position marked (PNG)
    #[arg(long)]
    pub history: Option<PathBuf>,
}

/// Drives an indicatif bar from session progress callbacks.
struct BarReporter {
    pb: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: SessionStage, total_items: Option<usize>) {
        self.pb.set_length(total_items.unwrap_or(0) as u64);
        self.pb.set_position(0);
        self.pb.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        self.pb.set_position(items_done as u64);
    }
}

pub fn run(args: &TrackArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let source = open_source(&args.input, args.width)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let reference_index = match (args.reference_frame, args.reference_time) {
        (Some(index), _) => index,
        (None, Some(seconds)) => source.frame_at_time(seconds)?,
        (None, None) => 0,
    };
    info!(
        input = %args.input.display(),
        reference = reference_index,
        "Starting session"
    );

    print_track_header(
        &args.input,
        source.frame_count(),
        source.frame_size(),
        reference_index,
        &config,
    );

    let pb = ProgressBar::new(source.frame_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { pb: pb.clone() });

    let tracker = build_tracker(source.as_ref(), reference_index, &config, reporter.as_ref())?;
    let report = track_all(source.as_ref(), &tracker, reference_index, reporter)?;
    pb.finish_with_message("Done");

    print_session_summary(&report.summary(), tracker.reference().len());

    if let Some(ref path) = args.output {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Results saved to {}", path.display());
    }

    if let Some(ref path) = args.history {
        save_history_png(tracker.reference_processed(), &report.history_marks(), path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("History image saved to {}", path.display());
    }

    Ok(())
}
