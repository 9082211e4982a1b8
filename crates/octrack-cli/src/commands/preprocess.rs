use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use octrack_core::io::image_io::{load_image, save_processed_png};
use octrack_core::io::resize::resize_to_width;
use octrack_core::preprocess::Preprocessor;

use super::load_config;

#[derive(Args)]
pub struct PreprocessArgs {
    /// Input image
    pub file: PathBuf,

    /// Output PNG path
    #[arg(short, long, default_value = "processed.png")]
    pub output: PathBuf,

    /// Tracking config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Rescale to this width before processing
    #[arg(long)]
    pub width: Option<usize>,
}

pub fn run(args: &PreprocessArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let mut frame = load_image(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    if let Some(w) = args.width {
        frame = resize_to_width(&frame, w)?;
    }

    let preprocessor = Preprocessor::new(&config.preprocess, frame.size())?;
    let processed = preprocessor.process(&frame)?;

    save_processed_png(&processed, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Processed {} ({}x{}, kernel {} px, gain {:.2})",
        args.file.display(),
        processed.width(),
        processed.height(),
        preprocessor.kernel_pixels(),
        processed.gain
    );
    println!("Saved to {}", args.output.display());

    Ok(())
}
