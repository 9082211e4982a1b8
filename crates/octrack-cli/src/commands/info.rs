use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use octrack_core::io::ser::SerReader;
use octrack_core::io::source::{FrameSource, ImageSequenceSource};

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file or directory of images
    pub input: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    if args.input.is_dir() {
        sequence_info(&args.input)
    } else {
        ser_info(&args.input)
    }
}

fn ser_info(path: &Path) -> Result<()> {
    let reader =
        SerReader::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let info = reader.source_info(path);

    println!("File:        {}", info.filename.display());
    println!("Frames:      {}", info.total_frames);
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Bit depth:   {}", info.bit_depth);
    println!("Color mode:  {:?}", info.color_mode);
    for (label, value) in [
        ("Operator:   ", &info.operator),
        ("Camera:     ", &info.camera),
        ("Optics:     ", &info.optics),
    ] {
        if let Some(v) = value {
            println!("{label} {v}");
        }
    }

    let total = reader.frame_count();
    let last = total.checked_sub(1).and_then(|i| reader.timestamp_us(i));
    match (reader.timestamp_us(0), last) {
        (Some(first), Some(last)) if total > 1 && last > first => {
            let seconds = (last - first) as f64 / 1e6;
            println!("Duration:    {:.3} s", seconds);
            println!("Frame rate:  {:.2} fps", (total - 1) as f64 / seconds);
        }
        _ => println!("Timestamps:  none"),
    }

    Ok(())
}

fn sequence_info(dir: &Path) -> Result<()> {
    let source = ImageSequenceSource::open(dir, None)
        .with_context(|| format!("Failed to open {}", dir.display()))?;
    let paths = source.paths();

    println!("Directory:   {}", dir.display());
    println!("Frames:      {}", source.frame_count());
    println!("Dimensions:  {}", source.frame_size());
    if let (Some(first), Some(last)) = (paths.first(), paths.last()) {
        println!("First:       {}", first.display());
        println!("Last:        {}", last.display());
    }
    println!("Frame rate:  {} fps (assumed)", source.frame_rate());

    Ok(())
}
