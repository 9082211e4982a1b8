use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use octrack_core::config::TrackingConfig;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long, conflicts_with = "check")]
    pub output: Option<PathBuf>,

    /// Validate an existing config and print it with defaults filled in
    #[arg(long)]
    pub check: Option<PathBuf>,
}

pub fn run(args: &ConfigArgs) -> Result<()> {
    let config = match args.check {
        Some(ref path) => TrackingConfig::from_file(path)
            .with_context(|| format!("Invalid tracking config {}", path.display()))?,
        None => TrackingConfig::default(),
    };
    let toml_str = config.to_toml_string()?;

    match (&args.output, &args.check) {
        (Some(path), _) => {
            std::fs::write(path, &toml_str)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;
            println!("Default config saved to {}", path.display());
        }
        (None, Some(path)) => {
            println!("# {} is valid", path.display());
            print!("{}", toml_str);
        }
        (None, None) => print!("{}", toml_str),
    }

    Ok(())
}
