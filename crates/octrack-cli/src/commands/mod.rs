pub mod config;
pub mod info;
pub mod preprocess;
pub mod track;

use std::path::Path;

use anyhow::{Context, Result};
use octrack_core::config::TrackingConfig;

/// Load a TOML tracking config, or the defaults when no path is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<TrackingConfig> {
    match path {
        Some(p) => TrackingConfig::from_file(p)
            .with_context(|| format!("Invalid tracking config {}", p.display())),
        None => Ok(TrackingConfig::default()),
    }
}
