use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::estimate::EstimationParams;
use crate::features::FeatureConfig;
use crate::preprocess::PreprocessConfig;

/// Complete tracking configuration. Every table and field is optional in
/// TOML and falls back to its default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub estimation: EstimationParams,
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<()> {
        self.preprocess.validate()?;
        self.features.validate()?;
        self.estimation.validate()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
