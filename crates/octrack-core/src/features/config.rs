use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FAST_THRESHOLD, DEFAULT_MAX_KEYPOINTS, DEFAULT_PATTERN_SEED};
use crate::error::{Result, TrackError};

/// Configuration of the default ORB-style feature detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Maximum number of keypoints kept per frame (strongest first).
    #[serde(default = "default_max_keypoints")]
    pub max_keypoints: usize,
    /// FAST intensity difference threshold on the 8-bit scale.
    #[serde(default = "default_fast_threshold")]
    pub fast_threshold: u8,
    /// Seed of the BRIEF sampling pattern.
    #[serde(default = "default_pattern_seed")]
    pub pattern_seed: u64,
}

fn default_max_keypoints() -> usize {
    DEFAULT_MAX_KEYPOINTS
}
fn default_fast_threshold() -> u8 {
    DEFAULT_FAST_THRESHOLD
}
fn default_pattern_seed() -> u64 {
    DEFAULT_PATTERN_SEED
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_keypoints: DEFAULT_MAX_KEYPOINTS,
            fast_threshold: DEFAULT_FAST_THRESHOLD,
            pattern_seed: DEFAULT_PATTERN_SEED,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_keypoints == 0 {
            return Err(TrackError::invalid_config(
                "features.max_keypoints",
                "must be > 0",
            ));
        }
        if self.fast_threshold == 0 {
            return Err(TrackError::invalid_config(
                "features.fast_threshold",
                "must be > 0",
            ));
        }
        Ok(())
    }
}
