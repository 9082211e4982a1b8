use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_MAX_DISPLAY_MATCHES, DEFAULT_MIN_MATCHES, DEFAULT_RANSAC_CONFIDENCE,
    DEFAULT_RANSAC_MAX_ITERATIONS, DEFAULT_RANSAC_THRESHOLD, DEFAULT_STD_DEV_THRESHOLD,
};
use crate::error::{Result, TrackError};

/// Decision thresholds of the motion estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimationParams {
    /// Matches and inliers must both be strictly above this count.
    #[serde(default = "default_min_matches")]
    pub min_matches: usize,
    /// Maximum combined standard deviation of inlier displacements, in pixels.
    #[serde(default = "default_std_dev_threshold")]
    pub std_dev_threshold: f64,
    /// Number of inlier matches flagged for display.
    #[serde(default = "default_max_display_matches")]
    pub max_display_matches: usize,
    #[serde(default)]
    pub ransac: RansacParams,
}

/// Parameters of the RANSAC similarity fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RansacParams {
    /// Reprojection tolerance in pixels; a pair is an inlier at or below it.
    #[serde(default = "default_ransac_threshold")]
    pub threshold: f64,
    /// Desired probability of drawing at least one all-inlier sample.
    #[serde(default = "default_ransac_confidence")]
    pub confidence: f64,
    /// Hard iteration cap.
    #[serde(default = "default_ransac_max_iterations")]
    pub max_iterations: usize,
    /// Optional seed for reproducible sampling. Unset draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_min_matches() -> usize {
    DEFAULT_MIN_MATCHES
}
fn default_std_dev_threshold() -> f64 {
    DEFAULT_STD_DEV_THRESHOLD
}
fn default_max_display_matches() -> usize {
    DEFAULT_MAX_DISPLAY_MATCHES
}
fn default_ransac_threshold() -> f64 {
    DEFAULT_RANSAC_THRESHOLD
}
fn default_ransac_confidence() -> f64 {
    DEFAULT_RANSAC_CONFIDENCE
}
fn default_ransac_max_iterations() -> usize {
    DEFAULT_RANSAC_MAX_ITERATIONS
}

impl Default for EstimationParams {
    fn default() -> Self {
        Self {
            min_matches: DEFAULT_MIN_MATCHES,
            std_dev_threshold: DEFAULT_STD_DEV_THRESHOLD,
            max_display_matches: DEFAULT_MAX_DISPLAY_MATCHES,
            ransac: RansacParams::default(),
        }
    }
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_RANSAC_THRESHOLD,
            confidence: DEFAULT_RANSAC_CONFIDENCE,
            max_iterations: DEFAULT_RANSAC_MAX_ITERATIONS,
            seed: None,
        }
    }
}

impl EstimationParams {
    pub fn validate(&self) -> Result<()> {
        if self.min_matches == 0 {
            return Err(TrackError::invalid_config(
                "estimation.min_matches",
                "must be > 0",
            ));
        }
        if !(self.std_dev_threshold > 0.0) {
            return Err(TrackError::invalid_config(
                "estimation.std_dev_threshold",
                format!("must be > 0, got {}", self.std_dev_threshold),
            ));
        }
        self.ransac.validate()
    }
}

impl RansacParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold > 0.0 && self.threshold.is_finite()) {
            return Err(TrackError::invalid_config(
                "estimation.ransac.threshold",
                format!("must be > 0, got {}", self.threshold),
            ));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(TrackError::invalid_config(
                "estimation.ransac.confidence",
                format!("must be in (0, 1), got {}", self.confidence),
            ));
        }
        if self.max_iterations == 0 {
            return Err(TrackError::invalid_config(
                "estimation.ransac.max_iterations",
                "must be > 0",
            ));
        }
        Ok(())
    }
}
