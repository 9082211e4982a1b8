use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CONTRAST_QUANTILE, DEFAULT_DILATION_SIZE, DEFAULT_KERNEL_SIZE,
    DEFAULT_REFLECTION_THRESHOLD, DEFAULT_ROI_CENTER, DEFAULT_ROI_RADIUS,
};
use crate::error::{Result, TrackError};

/// Configuration of the frame preprocessor.
///
/// Relative sizes are converted to pixels once the frame size is known.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// High-pass box kernel size as a fraction of the frame width, in (0, 1].
    #[serde(default = "default_kernel_size")]
    pub kernel_size: f64,
    /// Inclusion quantile of the row peak-to-peak ranges used for the
    /// contrast gain, in (0, 1). 0.95 ignores the 5% most extreme rows.
    #[serde(default = "default_contrast_quantile")]
    pub contrast_quantile: f64,
    /// Raw intensities strictly above this value are treated as reflections.
    #[serde(default = "default_reflection_threshold")]
    pub reflection_threshold: f32,
    /// Dilation size of the reflection mask as a fraction of min(width, height).
    #[serde(default = "default_dilation_size")]
    pub dilation_size: f64,
    /// Optional circular region of interest; everything outside is zeroed.
    /// Omitting the table in a config file disables the mask.
    #[serde(default)]
    pub roi: Option<RoiConfig>,
}

/// Circular region of interest in relative units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiConfig {
    /// Radius as a fraction of the frame width, in (0, 1].
    pub radius: f64,
    /// Center as (x, y) fractions of width and height, each in [0, 1].
    pub center: (f64, f64),
}

fn default_kernel_size() -> f64 {
    DEFAULT_KERNEL_SIZE
}
fn default_contrast_quantile() -> f64 {
    DEFAULT_CONTRAST_QUANTILE
}
fn default_reflection_threshold() -> f32 {
    DEFAULT_REFLECTION_THRESHOLD
}
fn default_dilation_size() -> f64 {
    DEFAULT_DILATION_SIZE
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_KERNEL_SIZE,
            contrast_quantile: DEFAULT_CONTRAST_QUANTILE,
            reflection_threshold: DEFAULT_REFLECTION_THRESHOLD,
            dilation_size: DEFAULT_DILATION_SIZE,
            roi: Some(RoiConfig::default()),
        }
    }
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_ROI_RADIUS,
            center: DEFAULT_ROI_CENTER,
        }
    }
}

impl PreprocessConfig {
    /// Check every parameter against its documented range.
    pub fn validate(&self) -> Result<()> {
        if !(self.kernel_size > 0.0 && self.kernel_size <= 1.0) {
            return Err(TrackError::invalid_config(
                "preprocess.kernel_size",
                format!("must be in (0, 1], got {}", self.kernel_size),
            ));
        }
        if !(self.contrast_quantile > 0.0 && self.contrast_quantile < 1.0) {
            return Err(TrackError::invalid_config(
                "preprocess.contrast_quantile",
                format!("must be in (0, 1), got {}", self.contrast_quantile),
            ));
        }
        if !(0.0..=255.0).contains(&self.reflection_threshold) {
            return Err(TrackError::invalid_config(
                "preprocess.reflection_threshold",
                format!("must be in [0, 255], got {}", self.reflection_threshold),
            ));
        }
        if !(self.dilation_size >= 0.0 && self.dilation_size.is_finite()) {
            return Err(TrackError::invalid_config(
                "preprocess.dilation_size",
                format!("must be >= 0, got {}", self.dilation_size),
            ));
        }
        if let Some(roi) = &self.roi {
            roi.validate()?;
        }
        Ok(())
    }
}

impl RoiConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.radius > 0.0 && self.radius <= 1.0) {
            return Err(TrackError::invalid_config(
                "preprocess.roi.radius",
                format!("must be in (0, 1], got {}", self.radius),
            ));
        }
        let (cx, cy) = self.center;
        if !(0.0..=1.0).contains(&cx) || !(0.0..=1.0).contains(&cy) {
            return Err(TrackError::invalid_config(
                "preprocess.roi.center",
                format!("must be in [0, 1]^2, got ({cx}, {cy})"),
            ));
        }
        Ok(())
    }
}
