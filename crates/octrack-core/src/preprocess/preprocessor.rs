use ndarray::{Array2, Zip};
use tracing::debug;

use crate::consts::PROCESSED_MID_GRAY;
use crate::error::{Result, TrackError};
use crate::frame::{Frame, FrameSize, ProcessedFrame};

use super::box_blur::low_pass;
use super::config::PreprocessConfig;
use super::contrast::contrast_gain;
use super::morphology::dilate_rect;
use super::roi::outside_circle_mask;

/// Normalizes raw frames of one fixed size into 8-bit residual frames.
///
/// All relative sizes are resolved to pixels at construction, so `process`
/// only does per-frame work.
#[derive(Clone, Debug)]
pub struct Preprocessor {
    size: FrameSize,
    kernel: usize,
    padding: usize,
    dilation: usize,
    contrast_quantile: f64,
    reflection_threshold: f32,
    roi_mask: Option<Array2<bool>>,
}

impl Preprocessor {
    pub fn new(config: &PreprocessConfig, size: FrameSize) -> Result<Self> {
        config.validate()?;
        if size.width == 0 || size.height == 0 {
            return Err(TrackError::InvalidDimensions {
                width: size.width as u32,
                height: size.height as u32,
            });
        }

        // Ties round to even.
        let kernel_px = (config.kernel_size * size.width as f64).min(size.width as f64);
        let kernel = (kernel_px.round_ties_even() as usize).clamp(1, size.width);
        let padding = (kernel_px / 2.0).floor() as usize + 1;
        let dilation = (config.dilation_size * size.min_side() as f64).floor() as usize;
        let roi_mask = config
            .roi
            .as_ref()
            .map(|roi| outside_circle_mask(size, roi));

        debug!(
            %size,
            kernel,
            padding,
            dilation,
            roi = roi_mask.is_some(),
            "Preprocessor configured"
        );

        Ok(Self {
            size,
            kernel,
            padding,
            dilation,
            contrast_quantile: config.contrast_quantile,
            reflection_threshold: config.reflection_threshold,
            roi_mask,
        })
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Box kernel width in pixels.
    pub fn kernel_pixels(&self) -> usize {
        self.kernel
    }

    /// Reflection-mask dilation width in pixels.
    pub fn dilation_pixels(&self) -> usize {
        self.dilation
    }

    /// Residual signal before contrast scaling: raw minus low-pass, with
    /// reflections and the area outside the region of interest zeroed.
    pub fn residual(&self, frame: &Frame) -> Result<Array2<f32>> {
        if frame.size() != self.size {
            return Err(TrackError::FrameSizeMismatch {
                width: self.size.width,
                height: self.size.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        let lp = low_pass(&frame.data, self.kernel, self.padding);
        let mut residual = &frame.data - &lp;

        let mask = self.reflection_mask(&frame.data);
        Zip::from(&mut residual).and(&mask).for_each(|r, &m| {
            if m {
                *r = 0.0;
            }
        });

        if let Some(outside) = &self.roi_mask {
            Zip::from(&mut residual).and(outside).for_each(|r, &m| {
                if m {
                    *r = 0.0;
                }
            });
        }

        Ok(residual)
    }

    /// Saturated pixels (strictly above the threshold), dilated to cover halos.
    pub fn reflection_mask(&self, raw: &Array2<f32>) -> Array2<bool> {
        let threshold = self.reflection_threshold;
        let saturated = raw.mapv(|v| v > threshold);
        dilate_rect(&saturated, self.dilation)
    }

    /// Full normalization: residual, contrast gain, shift to mid-gray, clip to 8 bits.
    pub fn process(&self, frame: &Frame) -> Result<ProcessedFrame> {
        let residual = self.residual(frame)?;
        let gain = contrast_gain(&residual, self.contrast_quantile);
        let data = residual.mapv(|v| (gain * v + PROCESSED_MID_GRAY).clamp(0.0, 255.0) as u8);

        debug!(
            frame = frame.metadata.frame_index,
            gain, "Frame preprocessed"
        );

        Ok(ProcessedFrame { data, gain })
    }
}
