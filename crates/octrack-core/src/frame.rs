use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single raw grayscale frame.
/// Pixel values are f32 on the 8-bit intensity scale [0.0, 255.0].
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Per-frame metadata
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(data: Array2<f32>) -> Self {
        Self {
            data,
            metadata: FrameMetadata::default(),
        }
    }

    pub fn with_metadata(data: Array2<f32>, metadata: FrameMetadata) -> Self {
        Self { data, metadata }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn size(&self) -> FrameSize {
        FrameSize {
            width: self.width(),
            height: self.height(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameMetadata {
    pub frame_index: usize,
    pub timestamp_us: Option<u64>,
}

/// Frame dimensions in pixels. Constant for a tracking session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: usize,
    pub height: usize,
}

impl FrameSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn min_side(&self) -> usize {
        self.width.min(self.height)
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Normalized 8-bit frame: high-passed residual centred on mid-gray (127).
#[derive(Clone, Debug)]
pub struct ProcessedFrame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<u8>,
    /// Contrast gain applied to the residual, always within [1, 30].
    pub gain: f32,
}

impl ProcessedFrame {
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

/// Translation of the current view relative to the reference view, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub dx: f64,
    pub dy: f64,
}

impl Shift {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn magnitude(&self) -> f64 {
        self.dx.hypot(self.dy)
    }
}

/// Color/Bayer mode of the source data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColorMode {
    Mono,
    BayerRGGB,
    BayerGRBG,
    BayerGBRG,
    BayerBGGR,
    RGB,
    BGR,
}

/// Metadata about a recorded source file.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub filename: PathBuf,
    pub total_frames: usize,
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_mode: ColorMode,
    /// Operator name recorded by the capture software.
    pub operator: Option<String>,
    pub camera: Option<String>,
    /// Lens or scan optics description.
    pub optics: Option<String>,
}
