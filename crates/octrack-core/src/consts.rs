/// Minimum frame count to use frame-level Rayon parallelism in offline sessions.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Mid-gray level that a zero residual maps to in a processed frame.
pub const PROCESSED_MID_GRAY: f32 = 127.0;

/// Lower bound of the automatic contrast gain.
pub const MIN_CONTRAST_GAIN: f32 = 1.0;

/// Upper bound of the automatic contrast gain. Bounds amplification of near-flat frames.
pub const MAX_CONTRAST_GAIN: f32 = 30.0;

/// Default high-pass box kernel size, relative to frame width.
pub const DEFAULT_KERNEL_SIZE: f64 = 20.0 / 600.0;

/// Default row peak-to-peak quantile for the contrast gain.
pub const DEFAULT_CONTRAST_QUANTILE: f64 = 0.95;

/// Default reflection threshold on the 8-bit intensity scale.
pub const DEFAULT_REFLECTION_THRESHOLD: f32 = 245.0;

/// Default reflection-mask dilation size, relative to min(width, height).
pub const DEFAULT_DILATION_SIZE: f64 = 0.05;

/// Default circular region-of-interest radius, relative to frame width.
pub const DEFAULT_ROI_RADIUS: f64 = 0.6;

/// Default circular region-of-interest center, relative coordinates.
pub const DEFAULT_ROI_CENTER: (f64, f64) = (0.5, 0.5);

/// Default keypoint budget per frame.
pub const DEFAULT_MAX_KEYPOINTS: usize = 500;

/// Default FAST intensity threshold on the 8-bit scale.
pub const DEFAULT_FAST_THRESHOLD: u8 = 20;

/// Side length of the square patch used for orientation and BRIEF sampling. Must be odd.
pub const ORB_PATCH_SIZE: usize = 31;

/// Number of bytes in a binary descriptor (256 bits).
pub const DESCRIPTOR_BYTES: usize = 32;

/// Seed of the BRIEF sampling pattern. Both frames of a session must share it.
pub const DEFAULT_PATTERN_SEED: u64 = 0x0c7_b3a4;

/// Harris detector free parameter.
pub const HARRIS_K: f32 = 0.04;

/// Default minimum number of matches (and inliers) required; the gate is `<=`.
pub const DEFAULT_MIN_MATCHES: usize = 15;

/// Default maximum combined standard deviation of inlier displacements, in pixels.
pub const DEFAULT_STD_DEV_THRESHOLD: f64 = 3.0;

/// Default number of inlier connections flagged for display.
pub const DEFAULT_MAX_DISPLAY_MATCHES: usize = 30;

/// RANSAC reprojection tolerance in pixels.
pub const DEFAULT_RANSAC_THRESHOLD: f64 = 3.0;

/// RANSAC confidence of having drawn at least one all-inlier sample.
pub const DEFAULT_RANSAC_CONFIDENCE: f64 = 0.95;

/// Hard cap on RANSAC iterations.
pub const DEFAULT_RANSAC_MAX_ITERATIONS: usize = 2000;

/// Points closer than this (pixels) are treated as coincident when sampling.
pub const DEGENERATE_SAMPLE_DISTANCE: f64 = 1e-6;

/// Frame rate assumed when a source carries no timestamps.
pub const DEFAULT_FRAME_RATE: f64 = 25.0;
