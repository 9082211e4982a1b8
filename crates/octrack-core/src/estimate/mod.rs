//! Robust motion estimation: RANSAC similarity fit followed by an
//! inlier-count gate and a displacement-dispersion gate.

pub mod config;
pub mod motion;
pub mod ransac;
pub mod similarity;

pub use config::{EstimationParams, RansacParams};
pub use motion::{displacement_stats, estimate_motion, DisplacementStats, MotionEstimate};
pub use ransac::{fit_similarity_ransac, Correspondence, RansacFit};
pub use similarity::SimilarityTransform;
