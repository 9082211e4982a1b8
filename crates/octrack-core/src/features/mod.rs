//! Keypoint detection, binary descriptors and descriptor matching.

pub mod config;
pub mod fast;
pub mod harris;
pub mod matcher;
mod orb;
pub mod pattern;

pub use config::FeatureConfig;
pub use matcher::{hamming_distance, match_descriptors, Match};
pub use orb::OrbDetector;

use serde::{Deserialize, Serialize};

use crate::consts::DESCRIPTOR_BYTES;
use crate::frame::ProcessedFrame;

/// 256-bit binary descriptor, compared by Hamming distance.
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// A detected salient image location.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Column position in pixels.
    pub x: f32,
    /// Row position in pixels.
    pub y: f32,
    /// Detector response; larger is stronger.
    pub response: f32,
    /// Orientation in radians.
    pub angle: f32,
}

/// Keypoints with their descriptors, index-aligned.
#[derive(Clone, Debug, Default)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Keypoint detector + descriptor extractor.
///
/// Implementations must return exactly one descriptor per keypoint and an
/// empty set (not an error) when a frame has no features.
pub trait FeatureDetector: Send + Sync {
    fn detect(&self, frame: &ProcessedFrame) -> Features;

    fn name(&self) -> &'static str;
}
