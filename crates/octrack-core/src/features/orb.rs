use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::{DESCRIPTOR_BYTES, HARRIS_K, ORB_PATCH_SIZE};
use crate::frame::ProcessedFrame;
use crate::preprocess::box_blur::box_blur_array;

use super::config::FeatureConfig;
use super::fast::detect_corners;
use super::harris::harris_response;
use super::pattern::{generate_pattern, PointPair};
use super::{Descriptor, FeatureDetector, Features, Keypoint};

/// Box kernel applied before sampling descriptor intensities.
const DESCRIPTOR_SMOOTHING: usize = 5;

/// Oriented FAST + rotated BRIEF detector.
///
/// Single scale: the tracked surface does not change scale noticeably
/// between the reference and the current view.
#[derive(Clone, Debug)]
pub struct OrbDetector {
    max_keypoints: usize,
    fast_threshold: u8,
    pattern: Vec<PointPair>,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    row: usize,
    col: usize,
    response: f32,
}

impl OrbDetector {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            max_keypoints: config.max_keypoints,
            fast_threshold: config.fast_threshold,
            pattern: generate_pattern(config.pattern_seed),
        }
    }

    pub fn max_keypoints(&self) -> usize {
        self.max_keypoints
    }

    /// Pixels excluded at every border so the orientation patch stays inside the frame.
    pub fn border() -> usize {
        ORB_PATCH_SIZE / 2 + 1
    }

    fn strongest_corners(&self, image: &Array2<u8>) -> Vec<Candidate> {
        let corners = detect_corners(image, self.fast_threshold, Self::border());

        let mut candidates: Vec<Candidate> = corners
            .par_iter()
            .map(|c| Candidate {
                row: c.row,
                col: c.col,
                response: harris_response(image, c.row, c.col, HARRIS_K),
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.response
                .total_cmp(&a.response)
                .then(a.row.cmp(&b.row))
                .then(a.col.cmp(&b.col))
        });
        candidates.truncate(self.max_keypoints);
        candidates
    }

    fn describe(&self, smoothed: &Array2<f32>, row: usize, col: usize, angle: f32) -> Descriptor {
        let (sin_a, cos_a) = angle.sin_cos();
        let sample = |(dx, dy): (i32, i32)| {
            let (dx, dy) = (dx as f32, dy as f32);
            let rx = (cos_a * dx - sin_a * dy).round() as isize;
            let ry = (sin_a * dx + cos_a * dy).round() as isize;
            smoothed[[(row as isize + ry) as usize, (col as isize + rx) as usize]]
        };

        let mut descriptor = [0u8; DESCRIPTOR_BYTES];
        for (bit, pair) in self.pattern.iter().enumerate() {
            if sample(pair.a) < sample(pair.b) {
                descriptor[bit / 8] |= 1 << (bit % 8);
            }
        }
        descriptor
    }
}

impl FeatureDetector for OrbDetector {
    fn detect(&self, frame: &ProcessedFrame) -> Features {
        let candidates = self.strongest_corners(&frame.data);
        if candidates.is_empty() {
            return Features::default();
        }

        let smoothed = box_blur_array(&frame.data.mapv(f32::from), DESCRIPTOR_SMOOTHING);

        let (keypoints, descriptors): (Vec<Keypoint>, Vec<Descriptor>) = candidates
            .par_iter()
            .map(|c| {
                let angle = intensity_centroid_angle(&frame.data, c.row, c.col);
                let keypoint = Keypoint {
                    x: c.col as f32,
                    y: c.row as f32,
                    response: c.response,
                    angle,
                };
                (keypoint, self.describe(&smoothed, c.row, c.col, angle))
            })
            .unzip();

        Features {
            keypoints,
            descriptors,
        }
    }

    fn name(&self) -> &'static str {
        "orb"
    }
}

/// Orientation of the intensity centroid over a disk of the patch radius.
fn intensity_centroid_angle(image: &Array2<u8>, row: usize, col: usize) -> f32 {
    let radius = (ORB_PATCH_SIZE / 2) as isize;
    let r2 = radius * radius;

    let mut m01 = 0.0f64;
    let mut m10 = 0.0f64;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let v = image[[(row as isize + dy) as usize, (col as isize + dx) as usize]] as f64;
            m10 += dx as f64 * v;
            m01 += dy as f64 * v;
        }
    }
    m01.atan2(m10) as f32
}
