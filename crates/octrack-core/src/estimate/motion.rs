use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::features::{match_descriptors, Descriptor, Keypoint, Match};
use crate::frame::{FrameSize, Shift};

use super::config::EstimationParams;
use super::ransac::{fit_similarity_ransac, Correspondence};
use super::similarity::SimilarityTransform;

/// Result of estimating the motion of one frame against the reference.
///
/// `matches`, `inlier_mask` and `display_mask` are index-aligned and empty
/// unless `success` is set. Keypoints are attached either way.
#[derive(Clone, Debug, Serialize)]
pub struct MotionEstimate {
    pub success: bool,
    /// Mean displacement of the inlier matches, current minus reference.
    pub shift: Option<Shift>,
    /// Similarity fitted by RANSAC, for diagnostics.
    pub transform: Option<SimilarityTransform>,
    pub inlier_mask: Vec<bool>,
    pub matches: Vec<Match>,
    pub reference_keypoints: Vec<Keypoint>,
    pub current_keypoints: Vec<Keypoint>,
    /// Subset of `inlier_mask` flagged for display.
    pub display_mask: Vec<bool>,
}

impl MotionEstimate {
    pub fn not_found(reference_keypoints: Vec<Keypoint>, current_keypoints: Vec<Keypoint>) -> Self {
        Self {
            success: false,
            shift: None,
            transform: None,
            inlier_mask: Vec::new(),
            matches: Vec::new(),
            reference_keypoints,
            current_keypoints,
            display_mask: Vec::new(),
        }
    }

    pub fn inlier_count(&self) -> usize {
        self.inlier_mask.iter().filter(|&&b| b).count()
    }

    /// Confidence weight in [0.5, 1] growing with the inlier surplus over
    /// `min_matches`; 0 when nothing was found.
    pub fn quality_weight(&self, min_matches: usize) -> f64 {
        if !self.success {
            return 0.0;
        }
        let min = min_matches as f64;
        let surplus = self.inlier_count() as f64 - min;
        (0.5 + 0.5 * surplus / (5.0 * min)).min(1.0)
    }

    /// Where the frame centre of the current view lies in reference
    /// coordinates, as integer `(x, y)`. `None` when not found or when the
    /// point falls on or outside the frame edge. Ties round to even.
    pub fn beam_in_reference(&self, size: FrameSize) -> Option<(usize, usize)> {
        let shift = self.shift?;
        let x = (size.width as f64 / 2.0 - shift.dx).round_ties_even();
        let y = (size.height as f64 / 2.0 - shift.dy).round_ties_even();
        let inside = x > 0.0 && x < size.width as f64 && y > 0.0 && y < size.height as f64;
        inside.then_some((x as usize, y as usize))
    }
}

/// Spread of a set of displacement vectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplacementStats {
    pub mean: Shift,
    /// Population standard deviation along x.
    pub std_x: f64,
    /// Population standard deviation along y.
    pub std_y: f64,
    /// `sqrt(std_x² + std_y²)`
    pub combined: f64,
}

/// Mean and population standard deviation of `displacements`.
/// Returns `None` for an empty set.
pub fn displacement_stats(displacements: &[[f64; 2]]) -> Option<DisplacementStats> {
    if displacements.is_empty() {
        return None;
    }
    let n = displacements.len() as f64;
    let mx = displacements.iter().map(|d| d[0]).sum::<f64>() / n;
    let my = displacements.iter().map(|d| d[1]).sum::<f64>() / n;
    let vx = displacements.iter().map(|d| (d[0] - mx).powi(2)).sum::<f64>() / n;
    let vy = displacements.iter().map(|d| (d[1] - my).powi(2)).sum::<f64>() / n;
    let (std_x, std_y) = (vx.sqrt(), vy.sqrt());

    Some(DisplacementStats {
        mean: Shift::new(mx, my),
        std_x,
        std_y,
        combined: std_x.hypot(std_y),
    })
}

/// Estimate the shift of the current frame relative to the reference.
///
/// Matches descriptors, fits a similarity with RANSAC, then accepts the
/// result only if both the match count and the inlier count exceed
/// `min_matches` and the inlier displacements do not scatter by more than
/// `std_dev_threshold`. The shift is the mean inlier displacement.
pub fn estimate_motion<R: Rng + ?Sized>(
    reference_keypoints: &[Keypoint],
    reference_descriptors: &[Descriptor],
    current_keypoints: &[Keypoint],
    current_descriptors: &[Descriptor],
    params: &EstimationParams,
    rng: &mut R,
) -> MotionEstimate {
    let not_found =
        || MotionEstimate::not_found(reference_keypoints.to_vec(), current_keypoints.to_vec());

    let matches = match_descriptors(reference_descriptors, current_descriptors);
    if matches.len() <= params.min_matches {
        debug!(
            matches = matches.len(),
            min = params.min_matches,
            "Rejected: too few matches"
        );
        return not_found();
    }

    let pairs: Vec<Correspondence> = matches
        .iter()
        .map(|m| {
            let r = &reference_keypoints[m.reference_idx];
            let c = &current_keypoints[m.current_idx];
            Correspondence::new([r.x as f64, r.y as f64], [c.x as f64, c.y as f64])
        })
        .collect();

    let Some(fit) = fit_similarity_ransac(&pairs, &params.ransac, rng) else {
        debug!(matches = matches.len(), "Rejected: no similarity model");
        return not_found();
    };
    if fit.inlier_count <= params.min_matches {
        debug!(
            matches = matches.len(),
            inliers = fit.inlier_count,
            min = params.min_matches,
            "Rejected: too few inliers"
        );
        return not_found();
    }

    let displacements: Vec<[f64; 2]> = pairs
        .iter()
        .zip(&fit.inliers)
        .filter(|(_, &inlier)| inlier)
        .map(|(c, _)| c.displacement())
        .collect();
    let Some(stats) = displacement_stats(&displacements) else {
        return not_found();
    };
    if stats.combined > params.std_dev_threshold {
        debug!(
            inliers = fit.inlier_count,
            dispersion = stats.combined,
            threshold = params.std_dev_threshold,
            "Rejected: inlier displacements too scattered"
        );
        return not_found();
    }

    let display_mask = display_subset(&fit.inliers, params.max_display_matches);

    debug!(
        matches = matches.len(),
        inliers = fit.inlier_count,
        dispersion = stats.combined,
        dx = stats.mean.dx,
        dy = stats.mean.dy,
        "Motion found"
    );

    MotionEstimate {
        success: true,
        shift: Some(stats.mean),
        transform: Some(fit.transform),
        inlier_mask: fit.inliers,
        matches,
        reference_keypoints: reference_keypoints.to_vec(),
        current_keypoints: current_keypoints.to_vec(),
        display_mask,
    }
}

/// Keep only the first `limit` set entries of `mask`.
fn display_subset(mask: &[bool], limit: usize) -> Vec<bool> {
    let mut remaining = limit;
    mask.iter()
        .map(|&set| {
            if set && remaining > 0 {
                remaining -= 1;
                true
            } else {
                false
            }
        })
        .collect()
}
