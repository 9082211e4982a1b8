//! RANSAC wrapper around the similarity solver.

use rand::seq::index::sample;
use rand::Rng;
use tracing::debug;

use crate::consts::DEGENERATE_SAMPLE_DISTANCE;

use super::config::RansacParams;
use super::similarity::SimilarityTransform;

/// Minimal sample size of a 4-DOF similarity.
const SAMPLE_SIZE: usize = 2;

/// A point pair: position in the reference frame and in the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correspondence {
    pub reference: [f64; 2],
    pub current: [f64; 2],
}

impl Correspondence {
    pub fn new(reference: [f64; 2], current: [f64; 2]) -> Self {
        Self { reference, current }
    }

    /// Current position minus reference position.
    pub fn displacement(&self) -> [f64; 2] {
        [
            self.current[0] - self.reference[0],
            self.current[1] - self.reference[1],
        ]
    }
}

/// Outcome of a successful RANSAC fit.
#[derive(Clone, Debug)]
pub struct RansacFit {
    /// Least-squares model refit on the best consensus set.
    pub transform: SimilarityTransform,
    /// One flag per input correspondence.
    pub inliers: Vec<bool>,
    pub inlier_count: usize,
    /// Hypotheses drawn, degenerate ones included.
    pub iterations: usize,
}

/// Robustly fit a similarity mapping reference points onto current points.
///
/// Samples pairs of correspondences, scores each hypothesis by its inlier
/// count (reprojection error at or below `params.threshold`) and keeps the
/// best. The iteration budget shrinks as the best inlier ratio improves and
/// never exceeds `params.max_iterations`. The winner is refit on its inliers
/// and the inliers are classified again against the refit model.
///
/// Returns `None` for fewer than two correspondences or when no
/// non-degenerate hypothesis was found.
pub fn fit_similarity_ransac<R: Rng + ?Sized>(
    pairs: &[Correspondence],
    params: &RansacParams,
    rng: &mut R,
) -> Option<RansacFit> {
    let n = pairs.len();
    if n < SAMPLE_SIZE {
        return None;
    }

    let mut best: Option<(SimilarityTransform, usize)> = None;
    let mut required = params.max_iterations;
    let mut iterations = 0usize;

    while iterations < required {
        iterations += 1;

        let picked = sample(rng, n, SAMPLE_SIZE);
        let (p, q) = (pairs[picked.index(0)], pairs[picked.index(1)]);
        if is_degenerate(&p, &q) {
            continue;
        }
        let Some(model) = SimilarityTransform::fit(
            [p, q].iter().map(|c| (c.reference, c.current)),
        ) else {
            continue;
        };

        let count = count_inliers(pairs, &model, params.threshold);
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((model, count));
            let bound = adaptive_iterations(count, n, params.confidence);
            required = required.min(bound.max(iterations));
        }
    }

    let (model, _) = best?;
    let first_pass = classify(pairs, &model, params.threshold);
    let refit = SimilarityTransform::fit(
        pairs
            .iter()
            .zip(&first_pass)
            .filter(|(_, &inlier)| inlier)
            .map(|(c, _)| (c.reference, c.current)),
    )
    .unwrap_or(model);

    let inliers = classify(pairs, &refit, params.threshold);
    let inlier_count = inliers.iter().filter(|&&b| b).count();

    debug!(
        correspondences = n,
        inlier_count, iterations, "RANSAC similarity fit"
    );

    Some(RansacFit {
        transform: refit,
        inliers,
        inlier_count,
        iterations,
    })
}

/// Iterations needed to draw one all-inlier sample with the given confidence,
/// `ln(1 − conf) / ln(1 − w²)` for inlier ratio `w`.
fn adaptive_iterations(inliers: usize, total: usize, confidence: f64) -> usize {
    let w = inliers as f64 / total as f64;
    let all_inlier = w.powi(SAMPLE_SIZE as i32);
    if all_inlier >= 1.0 {
        return 1;
    }
    if all_inlier <= 0.0 {
        return usize::MAX;
    }
    let est = ((1.0 - confidence).ln() / (1.0 - all_inlier).ln()).ceil();
    if est.is_finite() && est > 0.0 {
        est as usize
    } else {
        usize::MAX
    }
}

fn is_degenerate(p: &Correspondence, q: &Correspondence) -> bool {
    let d_ref = (p.reference[0] - q.reference[0]).hypot(p.reference[1] - q.reference[1]);
    let d_cur = (p.current[0] - q.current[0]).hypot(p.current[1] - q.current[1]);
    d_ref < DEGENERATE_SAMPLE_DISTANCE || d_cur < DEGENERATE_SAMPLE_DISTANCE
}

fn count_inliers(pairs: &[Correspondence], model: &SimilarityTransform, threshold: f64) -> usize {
    pairs
        .iter()
        .filter(|c| model.reprojection_error(c.reference, c.current) <= threshold)
        .count()
}

fn classify(pairs: &[Correspondence], model: &SimilarityTransform, threshold: f64) -> Vec<bool> {
    pairs
        .iter()
        .map(|c| model.reprojection_error(c.reference, c.current) <= threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid_pairs(transform: &SimilarityTransform) -> Vec<Correspondence> {
        (0..6)
            .flat_map(|r| (0..6).map(move |c| [c as f64 * 17.0 + 3.0, r as f64 * 13.0 + 5.0]))
            .map(|p| Correspondence::new(p, transform.apply(p)))
            .collect()
    }

    #[test]
    fn test_exact_translation_all_inliers() {
        let truth = SimilarityTransform::from_parts(1.0, 0.0, 5.0, -3.0);
        let pairs = grid_pairs(&truth);
        let mut rng = StdRng::seed_from_u64(7);

        let fit = fit_similarity_ransac(&pairs, &RansacParams::default(), &mut rng).unwrap();
        assert_eq!(fit.inlier_count, pairs.len());
        assert_abs_diff_eq!(fit.transform.tx, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.transform.ty, -3.0, epsilon = 1e-9);
        assert_eq!(fit.iterations, 1);
    }

    #[test]
    fn test_outliers_rejected() {
        let truth = SimilarityTransform::from_parts(1.05, 0.1, -4.0, 2.0);
        let mut pairs = grid_pairs(&truth);
        // Corrupt every fourth pair well beyond tolerance.
        for (i, c) in pairs.iter_mut().enumerate() {
            if i % 4 == 0 {
                c.current[0] += 40.0 + i as f64;
                c.current[1] -= 25.0;
            }
        }
        let mut rng = StdRng::seed_from_u64(42);

        let fit = fit_similarity_ransac(&pairs, &RansacParams::default(), &mut rng).unwrap();
        for (i, &inlier) in fit.inliers.iter().enumerate() {
            assert_eq!(inlier, i % 4 != 0, "pair {i}");
        }
        assert_abs_diff_eq!(fit.transform.scale(), 1.05, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.transform.rotation(), 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let truth = SimilarityTransform::from_parts(1.0, 0.02, 1.0, 1.0);
        let mut pairs = grid_pairs(&truth);
        for c in pairs.iter_mut().step_by(3) {
            c.current[0] += 10.0;
        }
        let params = RansacParams::default();

        let a = fit_similarity_ransac(&pairs, &params, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = fit_similarity_ransac(&pairs, &params, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a.inliers, b.inliers);
        assert_eq!(a.iterations, b.iterations);
        assert_eq!(a.transform, b.transform);
    }

    #[test]
    fn test_degenerate_input() {
        let pairs = vec![Correspondence::new([1.0, 1.0], [2.0, 2.0]); 10];
        let mut rng = StdRng::seed_from_u64(0);
        let params = RansacParams {
            max_iterations: 50,
            ..RansacParams::default()
        };
        assert!(fit_similarity_ransac(&pairs, &params, &mut rng).is_none());
        assert!(fit_similarity_ransac(&pairs[..1], &params, &mut rng).is_none());
    }

    #[test]
    fn test_adaptive_iterations() {
        assert_eq!(adaptive_iterations(10, 10, 0.95), 1);
        assert_eq!(adaptive_iterations(0, 10, 0.95), usize::MAX);
        // w = 0.5: ln(0.05) / ln(0.75) = 10.41
        assert_eq!(adaptive_iterations(5, 10, 0.95), 11);
    }
}
