use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use octrack_core::estimate::{estimate_motion, EstimationParams, MotionEstimate};
use octrack_core::features::{Descriptor, Keypoint};

fn kp(x: f32, y: f32) -> Keypoint {
    Keypoint {
        x,
        y,
        response: 1.0,
        angle: 0.0,
    }
}

/// `n` reference keypoints on a grid with pairwise distinct descriptors.
fn grid(n: usize) -> (Vec<Keypoint>, Vec<Descriptor>) {
    let keypoints = (0..n)
        .map(|i| kp(20.0 + (i % 8) as f32 * 15.0, 20.0 + (i / 8) as f32 * 12.0))
        .collect();
    let descriptors = (0..n).map(|i| [i as u8; 32]).collect();
    (keypoints, descriptors)
}

fn moved(keypoints: &[Keypoint], f: impl Fn(usize) -> (f32, f32)) -> Vec<Keypoint> {
    keypoints
        .iter()
        .enumerate()
        .map(|(i, k)| {
            let (dx, dy) = f(i);
            kp(k.x + dx, k.y + dy)
        })
        .collect()
}

fn params(min_matches: usize, std_dev_threshold: f64) -> EstimationParams {
    EstimationParams {
        min_matches,
        std_dev_threshold,
        ..EstimationParams::default()
    }
}

fn run(
    ref_kp: &[Keypoint],
    ref_desc: &[Descriptor],
    cur_kp: &[Keypoint],
    cur_desc: &[Descriptor],
    params: &EstimationParams,
) -> MotionEstimate {
    let mut rng = StdRng::seed_from_u64(99);
    estimate_motion(ref_kp, ref_desc, cur_kp, cur_desc, params, &mut rng)
}

fn assert_not_found_shape(est: &MotionEstimate) {
    assert!(!est.success);
    assert!(est.shift.is_none());
    assert!(est.transform.is_none());
    assert!(est.matches.is_empty());
    assert!(est.inlier_mask.is_empty());
    assert!(est.display_mask.is_empty());
}

#[test]
fn test_pure_translation_is_recovered() {
    let (ref_kp, desc) = grid(40);
    let cur_kp = moved(&ref_kp, |_| (5.0, -3.0));
    let est = run(&ref_kp, &desc, &cur_kp, &desc, &EstimationParams::default());

    assert!(est.success);
    let shift = est.shift.unwrap();
    assert_abs_diff_eq!(shift.dx, 5.0, epsilon = 1e-9);
    assert_abs_diff_eq!(shift.dy, -3.0, epsilon = 1e-9);
    assert_eq!(est.matches.len(), 40);
    assert_eq!(est.inlier_count(), 40);
    assert_eq!(est.reference_keypoints.len(), 40);
    assert_eq!(est.current_keypoints.len(), 40);
}

#[test]
fn test_match_count_boundary() {
    let min = 15;

    let (ref_kp, desc) = grid(min);
    let cur_kp = moved(&ref_kp, |_| (2.0, 2.0));
    let est = run(&ref_kp, &desc, &cur_kp, &desc, &params(min, 3.0));
    assert_not_found_shape(&est);
    // Keypoints stay attached for diagnostics.
    assert_eq!(est.reference_keypoints.len(), min);

    let (ref_kp, desc) = grid(min + 1);
    let cur_kp = moved(&ref_kp, |_| (2.0, 2.0));
    let est = run(&ref_kp, &desc, &cur_kp, &desc, &params(min, 3.0));
    assert!(est.success);
    assert_eq!(est.matches.len(), min + 1);
}

#[test]
fn test_inlier_count_gate() {
    // 30 matches, of which 13 agree on a common motion.
    let (ref_kp, desc) = grid(30);
    let cur_kp = moved(&ref_kp, |i| {
        if i < 12 {
            (4.0, 1.0)
        } else {
            ((i * 37 % 50) as f32 - 25.0, (i * 53 % 40) as f32 - 20.0)
        }
    });
    let est = run(&ref_kp, &desc, &cur_kp, &desc, &params(15, 3.0));
    assert_not_found_shape(&est);
}

#[test]
fn test_outliers_do_not_bias_shift() {
    let (ref_kp, desc) = grid(48);
    let cur_kp = moved(&ref_kp, |i| {
        if i % 6 == 0 {
            (40.0 + i as f32, -30.0)
        } else {
            (-7.0, 4.0)
        }
    });
    let est = run(&ref_kp, &desc, &cur_kp, &desc, &EstimationParams::default());

    assert!(est.success);
    let shift = est.shift.unwrap();
    assert_abs_diff_eq!(shift.dx, -7.0, epsilon = 1e-9);
    assert_abs_diff_eq!(shift.dy, 4.0, epsilon = 1e-9);
    assert_eq!(est.inlier_count(), 40);
    for (i, &inlier) in est.inlier_mask.iter().enumerate() {
        assert_eq!(inlier, i % 6 != 0);
    }
}

/// 40 matches whose x displacement alternates between 6 and 4, so the
/// inlier dispersion is exactly 1 px.
fn jittered() -> (Vec<Keypoint>, Vec<Keypoint>, Vec<Descriptor>) {
    let (ref_kp, desc) = grid(40);
    let cur_kp = moved(&ref_kp, |i| if i % 2 == 0 { (6.0, -3.0) } else { (4.0, -3.0) });
    (ref_kp, cur_kp, desc)
}

#[test]
fn test_dispersion_gate() {
    let (ref_kp, cur_kp, desc) = jittered();

    let est = run(&ref_kp, &desc, &cur_kp, &desc, &params(15, 0.5));
    assert_not_found_shape(&est);

    // Equal to the threshold does not exceed it.
    let est = run(&ref_kp, &desc, &cur_kp, &desc, &params(15, 1.0));
    assert!(est.success);
    assert_eq!(est.inlier_count(), 40);
    let shift = est.shift.unwrap();
    assert_abs_diff_eq!(shift.dx, 5.0, epsilon = 1e-9);
    assert_abs_diff_eq!(shift.dy, -3.0, epsilon = 1e-9);
}

#[test]
fn test_relaxing_threshold_is_monotonic() {
    let (ref_kp, cur_kp, desc) = jittered();
    let mut found_before = false;
    for threshold in [0.25, 0.5, 0.75, 0.99, 1.0, 1.5, 3.0, 10.0] {
        let est = run(&ref_kp, &desc, &cur_kp, &desc, &params(15, threshold));
        if found_before {
            assert!(est.success, "lost at threshold {threshold}");
        }
        found_before |= est.success;
    }
    assert!(found_before);
}

#[test]
fn test_mask_invariants() {
    let (ref_kp, desc) = grid(48);
    let cur_kp = moved(&ref_kp, |i| if i % 5 == 0 { (60.0, 60.0) } else { (1.0, 2.0) });

    for max_display in [0, 5, 30, 100] {
        let p = EstimationParams {
            max_display_matches: max_display,
            ..EstimationParams::default()
        };
        let est = run(&ref_kp, &desc, &cur_kp, &desc, &p);
        assert!(est.success);
        assert_eq!(est.inlier_mask.len(), est.matches.len());
        assert_eq!(est.display_mask.len(), est.matches.len());
        for (&shown, &inlier) in est.display_mask.iter().zip(&est.inlier_mask) {
            assert!(!shown || inlier);
        }
        let shown = est.display_mask.iter().filter(|&&b| b).count();
        assert_eq!(shown, max_display.min(est.inlier_count()));
    }
}

#[test]
fn test_empty_inputs_are_not_found() {
    let (ref_kp, desc) = grid(20);
    let est = run(&ref_kp, &desc, &[], &[], &EstimationParams::default());
    assert_not_found_shape(&est);
    let est = run(&[], &[], &ref_kp, &desc, &EstimationParams::default());
    assert_not_found_shape(&est);
}
