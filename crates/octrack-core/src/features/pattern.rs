//! Sampling pattern of the rotated BRIEF descriptor.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::consts::DESCRIPTOR_BYTES;

/// Number of intensity comparisons per descriptor.
pub const PATTERN_PAIRS: usize = DESCRIPTOR_BYTES * 8;

/// Maximum radius of a sampling point. Rotated points stay inside the
/// 31x31 orientation patch.
pub const PATTERN_RADIUS: i32 = 13;

/// One intensity comparison: offsets (dx, dy) of the two sampled points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointPair {
    pub a: (i32, i32),
    pub b: (i32, i32),
}

/// Generate a reproducible BRIEF pattern.
///
/// Points are drawn uniformly from the disk of radius `PATTERN_RADIUS`; the
/// two points of a pair never coincide. Identical seeds give identical patterns.
pub fn generate_pattern(seed: u64) -> Vec<PointPair> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pairs = Vec::with_capacity(PATTERN_PAIRS);

    while pairs.len() < PATTERN_PAIRS {
        let a = sample_point(&mut rng);
        let b = sample_point(&mut rng);
        if a != b {
            pairs.push(PointPair { a, b });
        }
    }

    pairs
}

fn sample_point<R: Rng + ?Sized>(rng: &mut R) -> (i32, i32) {
    let r2 = PATTERN_RADIUS * PATTERN_RADIUS;
    loop {
        let dx = rng.random_range(-PATTERN_RADIUS..=PATTERN_RADIUS);
        let dy = rng.random_range(-PATTERN_RADIUS..=PATTERN_RADIUS);
        if dx * dx + dy * dy <= r2 {
            return (dx, dy);
        }
    }
}
