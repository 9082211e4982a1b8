use serde::{Deserialize, Serialize};

use super::Descriptor;

/// Correspondence between a reference and a current-frame descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Index into the reference keypoints.
    pub reference_idx: usize,
    /// Index into the current-frame keypoints.
    pub current_idx: usize,
    /// Hamming distance between the two descriptors.
    pub distance: u32,
}

/// Hamming distance between two binary descriptors.
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x ^ y).count_ones())
        .sum()
}

/// Brute-force mutual nearest-neighbour matching under Hamming distance.
///
/// A pair `(i, j)` is kept only if `b[j]` is the nearest neighbour of `a[i]`
/// and `a[i]` is the nearest neighbour of `b[j]`, so every descriptor takes
/// part in at most one match. Ties go to the lower index. Output is ordered
/// by reference index. Either side empty gives no matches.
pub fn match_descriptors(reference: &[Descriptor], current: &[Descriptor]) -> Vec<Match> {
    let m = reference.len();
    let n = current.len();
    if m == 0 || n == 0 {
        return Vec::new();
    }

    let mut fwd_best = vec![(0usize, u32::MAX); m];
    let mut rev_best = vec![(0usize, u32::MAX); n];

    for (i, d1) in reference.iter().enumerate() {
        for (j, d2) in current.iter().enumerate() {
            let dist = hamming_distance(d1, d2);
            if dist < fwd_best[i].1 {
                fwd_best[i] = (j, dist);
            }
            if dist < rev_best[j].1 {
                rev_best[j] = (i, dist);
            }
        }
    }

    fwd_best
        .iter()
        .enumerate()
        .filter(|&(i, &(j, _))| rev_best[j].0 == i)
        .map(|(i, &(j, distance))| Match {
            reference_idx: i,
            current_idx: j,
            distance,
        })
        .collect()
}
