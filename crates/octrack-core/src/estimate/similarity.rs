//! 4-DOF similarity transform (rotation, uniform scale, translation).

use serde::{Deserialize, Serialize};

/// Maps `(x, y)` to `(a·x − b·y + tx, b·x + a·y + ty)`, where
/// `a = s·cos θ` and `b = s·sin θ`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityTransform {
    pub a: f64,
    pub b: f64,
    pub tx: f64,
    pub ty: f64,
}

/// Below this spread of source points (sum of squared distances to the
/// centroid) a fit is considered degenerate.
const MIN_SOURCE_SPREAD: f64 = 1e-12;

impl SimilarityTransform {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn from_parts(scale: f64, angle: f64, tx: f64, ty: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: scale * cos,
            b: scale * sin,
            tx,
            ty,
        }
    }

    pub fn apply(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        [
            self.a * x - self.b * y + self.tx,
            self.b * x + self.a * y + self.ty,
        ]
    }

    pub fn scale(&self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Rotation angle in radians.
    pub fn rotation(&self) -> f64 {
        self.b.atan2(self.a)
    }

    /// Euclidean distance between the mapped source point and the target point.
    pub fn reprojection_error(&self, src: [f64; 2], dst: [f64; 2]) -> f64 {
        let [px, py] = self.apply(src);
        (px - dst[0]).hypot(py - dst[1])
    }

    /// Least-squares fit to two or more point pairs.
    ///
    /// Returns `None` when fewer than two pairs are given or all source
    /// points coincide.
    pub fn fit(pairs: impl Iterator<Item = ([f64; 2], [f64; 2])> + Clone) -> Option<Self> {
        let mut n = 0usize;
        let (mut sx, mut sy, mut dx, mut dy) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for (s, d) in pairs.clone() {
            n += 1;
            sx += s[0];
            sy += s[1];
            dx += d[0];
            dy += d[1];
        }
        if n < 2 {
            return None;
        }
        let nf = n as f64;
        let (sx, sy, dx, dy) = (sx / nf, sy / nf, dx / nf, dy / nf);

        let mut spread = 0.0f64;
        let mut dot = 0.0f64;
        let mut cross = 0.0f64;
        for (s, d) in pairs {
            let (px, py) = (s[0] - sx, s[1] - sy);
            let (qx, qy) = (d[0] - dx, d[1] - dy);
            spread += px * px + py * py;
            dot += px * qx + py * qy;
            cross += px * qy - py * qx;
        }
        if spread < MIN_SOURCE_SPREAD {
            return None;
        }

        let a = dot / spread;
        let b = cross / spread;
        Some(Self {
            a,
            b,
            tx: dx - (a * sx - b * sy),
            ty: dy - (b * sx + a * sy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fit_recovers_known_transform() {
        let known = SimilarityTransform::from_parts(1.2, 0.3, 5.0, -3.0);
        let src = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [7.0, 3.0]];
        let pairs: Vec<_> = src.iter().map(|&p| (p, known.apply(p))).collect();

        let fitted = SimilarityTransform::fit(pairs.iter().copied()).unwrap();
        assert_abs_diff_eq!(fitted.scale(), 1.2, epsilon = 1e-9);
        assert_abs_diff_eq!(fitted.rotation(), 0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(fitted.tx, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fitted.ty, -3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_point_fit_is_exact() {
        let pairs = [([1.0, 1.0], [6.0, -2.0]), ([4.0, 5.0], [9.0, 2.0])];
        let t = SimilarityTransform::fit(pairs.iter().copied()).unwrap();
        for (s, d) in pairs {
            assert!(t.reprojection_error(s, d) < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_fit() {
        let pairs = [([2.0, 2.0], [1.0, 1.0]), ([2.0, 2.0], [5.0, 1.0])];
        assert!(SimilarityTransform::fit(pairs.iter().copied()).is_none());
        assert!(SimilarityTransform::fit(std::iter::empty()).is_none());
    }
}
