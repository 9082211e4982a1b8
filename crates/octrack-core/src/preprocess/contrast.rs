//! Automatic contrast gain from the distribution of row ranges.

use ndarray::{Array2, Axis};

use crate::consts::{MAX_CONTRAST_GAIN, MIN_CONTRAST_GAIN};

/// Peak-to-peak range (max - min) of every row.
pub fn row_peak_to_peak(data: &Array2<f32>) -> Vec<f64> {
    data.axis_iter(Axis(0))
        .map(|row| {
            let (lo, hi) = row
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            if lo.is_finite() && hi.is_finite() {
                (hi - lo) as f64
            } else {
                0.0
            }
        })
        .collect()
}

/// Quantile with linear interpolation between closest ranks.
///
/// Returns 0.0 for an empty slice.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Gain that maps the `q`-quantile of row ranges onto the full 8-bit range,
/// clamped to [1, 30].
///
/// The `1 +` in the denominator keeps flat frames finite.
pub fn contrast_gain(residual: &Array2<f32>, q: f64) -> f32 {
    let ranges = row_peak_to_peak(residual);
    let spread = quantile(&ranges, q);
    let gain = 255.0 / (1.0 + spread);
    (gain as f32).clamp(MIN_CONTRAST_GAIN, MAX_CONTRAST_GAIN)
}
