use ndarray::Array2;

use crate::frame::FrameSize;

use super::config::RoiConfig;

/// Mask of the pixels OUTSIDE a circular region of interest.
///
/// The radius is relative to the frame width, the center to width and height.
pub fn outside_circle_mask(size: FrameSize, roi: &RoiConfig) -> Array2<bool> {
    let w = size.width as f64;
    let h = size.height as f64;
    let cx = roi.center.0 * w;
    let cy = roi.center.1 * h;
    let r2 = (roi.radius * w).powi(2);

    Array2::from_shape_fn((size.height, size.width), |(row, col)| {
        let dx = col as f64 - cx;
        let dy = row as f64 - cy;
        dx * dx + dy * dy > r2
    })
}
