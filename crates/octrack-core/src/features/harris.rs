use ndarray::Array2;

/// Half-width of the block over which structure tensors are accumulated.
pub const HARRIS_BLOCK_RADIUS: usize = 3;

/// Harris corner response at one pixel over a 7x7 block of Sobel gradients.
///
/// The pixel must lie at least `HARRIS_BLOCK_RADIUS + 1` pixels from the border.
pub fn harris_response(image: &Array2<u8>, row: usize, col: usize, k: f32) -> f32 {
    let radius = HARRIS_BLOCK_RADIUS as isize;
    let px = |r: isize, c: isize| image[[r as usize, c as usize]] as f32;

    let mut sxx = 0.0f32;
    let mut syy = 0.0f32;
    let mut sxy = 0.0f32;

    for dr in -radius..=radius {
        for dc in -radius..=radius {
            let r = row as isize + dr;
            let c = col as isize + dc;
            let ix = (px(r - 1, c + 1) + 2.0 * px(r, c + 1) + px(r + 1, c + 1))
                - (px(r - 1, c - 1) + 2.0 * px(r, c - 1) + px(r + 1, c - 1));
            let iy = (px(r + 1, c - 1) + 2.0 * px(r + 1, c) + px(r + 1, c + 1))
                - (px(r - 1, c - 1) + 2.0 * px(r - 1, c) + px(r - 1, c + 1));
            sxx += ix * ix;
            syy += iy * iy;
            sxy += ix * iy;
        }
    }

    let det = sxx * syy - sxy * sxy;
    let trace = sxx + syy;
    det - k * trace * trace
}
