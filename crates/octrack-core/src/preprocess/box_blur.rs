use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Pad an array by `pad` pixels on every side, replicating the edge values.
pub fn pad_edge(data: &Array2<f32>, pad: usize) -> Array2<f32> {
    let (h, w) = data.dim();
    if h == 0 || w == 0 {
        return data.clone();
    }
    Array2::from_shape_fn((h + 2 * pad, w + 2 * pad), |(row, col)| {
        let src_row = row.saturating_sub(pad).min(h - 1);
        let src_col = col.saturating_sub(pad).min(w - 1);
        data[[src_row, src_col]]
    })
}

/// Crop `pad` pixels from every side of an array.
pub fn crop_padding(data: &Array2<f32>, pad: usize) -> Array2<f32> {
    let (h, w) = data.dim();
    if h <= 2 * pad || w <= 2 * pad {
        return Array2::zeros((h.saturating_sub(2 * pad), w.saturating_sub(2 * pad)));
    }
    data.slice(ndarray::s![pad..h - pad, pad..w - pad]).to_owned()
}

/// Normalized box filter with a `ksize` x `ksize` window.
///
/// The window for output pixel `x` spans `[x - ksize/2, x - ksize/2 + ksize)`;
/// samples outside the array replicate the nearest edge.
pub fn box_blur_array(data: &Array2<f32>, ksize: usize) -> Array2<f32> {
    let ksize = ksize.max(1);
    if ksize == 1 {
        return data.clone();
    }
    let row_pass = box_rows(data, ksize);
    box_cols(&row_pass, ksize)
}

/// Low-pass estimate of a frame: edge-pad, box blur, crop back to the input bounds.
pub fn low_pass(data: &Array2<f32>, ksize: usize, pad: usize) -> Array2<f32> {
    let padded = pad_edge(data, pad);
    let blurred = box_blur_array(&padded, ksize);
    crop_padding(&blurred, pad)
}

fn box_rows(data: &Array2<f32>, ksize: usize) -> Array2<f32> {
    let (_, w) = data.dim();
    let anchor = (ksize / 2) as isize;
    let norm = 1.0 / ksize as f64;
    map_pixels(data.dim(), |row, col| {
        let mut sum = 0.0f64;
        for k in 0..ksize as isize {
            let src_col = (col as isize + k - anchor).clamp(0, w as isize - 1) as usize;
            sum += data[[row, src_col]] as f64;
        }
        (sum * norm) as f32
    })
}

fn box_cols(data: &Array2<f32>, ksize: usize) -> Array2<f32> {
    let (h, _) = data.dim();
    let anchor = (ksize / 2) as isize;
    let norm = 1.0 / ksize as f64;
    map_pixels(data.dim(), |row, col| {
        let mut sum = 0.0f64;
        for k in 0..ksize as isize {
            let src_row = (row as isize + k - anchor).clamp(0, h as isize - 1) as usize;
            sum += data[[src_row, col]] as f64;
        }
        (sum * norm) as f32
    })
}

/// Evaluate `f(row, col)` for every pixel, splitting rows across threads for large frames.
fn map_pixels<F>((h, w): (usize, usize), f: F) -> Array2<f32>
where
    F: Fn(usize, usize) -> f32 + Sync,
{
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<f32>> = (0..h)
            .into_par_iter()
            .map(|row| (0..w).map(|col| f(row, col)).collect())
            .collect();

        let mut result = Array2::<f32>::zeros((h, w));
        for (row, row_data) in rows.into_iter().enumerate() {
            for (col, val) in row_data.into_iter().enumerate() {
                result[[row, col]] = val;
            }
        }
        result
    } else {
        Array2::from_shape_fn((h, w), |(row, col)| f(row, col))
    }
}
