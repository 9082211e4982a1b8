use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, TrackError};
use crate::frame::{Frame, FrameSize};

/// Size of a frame rescaled to `width`, keeping the aspect ratio.
pub fn scaled_size(size: FrameSize, width: usize) -> FrameSize {
    let height = (width as f64 * size.height as f64 / size.width as f64).round() as usize;
    FrameSize::new(width, height.max(1))
}

/// Rescale a frame to `width` by pixel-area averaging.
///
/// Every output pixel is the overlap-weighted mean of the source pixels its
/// footprint covers. Returns the input unchanged when the width already matches.
pub fn resize_to_width(frame: &Frame, width: usize) -> Result<Frame> {
    if width == 0 || frame.width() == 0 || frame.height() == 0 {
        return Err(TrackError::InvalidDimensions {
            width: width as u32,
            height: frame.height() as u32,
        });
    }
    if width == frame.width() {
        return Ok(frame.clone());
    }

    let target = scaled_size(frame.size(), width);
    let cols = area_weights(frame.width(), target.width);
    let rows = area_weights(frame.height(), target.height);

    let src = &frame.data;
    let horizontal = resample(target.width, frame.height(), |row, x| {
        cols[x].iter().map(|&(c, wt)| src[[row, c]] * wt).sum()
    });
    let data = resample(target.width, target.height, |y, x| {
        rows[y].iter().map(|&(r, wt)| horizontal[[r, x]] * wt).sum()
    });

    Ok(Frame::with_metadata(data, frame.metadata.clone()))
}

/// For each output index, the source indices it overlaps and their
/// normalized weights.
fn area_weights(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|i| {
            let start = i as f64 * scale;
            let end = start + scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len);
            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                    (overlap > 1e-9).then(|| (s, (overlap / scale) as f32))
                })
                .collect()
        })
        .collect()
}

fn resample<F>(width: usize, height: usize, f: F) -> Array2<f32>
where
    F: Fn(usize, usize) -> f32 + Sync,
{
    let mut out = Array2::<f32>::zeros((height, width));
    if width * height >= PARALLEL_PIXEL_THRESHOLD {
        out.axis_iter_mut(ndarray::Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut line)| {
                for (col, px) in line.iter_mut().enumerate() {
                    *px = f(row, col);
                }
            });
    } else {
        for ((row, col), px) in out.indexed_iter_mut() {
            *px = f(row, col);
        }
    }
    out
}
