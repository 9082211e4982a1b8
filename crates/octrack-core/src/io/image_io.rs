use std::path::Path;

use image::{GrayImage, ImageFormat, Rgb, RgbImage};
use ndarray::Array2;

use crate::error::{Result, TrackError};
use crate::frame::{Frame, ProcessedFrame};

/// Radius of the dots marking found positions on a history image.
const HISTORY_DOT_RADIUS: i64 = 2;

/// A found beam position on the reference view, with its quality weight in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistoryMark {
    pub x: usize,
    pub y: usize,
    pub weight: f64,
}

/// Load any supported image file as a grayscale frame on the 8-bit scale.
pub fn load_image(path: &Path) -> Result<Frame> {
    let gray = image::open(path)?.to_luma16();
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return Err(TrackError::InvalidDimensions {
            width: w,
            height: h,
        });
    }

    let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        gray.get_pixel(col as u32, row as u32).0[0] as f32 * (255.0 / 65535.0)
    });
    Ok(Frame::new(data))
}

fn to_gray_image(frame: &ProcessedFrame) -> GrayImage {
    let (h, w) = frame.data.dim();
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        image::Luma([frame.data[[y as usize, x as usize]]])
    })
}

/// Save a processed frame as an 8-bit grayscale PNG.
pub fn save_processed_png(frame: &ProcessedFrame, path: &Path) -> Result<()> {
    to_gray_image(frame).save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save the processed reference frame with every found position drawn as a
/// small filled dot, orange for weak matches shading to yellow for strong ones.
pub fn save_history_png(reference: &ProcessedFrame, marks: &[HistoryMark], path: &Path) -> Result<()> {
    let gray = to_gray_image(reference);
    let mut img = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    });

    let (w, h) = (img.width() as i64, img.height() as i64);
    for mark in marks {
        let color = Rgb([255, (80.0 * mark.weight.clamp(0.0, 1.0)) as u8, 0]);
        let (cx, cy) = (mark.x as i64, mark.y as i64);
        for dy in -HISTORY_DOT_RADIUS..=HISTORY_DOT_RADIUS {
            for dx in -HISTORY_DOT_RADIUS..=HISTORY_DOT_RADIUS {
                if dx * dx + dy * dy > HISTORY_DOT_RADIUS * HISTORY_DOT_RADIUS {
                    continue;
                }
                let (x, y) = (cx + dx, cy + dy);
                if x >= 0 && x < w && y >= 0 && y < h {
                    img.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
