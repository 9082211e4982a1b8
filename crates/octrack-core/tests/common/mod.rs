#![allow(dead_code)]

use std::io::Write;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use octrack_core::config::TrackingConfig;
use octrack_core::frame::{Frame, FrameMetadata};
use octrack_core::io::ser::SER_HEADER_SIZE;

/// Build a SER file header with configurable bit depth and color mode.
///
/// `color_id`: 0=MONO, 8=BAYER_RGGB, 9=BAYER_GRBG, 10=BAYER_GBRG, 11=BAYER_BGGR,
///             100=RGB, 101=BGR
pub fn build_ser_header(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0, read as little-endian
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Operator, camera and optics text fields; optics left blank.
    let texts: [&[u8]; 3] = [b"Test", b"OCT cam", b""];
    for text in texts {
        let mut field = [0u8; 40];
        field[..text.len()].copy_from_slice(text);
        buf.extend_from_slice(&field);
    }
    // DateTime, DateTimeUTC
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Complete mono 8-bit SER file from raw frame bytes, with an optional
/// timestamp trailer in 100 ns ticks.
pub fn build_ser(width: u32, height: u32, frames: &[Vec<u8>], timestamps: Option<&[u64]>) -> Vec<u8> {
    let mut buf = build_ser_header(width, height, 8, frames.len(), 0);
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    if let Some(ts) = timestamps {
        for t in ts {
            buf.extend_from_slice(&t.to_le_bytes());
        }
    }
    buf
}

/// Mono 8-bit SER file from frames on the 8-bit scale.
pub fn build_ser_from_frames(frames: &[Frame]) -> Vec<u8> {
    let (h, w) = frames[0].data.dim();
    let raw: Vec<Vec<u8>> = frames.iter().map(|f| to_bytes(&f.data)).collect();
    build_ser(w as u32, h as u32, &raw, None)
}

pub fn to_bytes(data: &Array2<f32>) -> Vec<u8> {
    data.iter().map(|&v| v.round().clamp(0.0, 255.0) as u8).collect()
}

/// Write bytes to a temporary file that lives as long as the handle.
pub fn write_temp(data: &[u8]) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("create temp file");
    f.write_all(data).expect("write data");
    f.flush().expect("flush");
    f
}

/// Canvas of overlapping random rectangles: plenty of distinct corners,
/// no value above 220 so nothing is treated as a reflection.
pub fn textured_canvas(height: usize, width: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut canvas = Array2::from_elem((height, width), 110.0f32);
    let count = height * width / 250;
    for _ in 0..count {
        let rh = rng.random_range(5..24usize);
        let rw = rng.random_range(5..24usize);
        let r0 = rng.random_range(0..height - rh);
        let c0 = rng.random_range(0..width - rw);
        let value = rng.random_range(20..=220u32) as f32;
        canvas
            .slice_mut(ndarray::s![r0..r0 + rh, c0..c0 + rw])
            .fill(value);
    }
    canvas
}

/// Crop a `height` x `width` window whose top-left corner is at (x0, y0).
pub fn window(canvas: &Array2<f32>, x0: usize, y0: usize, height: usize, width: usize) -> Array2<f32> {
    canvas
        .slice(ndarray::s![y0..y0 + height, x0..x0 + width])
        .to_owned()
}

/// Reference frame at (x0, y0) and a current frame whose content moved by
/// the integer shift (dx, dy).
pub fn shifted_pair(
    canvas: &Array2<f32>,
    (x0, y0): (usize, usize),
    (dx, dy): (isize, isize),
    height: usize,
    width: usize,
) -> (Frame, Frame) {
    let reference = window(canvas, x0, y0, height, width);
    let cx = (x0 as isize - dx) as usize;
    let cy = (y0 as isize - dy) as usize;
    let current = window(canvas, cx, cy, height, width);
    (
        Frame::new(reference),
        Frame::with_metadata(
            current,
            FrameMetadata {
                frame_index: 1,
                timestamp_us: None,
            },
        ),
    )
}

/// Default configuration without the circular mask and with a fixed RANSAC seed.
pub fn test_config() -> TrackingConfig {
    let mut config = TrackingConfig::default();
    config.preprocess.roi = None;
    config.estimation.ransac.seed = Some(1234);
    config
}
