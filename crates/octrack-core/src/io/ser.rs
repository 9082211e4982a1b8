use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, TrackError};
use crate::frame::{ColorMode, Frame, FrameMetadata, SourceInfo};

pub const SER_HEADER_SIZE: usize = 178;
const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// SER timestamps count 100 ns ticks.
const TICKS_PER_MICROSECOND: u64 = 10;

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
    pub date_time: u64,
    pub date_time_utc: u64,
}

impl SerHeader {
    /// Bytes per sample (1 up to 8 bits, 2 above).
    pub fn bytes_per_sample(&self) -> usize {
        if self.pixel_depth <= 8 {
            1
        } else {
            2
        }
    }

    /// 3 for RGB/BGR, 1 for mono and Bayer.
    pub fn planes_per_pixel(&self) -> usize {
        match self.color_id {
            100 | 101 => 3,
            _ => 1,
        }
    }

    pub fn frame_byte_size(&self) -> usize {
        self.width as usize * self.height as usize * self.bytes_per_sample() * self.planes_per_pixel()
    }

    pub fn color_mode(&self) -> ColorMode {
        match self.color_id {
            8 => ColorMode::BayerRGGB,
            9 => ColorMode::BayerGRBG,
            10 => ColorMode::BayerGBRG,
            11 => ColorMode::BayerBGGR,
            100 => ColorMode::RGB,
            101 => ColorMode::BGR,
            _ => ColorMode::Mono,
        }
    }
}

/// Memory-mapped SER video reader producing single-channel frames on the
/// 8-bit intensity scale.
///
/// Mono data is read as is. RGB/BGR frames use the green plane and Bayer
/// mosaics are reduced to a bilinearly interpolated green channel, so every
/// color layout yields the same kind of intensity image.
pub struct SerReader {
    mmap: Mmap,
    pub header: SerHeader,
}

impl SerReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and the file is not modified while mapped.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(TrackError::InvalidSer("File too small for SER header".into()));
        }
        if &mmap[0..14] != SER_MAGIC {
            return Err(TrackError::InvalidSer("Missing LUCAM-RECORDER magic".into()));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;

        let expected = header
            .frame_byte_size()
            .checked_mul(header.frame_count as usize)
            .and_then(|n| n.checked_add(SER_HEADER_SIZE))
            .ok_or_else(|| TrackError::InvalidSer("Frame data size overflows".into()))?;
        if mmap.len() < expected {
            return Err(TrackError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected,
                mmap.len()
            )));
        }

        Ok(Self { mmap, header })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Raw bytes of one frame, borrowed from the mapping.
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let total = self.frame_count();
        if index >= total {
            return Err(TrackError::FrameIndexOutOfRange { index, total });
        }
        let size = self.header.frame_byte_size();
        let offset = SER_HEADER_SIZE + index * size;
        Ok(&self.mmap[offset..offset + size])
    }

    pub fn read_frame(&self, index: usize) -> Result<Frame> {
        let raw = self.frame_raw(index)?;
        let data = match bayer_green_parity(&self.header.color_mode()) {
            Some(parity) => bayer_green(&decode_plane(raw, &self.header, 0), parity),
            None if self.header.planes_per_pixel() == 3 => decode_plane(raw, &self.header, 1),
            None => decode_plane(raw, &self.header, 0),
        };

        Ok(Frame::with_metadata(
            data,
            FrameMetadata {
                frame_index: index,
                timestamp_us: self.timestamp_us(index),
            },
        ))
    }

    /// Absolute capture time of a frame in microseconds, from the optional
    /// timestamp trailer.
    pub fn timestamp_us(&self, index: usize) -> Option<u64> {
        if index >= self.frame_count() {
            return None;
        }
        let trailer = SER_HEADER_SIZE + self.header.frame_byte_size() * self.frame_count();
        let offset = trailer + index * 8;
        let bytes = self.mmap.get(offset..offset + 8)?;
        let ticks = u64::from_le_bytes(bytes.try_into().ok()?);
        (ticks > 0).then_some(ticks / TICKS_PER_MICROSECOND)
    }

    pub fn has_timestamps(&self) -> bool {
        self.frame_count() > 0 && self.timestamp_us(self.frame_count() - 1).is_some()
    }

    pub fn source_info(&self, path: &Path) -> SourceInfo {
        SourceInfo {
            filename: path.to_path_buf(),
            total_frames: self.frame_count(),
            width: self.header.width,
            height: self.header.height,
            bit_depth: self.header.pixel_depth as u8,
            color_mode: self.header.color_mode(),
            operator: non_empty(&self.header.observer),
            camera: non_empty(&self.header.instrument),
            optics: non_empty(&self.header.telescope),
        }
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]);

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?;
    let height = cursor.read_i32::<LittleEndian>()?;
    let pixel_depth = cursor.read_i32::<LittleEndian>()?;
    let frame_count = cursor.read_i32::<LittleEndian>()?;

    let observer = read_fixed_string(&buf[42..82]);
    let instrument = read_fixed_string(&buf[82..122]);
    let telescope = read_fixed_string(&buf[122..162]);

    let mut cursor = std::io::Cursor::new(&buf[162..]);
    let date_time = cursor.read_u64::<LittleEndian>()?;
    let date_time_utc = cursor.read_u64::<LittleEndian>()?;

    if width <= 0 || height <= 0 {
        return Err(TrackError::InvalidDimensions {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        });
    }
    if !(1..=16).contains(&pixel_depth) {
        return Err(TrackError::InvalidSer(format!(
            "Unsupported pixel depth {pixel_depth}"
        )));
    }
    if frame_count < 0 {
        return Err(TrackError::InvalidSer(format!(
            "Negative frame count {frame_count}"
        )));
    }

    // Many writers store 0 for little-endian data despite the format
    // definition; only an explicit 1 is honoured as big-endian.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width: width as u32,
        height: height as u32,
        pixel_depth: pixel_depth as u32,
        frame_count: frame_count as u32,
        observer,
        instrument,
        telescope,
        date_time,
        date_time_utc,
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Decode one sample plane and rescale it from the file's bit depth to [0, 255].
fn decode_plane(raw: &[u8], header: &SerHeader, plane: usize) -> Array2<f32> {
    let h = header.height as usize;
    let w = header.width as usize;
    let bps = header.bytes_per_sample();
    let stride = header.planes_per_pixel() * bps;
    let scale = 255.0 / ((1u32 << header.pixel_depth) - 1) as f32;
    let little_endian = header.little_endian;

    let sample = |idx: usize| -> f32 {
        let off = idx * stride + plane * bps;
        let v = if bps == 1 {
            raw[off] as f32
        } else if little_endian {
            u16::from_le_bytes([raw[off], raw[off + 1]]) as f32
        } else {
            u16::from_be_bytes([raw[off], raw[off + 1]]) as f32
        };
        v * scale
    };

    let mut data = Array2::<f32>::zeros((h, w));
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        data.axis_iter_mut(ndarray::Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut line)| {
                for (col, px) in line.iter_mut().enumerate() {
                    *px = sample(row * w + col);
                }
            });
    } else {
        for ((row, col), px) in data.indexed_iter_mut() {
            *px = sample(row * w + col);
        }
    }
    data
}

/// Parity of `row + col` at which green samples sit in a Bayer mosaic.
fn bayer_green_parity(mode: &ColorMode) -> Option<usize> {
    match mode {
        ColorMode::BayerRGGB | ColorMode::BayerBGGR => Some(1),
        ColorMode::BayerGRBG | ColorMode::BayerGBRG => Some(0),
        _ => None,
    }
}

/// Green channel of a Bayer mosaic. Red and blue sites take the mean of
/// their in-bounds cardinal neighbours, which are all green.
fn bayer_green(raw: &Array2<f32>, green_parity: usize) -> Array2<f32> {
    let (h, w) = raw.dim();
    let green_at = |row: usize, col: usize| -> f32 {
        if (row + col) % 2 == green_parity {
            return raw[[row, col]];
        }
        let mut sum = 0.0f32;
        let mut n = 0u32;
        let neighbours = [
            (row.checked_sub(1), Some(col)),
            ((row + 1 < h).then_some(row + 1), Some(col)),
            (Some(row), col.checked_sub(1)),
            (Some(row), (col + 1 < w).then_some(col + 1)),
        ];
        for (r, c) in neighbours {
            if let (Some(r), Some(c)) = (r, c) {
                sum += raw[[r, c]];
                n += 1;
            }
        }
        if n == 0 {
            raw[[row, col]]
        } else {
            sum / n as f32
        }
    };

    let mut green = Array2::<f32>::zeros((h, w));
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        green
            .axis_iter_mut(ndarray::Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut line)| {
                for (col, px) in line.iter_mut().enumerate() {
                    *px = green_at(row, col);
                }
            });
    } else {
        for ((row, col), px) in green.indexed_iter_mut() {
            *px = green_at(row, col);
        }
    }
    green
}
