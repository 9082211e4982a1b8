use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::DEFAULT_FRAME_RATE;
use crate::error::{Result, TrackError};
use crate::frame::{Frame, FrameSize};

use super::image_io::load_image;
use super::resize::{resize_to_width, scaled_size};
use super::ser::SerReader;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Random-access sequence of equally sized grayscale frames.
pub trait FrameSource: Send + Sync {
    fn frame_count(&self) -> usize;

    /// Size of the frames returned by `read_frame`.
    fn frame_size(&self) -> FrameSize;

    fn read_frame(&self, index: usize) -> Result<Frame>;

    /// Capture time relative to the first frame, when the source records one.
    fn timestamp_seconds(&self, index: usize) -> Option<f64>;

    /// Nominal frame rate used when no timestamps exist.
    fn frame_rate(&self) -> f64 {
        DEFAULT_FRAME_RATE
    }

    /// Index of the frame captured closest to `seconds` after the start.
    ///
    /// Uses recorded timestamps when available (ties go to the earlier
    /// frame), otherwise `round(seconds · frame_rate)`.
    fn frame_at_time(&self, seconds: f64) -> Result<usize> {
        let total = self.frame_count();
        if total == 0 {
            return Err(TrackError::EmptySequence);
        }
        if !(seconds >= 0.0 && seconds.is_finite()) {
            return Err(TrackError::invalid_config(
                "reference_time",
                format!("must be a non-negative number of seconds, got {seconds}"),
            ));
        }

        if self.timestamp_seconds(0).is_some() {
            let mut best = (0usize, f64::INFINITY);
            for index in 0..total {
                if let Some(t) = self.timestamp_seconds(index) {
                    let diff = (t - seconds).abs();
                    if diff < best.1 {
                        best = (index, diff);
                    }
                }
            }
            return Ok(best.0);
        }

        let index = (seconds * self.frame_rate()).round() as usize;
        if index >= total {
            return Err(TrackError::FrameIndexOutOfRange { index, total });
        }
        Ok(index)
    }
}

/// Frames from a SER video, optionally rescaled to a fixed width.
pub struct SerSource {
    reader: SerReader,
    target_width: Option<usize>,
}

impl SerSource {
    pub fn open(path: &Path, target_width: Option<usize>) -> Result<Self> {
        let reader = SerReader::open(path)?;
        debug!(
            path = %path.display(),
            frames = reader.frame_count(),
            timestamps = reader.has_timestamps(),
            "Opened SER source"
        );
        Ok(Self {
            reader,
            target_width,
        })
    }

    pub fn reader(&self) -> &SerReader {
        &self.reader
    }
}

impl FrameSource for SerSource {
    fn frame_count(&self) -> usize {
        self.reader.frame_count()
    }

    fn frame_size(&self) -> FrameSize {
        let native = FrameSize::new(
            self.reader.header.width as usize,
            self.reader.header.height as usize,
        );
        match self.target_width {
            Some(w) => scaled_size(native, w),
            None => native,
        }
    }

    fn read_frame(&self, index: usize) -> Result<Frame> {
        let frame = self.reader.read_frame(index)?;
        match self.target_width {
            Some(w) => resize_to_width(&frame, w),
            None => Ok(frame),
        }
    }

    fn timestamp_seconds(&self, index: usize) -> Option<f64> {
        let start = self.reader.timestamp_us(0)?;
        let t = self.reader.timestamp_us(index)?;
        Some(t.saturating_sub(start) as f64 / 1e6)
    }
}

/// Frames from a directory of image files, in file-name order.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    native_size: FrameSize,
    target_width: Option<usize>,
    frame_rate: f64,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, target_width: Option<usize>) -> Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_image_file(p))
            .collect();
        paths.sort();

        let first = paths.first().ok_or(TrackError::EmptySequence)?;
        let native_size = load_image(first)?.size();
        debug!(
            dir = %dir.display(),
            frames = paths.len(),
            size = %native_size,
            "Opened image sequence"
        );

        Ok(Self {
            paths,
            native_size,
            target_width,
            frame_rate: DEFAULT_FRAME_RATE,
        })
    }

    /// Override the nominal frame rate used for time-based lookups.
    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.frame_rate = fps;
        self
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for ImageSequenceSource {
    fn frame_count(&self) -> usize {
        self.paths.len()
    }

    fn frame_size(&self) -> FrameSize {
        match self.target_width {
            Some(w) => scaled_size(self.native_size, w),
            None => self.native_size,
        }
    }

    fn read_frame(&self, index: usize) -> Result<Frame> {
        let path = self
            .paths
            .get(index)
            .ok_or(TrackError::FrameIndexOutOfRange {
                index,
                total: self.paths.len(),
            })?;
        let mut frame = load_image(path)?;
        if frame.size() != self.native_size {
            return Err(TrackError::FrameSizeMismatch {
                width: self.native_size.width,
                height: self.native_size.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }
        frame.metadata.frame_index = index;
        match self.target_width {
            Some(w) => resize_to_width(&frame, w),
            None => Ok(frame),
        }
    }

    fn timestamp_seconds(&self, _index: usize) -> Option<f64> {
        None
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Open a SER file or a directory of images as a frame source.
pub fn open_source(path: &Path, target_width: Option<usize>) -> Result<Box<dyn FrameSource>> {
    if path.is_dir() {
        Ok(Box::new(ImageSequenceSource::open(path, target_width)?))
    } else {
        Ok(Box::new(SerSource::open(path, target_width)?))
    }
}
