//! Offline tracking of a whole frame sequence against one reference frame.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::TrackingConfig;
use crate::consts::PARALLEL_FRAME_THRESHOLD;
use crate::error::{Result, TrackError};
use crate::frame::FrameSize;
use crate::io::image_io::HistoryMark;
use crate::io::source::FrameSource;
use crate::tracker::Tracker;

/// Session stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStage {
    Reference,
    Tracking,
    Writing,
}

impl std::fmt::Display for SessionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference => write!(f, "Capturing reference"),
            Self::Tracking => write!(f, "Tracking frames"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Thread-safe progress reporting for a session.
///
/// All methods default to no-ops.
pub trait ProgressReporter: Send + Sync {
    /// A stage has started. `total_items` is its work item count, if known.
    fn begin_stage(&self, _stage: SessionStage, _total_items: Option<usize>) {}

    /// `items_done` work items of the current stage have completed.
    fn advance(&self, _items_done: usize) {}

    fn finish_stage(&self) {}
}

pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Per-frame outcome, flattened for reporting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub index: usize,
    pub timestamp_seconds: Option<f64>,
    pub success: bool,
    pub dx: Option<f64>,
    pub dy: Option<f64>,
    /// Cross-checked descriptor matches (0 when rejected).
    pub matches: usize,
    pub inliers: usize,
    /// Quality weight in [0.5, 1] for found frames, 0 otherwise.
    pub quality: f64,
    /// Frame centre of this view in reference coordinates, when inside the frame.
    pub beam: Option<[usize; 2]>,
}

/// Results of a session, in frame order.
#[derive(Clone, Debug, Serialize)]
pub struct SessionReport {
    pub reference_index: usize,
    pub frame_size: FrameSize,
    pub frames: Vec<FrameReport>,
}

/// Aggregate counts of a session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SessionSummary {
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
    /// Mean shift over found frames.
    pub mean_dx: Option<f64>,
    pub mean_dy: Option<f64>,
    pub mean_inliers: Option<f64>,
}

impl SessionReport {
    pub fn summary(&self) -> SessionSummary {
        let found: Vec<&FrameReport> = self.frames.iter().filter(|f| f.success).collect();
        let n = found.len();
        let mean = |values: Vec<f64>| (n > 0).then(|| values.iter().sum::<f64>() / n as f64);

        SessionSummary {
            total: self.frames.len(),
            found: n,
            not_found: self.frames.len() - n,
            mean_dx: mean(found.iter().filter_map(|f| f.dx).collect()),
            mean_dy: mean(found.iter().filter_map(|f| f.dy).collect()),
            mean_inliers: mean(found.iter().map(|f| f.inliers as f64).collect()),
        }
    }

    /// Found beam positions for drawing onto the reference view.
    pub fn history_marks(&self) -> Vec<HistoryMark> {
        self.frames
            .iter()
            .filter_map(|f| {
                f.beam.map(|[x, y]| HistoryMark {
                    x,
                    y,
                    weight: f.quality,
                })
            })
            .collect()
    }
}

/// Track every frame of `source` against the frame at `reference_index`.
pub fn run_session(
    source: &dyn FrameSource,
    reference_index: usize,
    config: &TrackingConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<SessionReport> {
    let tracker = build_tracker(source, reference_index, config, reporter.as_ref())?;
    track_all(source, &tracker, reference_index, reporter)
}

/// Read the reference frame and build a tracker from it.
pub fn build_tracker(
    source: &dyn FrameSource,
    reference_index: usize,
    config: &TrackingConfig,
    reporter: &dyn ProgressReporter,
) -> Result<Tracker> {
    if source.frame_count() == 0 {
        return Err(TrackError::EmptySequence);
    }
    reporter.begin_stage(SessionStage::Reference, None);
    let reference = source.read_frame(reference_index)?;
    let tracker = Tracker::new(config, &reference)?;
    reporter.finish_stage();
    Ok(tracker)
}

/// Track every frame of `source` with an existing tracker.
///
/// Frames are processed in parallel for longer sequences; the report keeps
/// frame order either way.
pub fn track_all(
    source: &dyn FrameSource,
    tracker: &Tracker,
    reference_index: usize,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<SessionReport> {
    let total = source.frame_count();
    if total == 0 {
        return Err(TrackError::EmptySequence);
    }
    let size = tracker.preprocessor().size();
    let min_matches = tracker.params().min_matches;

    reporter.begin_stage(SessionStage::Tracking, Some(total));
    let counter = AtomicUsize::new(0);

    let track_one = |index: usize| -> Result<FrameReport> {
        let frame = source.read_frame(index)?;
        let result = tracker.track(&frame)?;
        let est = &result.estimate;
        let shift = est.shift;
        let report = FrameReport {
            index,
            timestamp_seconds: source.timestamp_seconds(index),
            success: est.success,
            dx: shift.map(|s| s.dx),
            dy: shift.map(|s| s.dy),
            matches: est.matches.len(),
            inliers: est.inlier_count(),
            quality: est.quality_weight(min_matches),
            beam: est.beam_in_reference(size).map(|(x, y)| [x, y]),
        };
        debug!(
            frame = index,
            success = report.success,
            inliers = report.inliers,
            "Frame tracked"
        );
        let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
        reporter.advance(done);
        Ok(report)
    };

    let results: Vec<Result<FrameReport>> = if total >= PARALLEL_FRAME_THRESHOLD {
        (0..total).into_par_iter().map(track_one).collect()
    } else {
        (0..total).map(track_one).collect()
    };
    reporter.finish_stage();

    let frames = results.into_iter().collect::<Result<Vec<_>>>()?;
    let report = SessionReport {
        reference_index,
        frame_size: size,
        frames,
    };

    let summary = report.summary();
    info!(
        total = summary.total,
        found = summary.found,
        reference = reference_index,
        "Session complete"
    );
    Ok(report)
}
