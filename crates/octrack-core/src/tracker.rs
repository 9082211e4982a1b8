use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::config::TrackingConfig;
use crate::error::Result;
use crate::estimate::{estimate_motion, EstimationParams, MotionEstimate};
use crate::features::{Descriptor, FeatureDetector, Features, Keypoint, OrbDetector};
use crate::frame::{Frame, ProcessedFrame};
use crate::preprocess::Preprocessor;

/// Features of the reference view, frozen for the lifetime of a tracker.
#[derive(Clone, Debug)]
pub struct ReferenceState {
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl ReferenceState {
    fn from_features(features: Features) -> Self {
        Self {
            keypoints: features.keypoints,
            descriptors: features.descriptors,
        }
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Output of tracking one frame.
#[derive(Clone, Debug)]
pub struct TrackResult {
    pub estimate: MotionEstimate,
    /// The normalized frame the estimate was computed on.
    pub processed: ProcessedFrame,
}

/// Tracks frames against one fixed reference frame.
///
/// Read-only after construction; `track` may be called from several threads.
pub struct Tracker {
    preprocessor: Preprocessor,
    detector: Box<dyn FeatureDetector>,
    reference: ReferenceState,
    reference_processed: ProcessedFrame,
    params: EstimationParams,
}

impl Tracker {
    /// Build a tracker with the default ORB detector.
    pub fn new(config: &TrackingConfig, reference: &Frame) -> Result<Self> {
        config.validate()?;
        let detector = OrbDetector::new(&config.features);
        Self::with_detector(config, reference, Box::new(detector))
    }

    /// Build a tracker with a custom feature detector.
    pub fn with_detector(
        config: &TrackingConfig,
        reference: &Frame,
        detector: Box<dyn FeatureDetector>,
    ) -> Result<Self> {
        config.validate()?;
        let preprocessor = Preprocessor::new(&config.preprocess, reference.size())?;
        let reference_processed = preprocessor.process(reference)?;
        let features = detector.detect(&reference_processed);

        info!(
            detector = detector.name(),
            keypoints = features.len(),
            frame = reference.metadata.frame_index,
            size = %reference.size(),
            "Reference captured"
        );

        Ok(Self {
            preprocessor,
            detector,
            reference: ReferenceState::from_features(features),
            reference_processed,
            params: config.estimation.clone(),
        })
    }

    pub fn reference(&self) -> &ReferenceState {
        &self.reference
    }

    /// The normalized reference frame.
    pub fn reference_processed(&self) -> &ProcessedFrame {
        &self.reference_processed
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn params(&self) -> &EstimationParams {
        &self.params
    }

    /// Preprocess, detect and estimate the motion of one frame.
    ///
    /// Fails only for frames of the wrong size; "no motion found" is an
    /// unsuccessful estimate, not an error.
    pub fn track(&self, frame: &Frame) -> Result<TrackResult> {
        let processed = self.preprocessor.process(frame)?;
        let current = self.detector.detect(&processed);

        let mut rng = self.frame_rng(frame.metadata.frame_index);
        let estimate = estimate_motion(
            &self.reference.keypoints,
            &self.reference.descriptors,
            &current.keypoints,
            &current.descriptors,
            &self.params,
            &mut rng,
        );

        Ok(TrackResult {
            estimate,
            processed,
        })
    }

    /// Seeded sessions derive one stream per frame so results do not depend
    /// on the order frames are processed in.
    fn frame_rng(&self, frame_index: usize) -> StdRng {
        match self.params.ransac.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ frame_index as u64),
            None => StdRng::from_os_rng(),
        }
    }
}
