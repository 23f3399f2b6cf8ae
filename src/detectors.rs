use crate::descriptor::Descriptor;
use crate::utils::frame::Frame;
use crate::utils::point_2d::FeatureSet;
use anyhow::Result;

/// Corner-based feature detection
pub mod corner;

/// Keypoint + descriptor based feature detection
pub mod descriptor;

pub use corner::CornerDetector;
pub use descriptor::DescriptorDetector;

/// Output of one detection tick. Descriptors are present only when the
/// detector variant produces them; when present they correspond 1:1 with the
/// points.
#[derive(Clone, Debug)]
pub struct Detection {
    pub points: FeatureSet,
    pub descriptors: Option<Vec<Descriptor>>,
}

/// Converts a frame into a feature set.
///
/// Yielding fewer points than configured (or none at all) is a soft outcome,
/// not an error: the caller receives the smaller set and decides what to do
/// with it.
pub trait FeatureDetector {
    fn detect(&self, frame: &Frame) -> Result<FeatureSet>;

    fn detect_with_descriptors(&self, frame: &Frame) -> Result<Detection> {
        Ok(Detection {
            points: self.detect(frame)?,
            descriptors: None,
        })
    }
}

/// Closed set of detector variants, selected by configuration.
#[derive(Clone, Debug)]
pub enum Detector {
    Corner(CornerDetector),
    Descriptor(DescriptorDetector),
}

impl FeatureDetector for Detector {
    fn detect(&self, frame: &Frame) -> Result<FeatureSet> {
        match self {
            Detector::Corner(d) => d.detect(frame),
            Detector::Descriptor(d) => d.detect(frame),
        }
    }

    fn detect_with_descriptors(&self, frame: &Frame) -> Result<Detection> {
        match self {
            Detector::Corner(d) => d.detect_with_descriptors(frame),
            Detector::Descriptor(d) => d.detect_with_descriptors(frame),
        }
    }
}
