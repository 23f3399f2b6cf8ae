pub use crate::descriptor::{Descriptor, FromVec};
pub use crate::detectors::{
    CornerDetector, DescriptorDetector, Detection, Detector, FeatureDetector,
};
pub use crate::matching::{DescriptorMatch, DescriptorMatcher};
pub use crate::trackers::session::{FrameSource, Propagation, SessionOptions, TrackingSession};
pub use crate::trackers::state_estimation::StateEstimationOptions;
pub use crate::trackers::{
    DescriptorRematchPropagation, OpticalFlowPropagation, PropagationStrategy,
    StateEstimationPropagation, TickOutput, TickPhase, TrackingEngine,
};
pub use crate::utils::frame::Frame;
pub use crate::utils::kalman::kalman_2d_point_bank::{KalmanBank, KalmanBankOptions};
pub use crate::utils::point_2d::{FeaturePoint, FeatureSet};
pub use crate::utils::pyrlk::{PyrLkFlow, PyrLkOptions};
