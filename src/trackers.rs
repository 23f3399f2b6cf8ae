use crate::detectors::Detection;
use crate::matching::DescriptorMatch;
use crate::utils::frame::Frame;
use crate::utils::point_2d::FeatureSet;
use anyhow::Result;

/// Optical-flow propagation
pub mod flow;

/// Descriptor re-matching propagation
pub mod rematch;

/// Kalman-bank state estimation propagation
pub mod state_estimation;

/// Per-tick detection/propagation state machine
pub mod engine;

/// Session composition: frame source, engine, cancellation
pub mod session;

/// Everything a strategy may need to advance one tick.
pub struct PropagationContext<'a> {
    /// Engine tick counter at the moment of the call.
    pub tick: usize,
    pub prev_frame: &'a Frame,
    pub frame: &'a Frame,
    pub prev_points: &'a FeatureSet,
}

/// Result of one propagation tick.
#[derive(Clone, Debug)]
pub struct Propagated {
    /// The current feature set.
    pub points: FeatureSet,
    /// Independently tracked measurements, when the strategy produces them.
    /// When present, these (not `points`) are carried into the next tick as
    /// the propagation input.
    pub ground_truth: Option<FeatureSet>,
    /// Match metadata, when the strategy matches descriptors.
    pub matches: Option<Vec<DescriptorMatch>>,
}

impl Propagated {
    pub fn points(points: FeatureSet) -> Self {
        Self {
            points,
            ground_truth: None,
            matches: None,
        }
    }
}

/// Advances a feature set by one tick between two detection ticks.
///
/// `begin_cycle` is invoked on every detection tick and must discard whatever
/// internal state the strategy accumulated: slot identities restart there.
pub trait PropagationStrategy {
    fn begin_cycle(&mut self, frame: &Frame, detection: &Detection) -> Result<()>;

    fn propagate(&mut self, ctx: &PropagationContext<'_>) -> Result<Propagated>;
}

pub use engine::{TickOutput, TickPhase, TrackingEngine};
pub use flow::OpticalFlowPropagation;
pub use rematch::DescriptorRematchPropagation;
pub use session::{FrameSource, Propagation, SessionOptions, TrackingSession};
pub use state_estimation::StateEstimationPropagation;
