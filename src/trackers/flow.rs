use crate::detectors::Detection;
use crate::trackers::{Propagated, PropagationContext, PropagationStrategy};
use crate::utils::frame::Frame;
use crate::utils::pyrlk::{PyrLkFlow, PyrLkOptions};
use anyhow::Result;
use log::debug;

/// Propagates every point by pyramidal Lucas-Kanade flow between the previous
/// and the current frame.
///
/// Output cardinality always equals input cardinality, keeping the slot
/// correspondence intact. Per-point convergence statuses from the flow
/// primitive are counted for the log and otherwise not acted upon: a point
/// whose local match failed keeps the predicted position and may drift until
/// the next detection tick.
#[derive(Clone, Debug, Default)]
pub struct OpticalFlowPropagation {
    flow: PyrLkFlow,
}

impl OpticalFlowPropagation {
    pub fn new(opts: PyrLkOptions) -> Self {
        Self {
            flow: PyrLkFlow::new(opts),
        }
    }
}

impl PropagationStrategy for OpticalFlowPropagation {
    fn begin_cycle(&mut self, _frame: &Frame, _detection: &Detection) -> Result<()> {
        Ok(())
    }

    fn propagate(&mut self, ctx: &PropagationContext<'_>) -> Result<Propagated> {
        let (points, status) = self.flow.track(ctx.prev_frame, ctx.frame, ctx.prev_points);
        let failed = status.iter().filter(|s| !**s).count();
        if failed > 0 {
            debug!("optical flow left {failed} of {} points unconverged", points.len());
        }
        Ok(Propagated::points(points))
    }
}

#[cfg(test)]
mod tests {
    use crate::detectors::{CornerDetector, FeatureDetector};
    use crate::test_stuff::textured_frame;
    use crate::trackers::{OpticalFlowPropagation, PropagationContext, PropagationStrategy};

    #[test]
    fn cardinality_is_preserved() {
        let prev = textured_frame(64, 64, 0.0, 0.0);
        let curr = textured_frame(64, 64, 1.5, 1.0);
        let detector = CornerDetector::new(10, 0.05, 5.0, 3).unwrap();
        let prev_points = detector.detect(&prev).unwrap();

        let mut strategy = OpticalFlowPropagation::default();
        let out = strategy
            .propagate(&PropagationContext {
                tick: 1,
                prev_frame: &prev,
                frame: &curr,
                prev_points: &prev_points,
            })
            .unwrap();
        assert_eq!(out.points.len(), prev_points.len());
        assert!(out.ground_truth.is_none());
        assert!(out.matches.is_none());
    }
}
