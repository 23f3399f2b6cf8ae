use crate::detectors::FeatureDetector;
use crate::matching::DescriptorMatch;
use crate::trackers::{PropagationContext, PropagationStrategy};
use crate::utils::frame::Frame;
use crate::utils::point_2d::FeatureSet;
use crate::Errors;
use anyhow::Result;
use log::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickPhase {
    Detect,
    Track,
}

/// What one engine tick produced.
#[derive(Clone, Debug)]
pub struct TickOutput {
    pub tick: usize,
    pub phase: TickPhase,
    /// The current feature set.
    pub points: FeatureSet,
    /// Independently tracked measurements, present when the propagation
    /// strategy runs an internal ground-truth tracker.
    pub ground_truth: Option<FeatureSet>,
    /// Descriptor match metadata, present on track ticks of descriptor-based
    /// strategies.
    pub matches: Option<Vec<DescriptorMatch>>,
}

/// State the engine carries from one tick to the next.
struct SessionState {
    frame: Frame,
    points: FeatureSet,
}

/// The two-phase per-tick state machine.
///
/// Tick `t` runs detection iff `t % interval == 0` (so tick 0 always
/// detects) and propagation otherwise. A detection tick re-seeds the
/// propagation strategy and restarts slot identities; nothing tracked before
/// it survives the boundary.
pub struct TrackingEngine<D, P>
where
    D: FeatureDetector,
    P: PropagationStrategy,
{
    detector: D,
    strategy: P,
    interval: usize,
    tick: usize,
    prev: Option<SessionState>,
}

impl<D, P> TrackingEngine<D, P>
where
    D: FeatureDetector,
    P: PropagationStrategy,
{
    pub fn new(detector: D, strategy: P, interval: usize) -> Result<Self> {
        if interval == 0 {
            return Err(Errors::ZeroInterval.into());
        }
        Ok(Self {
            detector,
            strategy,
            interval,
            tick: 0,
            prev: None,
        })
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    /// Processes one frame and yields the current feature set.
    pub fn process(&mut self, frame: Frame) -> Result<TickOutput> {
        let tick = self.tick;
        let phase = if tick % self.interval == 0 {
            TickPhase::Detect
        } else {
            TickPhase::Track
        };

        let output = match (phase, self.prev.take()) {
            (TickPhase::Detect, _) => {
                let detection = self.detector.detect_with_descriptors(&frame)?;
                self.strategy.begin_cycle(&frame, &detection)?;
                debug!("tick {tick}: detected {} points", detection.points.len());
                TickOutput {
                    tick,
                    phase,
                    points: detection.points,
                    ground_truth: None,
                    matches: None,
                }
            }
            (TickPhase::Track, Some(prev)) => {
                let propagated = self.strategy.propagate(&PropagationContext {
                    tick,
                    prev_frame: &prev.frame,
                    frame: &frame,
                    prev_points: &prev.points,
                })?;
                TickOutput {
                    tick,
                    phase,
                    points: propagated.points,
                    ground_truth: propagated.ground_truth,
                    matches: propagated.matches,
                }
            }
            // Unreachable by the interval rule: tick 0 always detects, and
            // every later tick has previous state.
            (TickPhase::Track, None) => unreachable!("track tick without previous state"),
        };

        let carry = output
            .ground_truth
            .clone()
            .unwrap_or_else(|| output.points.clone());
        self.prev = Some(SessionState {
            frame,
            points: carry,
        });
        self.tick += 1;
        Ok(output)
    }
}
