use crate::detectors::{CornerDetector, DescriptorDetector, Detection, Detector};
use crate::trackers::engine::{TickOutput, TrackingEngine};
use crate::trackers::state_estimation::StateEstimationOptions;
use crate::trackers::{
    DescriptorRematchPropagation, OpticalFlowPropagation, Propagated, PropagationContext,
    PropagationStrategy, StateEstimationPropagation,
};
use crate::utils::frame::Frame;
use crate::utils::pyrlk::PyrLkOptions;
use crate::Errors;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Delivers frames to a session. `next_frame` may block; `Ok(None)` signals
/// end of stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

impl<I> FrameSource for I
where
    I: Iterator<Item = Frame>,
{
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.next())
    }
}

/// Closed set of propagation strategy variants, selected by configuration.
#[derive(Debug)]
pub enum Propagation {
    OpticalFlow(OpticalFlowPropagation),
    DescriptorRematch(DescriptorRematchPropagation),
    StateEstimation(StateEstimationPropagation),
}

impl PropagationStrategy for Propagation {
    fn begin_cycle(&mut self, frame: &Frame, detection: &Detection) -> Result<()> {
        match self {
            Propagation::OpticalFlow(s) => s.begin_cycle(frame, detection),
            Propagation::DescriptorRematch(s) => s.begin_cycle(frame, detection),
            Propagation::StateEstimation(s) => s.begin_cycle(frame, detection),
        }
    }

    fn propagate(&mut self, ctx: &PropagationContext<'_>) -> Result<Propagated> {
        match self {
            Propagation::OpticalFlow(s) => s.propagate(ctx),
            Propagation::DescriptorRematch(s) => s.propagate(ctx),
            Propagation::StateEstimation(s) => s.propagate(ctx),
        }
    }
}

#[derive(Clone, Debug)]
enum DetectorChoice {
    Corner {
        max_points: usize,
        quality_ratio: f32,
        min_distance: f32,
        block_size: usize,
    },
    Descriptor {
        max_points: usize,
    },
}

#[derive(Clone, Debug)]
enum PropagationChoice {
    OpticalFlow(PyrLkOptions),
    DescriptorRematch { match_threshold: f32 },
    StateEstimation(StateEstimationOptions),
}

/// Configures a tracking session: detection interval, detector variant and
/// propagation variant. Defaults mirror the original tool: corner detection
/// of up to 100 points re-run every 60 ticks, optical-flow propagation in
/// between.
#[derive(Clone, Debug)]
pub struct SessionOptions {
    interval: usize,
    detector: DetectorChoice,
    propagation: PropagationChoice,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            interval: 60,
            detector: DetectorChoice::Corner {
                max_points: 100,
                quality_ratio: 0.2,
                min_distance: 10.0,
                block_size: 3,
            },
            propagation: PropagationChoice::OpticalFlow(PyrLkOptions::default()),
        }
    }
}

impl SessionOptions {
    pub fn interval(mut self, interval: usize) -> Self {
        self.interval = interval;
        self
    }

    pub fn corner_detector(
        mut self,
        max_points: usize,
        quality_ratio: f32,
        min_distance: f32,
        block_size: usize,
    ) -> Self {
        self.detector = DetectorChoice::Corner {
            max_points,
            quality_ratio,
            min_distance,
            block_size,
        };
        self
    }

    pub fn descriptor_detector(mut self, max_points: usize) -> Self {
        self.detector = DetectorChoice::Descriptor { max_points };
        self
    }

    pub fn optical_flow(mut self, opts: PyrLkOptions) -> Self {
        self.propagation = PropagationChoice::OpticalFlow(opts);
        self
    }

    pub fn descriptor_rematch(mut self, match_threshold: f32) -> Self {
        self.propagation = PropagationChoice::DescriptorRematch { match_threshold };
        self
    }

    pub fn state_estimation(mut self, opts: StateEstimationOptions) -> Self {
        self.propagation = PropagationChoice::StateEstimation(opts);
        self
    }

    /// Validates the configuration and binds it to a frame source.
    pub fn build<S: FrameSource>(self, source: S) -> Result<TrackingSession<S>> {
        let (detector, max_points) = match self.detector {
            DetectorChoice::Corner {
                max_points,
                quality_ratio,
                min_distance,
                block_size,
            } => (
                Detector::Corner(CornerDetector::new(
                    max_points,
                    quality_ratio,
                    min_distance,
                    block_size,
                )?),
                max_points,
            ),
            DetectorChoice::Descriptor { max_points } => (
                Detector::Descriptor(DescriptorDetector::new(max_points)?),
                max_points,
            ),
        };

        let propagation = match self.propagation {
            PropagationChoice::OpticalFlow(opts) => {
                Propagation::OpticalFlow(OpticalFlowPropagation::new(opts))
            }
            PropagationChoice::DescriptorRematch { match_threshold } => {
                // Rematching needs a descriptor baseline on every detection
                // tick, which only the descriptor detector provides.
                if !matches!(detector, Detector::Descriptor(_)) {
                    return Err(Errors::MissingDescriptors.into());
                }
                Propagation::DescriptorRematch(DescriptorRematchPropagation::new(
                    DescriptorDetector::new(max_points)?,
                    match_threshold,
                ))
            }
            PropagationChoice::StateEstimation(opts) => Propagation::StateEstimation(
                StateEstimationPropagation::new(max_points, opts)?,
            ),
        };

        Ok(TrackingSession {
            source,
            engine: TrackingEngine::new(detector, propagation, self.interval)?,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }
}

/// One tracking run: a frame source, the engine and a cooperative stop flag.
///
/// `advance` is the only operation the surrounding I/O loop needs: it pulls
/// the next frame, runs one engine tick and hands the output back. The run
/// ends with `Ok(None)` on end-of-stream or when the cancellation flag was
/// raised; the two are deliberately indistinguishable here.
pub struct TrackingSession<S: FrameSource> {
    source: S,
    engine: TrackingEngine<Detector, Propagation>,
    cancel: Arc<AtomicBool>,
}

impl<S: FrameSource> TrackingSession<S> {
    /// Flag checked once per tick; set it from anywhere to stop the run.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn advance(&mut self) -> Result<Option<TickOutput>> {
        if self.cancel.load(Ordering::Relaxed) {
            return Ok(None);
        }
        match self.source.next_frame()? {
            None => Ok(None),
            Some(frame) => self.engine.process(frame).map(Some),
        }
    }

    /// Drives the session to termination, feeding every tick to `sink`.
    pub fn run(&mut self, mut sink: impl FnMut(&TickOutput)) -> Result<()> {
        while let Some(output) = self.advance()? {
            sink(&output);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_stuff::TexturedScene;
    use crate::trackers::engine::TickPhase;
    use crate::trackers::session::SessionOptions;
    use crate::trackers::state_estimation::StateEstimationOptions;
    use std::sync::atomic::Ordering;

    fn scene(frames: usize) -> TexturedScene {
        TexturedScene::new(64, 64, (0.5, 0.25), frames)
    }

    #[test]
    fn rematch_requires_descriptor_detector() {
        let r = SessionOptions::default()
            .descriptor_rematch(5.0)
            .build(scene(3));
        assert!(r.is_err());
    }

    #[test]
    fn runs_to_end_of_stream() {
        let mut session = SessionOptions::default()
            .interval(2)
            .corner_detector(8, 0.05, 5.0, 3)
            .build(scene(5))
            .unwrap();
        let mut ticks = vec![];
        session.run(|out| ticks.push(out.phase)).unwrap();
        assert_eq!(ticks.len(), 5);
        assert_eq!(
            ticks,
            vec![
                TickPhase::Detect,
                TickPhase::Track,
                TickPhase::Detect,
                TickPhase::Track,
                TickPhase::Detect,
            ]
        );
        assert!(session.advance().unwrap().is_none());
    }

    #[test]
    fn cancellation_stops_the_run() {
        let mut session = SessionOptions::default()
            .interval(2)
            .corner_detector(8, 0.05, 5.0, 3)
            .build(scene(100))
            .unwrap();
        let flag = session.cancellation_flag();
        assert!(session.advance().unwrap().is_some());
        flag.store(true, Ordering::Relaxed);
        assert!(session.advance().unwrap().is_none());
    }

    #[test]
    fn state_estimation_session_emits_ground_truth() {
        let mut session = SessionOptions::default()
            .interval(4)
            .corner_detector(6, 0.05, 5.0, 3)
            .state_estimation(StateEstimationOptions::default())
            .build(scene(4))
            .unwrap();

        let first = session.advance().unwrap().unwrap();
        assert_eq!(first.phase, TickPhase::Detect);
        assert!(first.ground_truth.is_none());
        let n = first.points.len();

        let second = session.advance().unwrap().unwrap();
        assert_eq!(second.phase, TickPhase::Track);
        // The bank always answers with its full slot count.
        assert_eq!(second.points.len(), 6);
        assert_eq!(second.ground_truth.unwrap().len(), n);
    }

    #[test]
    fn rematch_session_emits_matches() {
        let mut session = SessionOptions::default()
            .interval(4)
            .descriptor_detector(8)
            .descriptor_rematch(10.0)
            .build(scene(3))
            .unwrap();
        let first = session.advance().unwrap().unwrap();
        assert!(first.matches.is_none());
        let second = session.advance().unwrap().unwrap();
        assert!(second.matches.is_some());
        assert_eq!(second.points.len(), second.matches.unwrap().len());
    }
}
