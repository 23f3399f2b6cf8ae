use crate::descriptor::Descriptor;
use crate::detectors::{Detection, DescriptorDetector, FeatureDetector};
use crate::matching::DescriptorMatcher;
use crate::trackers::{Propagated, PropagationContext, PropagationStrategy};
use crate::utils::frame::Frame;
use crate::utils::point_2d::FeatureSet;
use crate::Errors;
use anyhow::Result;

/// Propagates by re-extracting descriptors from scratch on every tick and
/// matching the baseline set (captured at the last detection tick) against
/// them.
///
/// The surviving points are the matched *current* keypoints, ordered by their
/// baseline index; points whose best match misses the threshold are dropped,
/// so the set may shrink within a cycle. There is no slot continuity with the
/// previous tick's output, only with the baseline.
#[derive(Clone, Debug)]
pub struct DescriptorRematchPropagation {
    extractor: DescriptorDetector,
    matcher: DescriptorMatcher,
    baseline: Vec<Descriptor>,
}

impl DescriptorRematchPropagation {
    pub fn new(extractor: DescriptorDetector, match_threshold: f32) -> Self {
        Self {
            extractor,
            matcher: DescriptorMatcher::new(match_threshold),
            baseline: Vec::new(),
        }
    }
}

impl PropagationStrategy for DescriptorRematchPropagation {
    fn begin_cycle(&mut self, _frame: &Frame, detection: &Detection) -> Result<()> {
        match &detection.descriptors {
            Some(d) => {
                self.baseline = d.clone();
                Ok(())
            }
            None => Err(Errors::MissingDescriptors.into()),
        }
    }

    fn propagate(&mut self, ctx: &PropagationContext<'_>) -> Result<Propagated> {
        let current = self.extractor.detect_with_descriptors(ctx.frame)?;
        let current_descriptors = current.descriptors.unwrap_or_default();
        let matches = self.matcher.match_sets(&self.baseline, &current_descriptors);

        let points: FeatureSet = matches.iter().map(|m| current.points[m.current]).collect();
        Ok(Propagated {
            points,
            ground_truth: None,
            matches: Some(matches),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::detectors::{DescriptorDetector, FeatureDetector};
    use crate::test_stuff::textured_frame;
    use crate::trackers::{
        DescriptorRematchPropagation, PropagationContext, PropagationStrategy,
    };
    use crate::EPS;

    #[test]
    fn rebase_requires_descriptors() {
        let mut strategy =
            DescriptorRematchPropagation::new(DescriptorDetector::new(8).unwrap(), 5.0);
        let frame = textured_frame(64, 64, 0.0, 0.0);
        let no_desc = crate::detectors::Detection {
            points: vec![],
            descriptors: None,
        };
        assert!(strategy.begin_cycle(&frame, &no_desc).is_err());
    }

    #[test]
    fn identical_frames_match_everything_at_zero_distance() {
        let extractor = DescriptorDetector::new(8).unwrap();
        let frame = textured_frame(64, 64, 0.0, 0.0);
        let detection = extractor.detect_with_descriptors(&frame).unwrap();
        let baseline_len = detection.points.len();
        assert!(baseline_len > 0);

        // Any positive threshold keeps every baseline point alive.
        let mut strategy = DescriptorRematchPropagation::new(extractor, 1e-4);
        strategy.begin_cycle(&frame, &detection).unwrap();
        let out = strategy
            .propagate(&PropagationContext {
                tick: 1,
                prev_frame: &frame,
                frame: &frame,
                prev_points: &detection.points,
            })
            .unwrap();

        assert_eq!(out.points.len(), baseline_len);
        let matches = out.matches.unwrap();
        for (i, m) in matches.iter().enumerate() {
            assert_eq!(m.previous, i);
            assert!(m.distance.abs() < EPS);
        }
    }

    #[test]
    fn threshold_drops_disappeared_features() {
        let extractor = DescriptorDetector::new(8).unwrap();
        let frame = textured_frame(64, 64, 0.0, 0.0);
        let detection = extractor.detect_with_descriptors(&frame).unwrap();

        // An unrelated frame makes every best match miss a tiny threshold.
        let unrelated = crate::test_stuff::blobs_frame(64, 64, &[(20.0, 20.0), (44.0, 44.0)]);
        let mut strategy = DescriptorRematchPropagation::new(extractor, 1e-4);
        strategy.begin_cycle(&frame, &detection).unwrap();
        let out = strategy
            .propagate(&PropagationContext {
                tick: 1,
                prev_frame: &frame,
                frame: &unrelated,
                prev_points: &detection.points,
            })
            .unwrap();
        assert!(out.points.len() < detection.points.len());
    }
}
