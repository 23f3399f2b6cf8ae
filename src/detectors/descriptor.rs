use crate::descriptor::{Descriptor, FromVec};
use crate::detectors::corner::{min_eigenvalue_scores, select_corners};
use crate::detectors::{Detection, FeatureDetector};
use crate::utils::frame::Frame;
use crate::utils::point_2d::{FeaturePoint, FeatureSet};
use crate::{Errors, EPS};
use anyhow::Result;
use log::debug;

/// Square patch side sampled around a keypoint; descriptor length is its
/// square (256), padded into 32 SIMD lanes.
const PATCH_SIDE: usize = 16;
const SCORE_BLOCK_SIZE: usize = 3;
const MIN_KEYPOINT_DISTANCE: f32 = 8.0;
/// Response floor relative to the strongest keypoint, mirrors a contrast
/// threshold: everything weaker is considered noise.
const RESPONSE_RATIO: f32 = 0.02;

/// Keypoint + descriptor extractor.
///
/// Keypoints are ranked by the extractor's internal corner response; each is
/// paired with a mean/variance normalized intensity patch packed as a
/// [Descriptor]. The tracking core treats the vectors as opaque and only ever
/// compares them under L2 distance.
#[derive(Clone, Debug)]
pub struct DescriptorDetector {
    max_points: usize,
}

impl DescriptorDetector {
    pub fn new(max_points: usize) -> Result<Self> {
        if max_points == 0 {
            return Err(Errors::ZeroMaxPoints.into());
        }
        Ok(Self { max_points })
    }

    fn keypoints(&self, frame: &Frame) -> FeatureSet {
        let scores = min_eigenvalue_scores(frame, SCORE_BLOCK_SIZE);
        let max_score = scores.iter().cloned().fold(0.0f32, f32::max);
        if max_score <= 0.0 {
            return FeatureSet::new();
        }
        select_corners(
            &scores,
            frame.width(),
            RESPONSE_RATIO * max_score,
            MIN_KEYPOINT_DISTANCE,
            self.max_points,
        )
    }

    fn describe(&self, frame: &Frame, p: &FeaturePoint) -> Descriptor {
        let half = PATCH_SIDE as f32 / 2.0 - 0.5;
        let mut patch = Vec::with_capacity(PATCH_SIDE * PATCH_SIDE);
        for dy in 0..PATCH_SIDE {
            for dx in 0..PATCH_SIDE {
                patch.push(frame.sample(p.x + dx as f32 - half, p.y + dy as f32 - half));
            }
        }

        let n = patch.len() as f32;
        let mean = patch.iter().sum::<f32>() / n;
        let var = patch.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        let std = var.sqrt();
        if std > EPS {
            for v in &mut patch {
                *v = (*v - mean) / std;
            }
        } else {
            // Flat patch, descriptor degenerates to zero.
            patch.iter_mut().for_each(|v| *v = 0.0);
        }
        Descriptor::from_vec(patch)
    }
}

impl FeatureDetector for DescriptorDetector {
    fn detect(&self, frame: &Frame) -> Result<FeatureSet> {
        Ok(self.keypoints(frame))
    }

    fn detect_with_descriptors(&self, frame: &Frame) -> Result<Detection> {
        let points = self.keypoints(frame);
        if points.len() < self.max_points {
            debug!(
                "descriptor detection yielded {} of {} requested keypoints",
                points.len(),
                self.max_points
            );
        }
        let descriptors = points.iter().map(|p| self.describe(frame, p)).collect();
        Ok(Detection {
            points,
            descriptors: Some(descriptors),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::detectors::descriptor::DescriptorDetector;
    use crate::detectors::FeatureDetector;
    use crate::distance::euclidean;
    use crate::test_stuff::textured_frame;
    use crate::EPS;

    #[test]
    fn zero_max_points_is_rejected() {
        assert!(DescriptorDetector::new(0).is_err());
        assert!(DescriptorDetector::new(1).is_ok());
    }

    #[test]
    fn descriptors_pair_with_points() {
        let d = DescriptorDetector::new(8).unwrap();
        let det = d
            .detect_with_descriptors(&textured_frame(64, 64, 0.0, 0.0))
            .unwrap();
        let descriptors = det.descriptors.unwrap();
        assert_eq!(det.points.len(), descriptors.len());
        assert!(det.points.len() <= 8);
        assert!(!det.points.is_empty());
    }

    #[test]
    fn same_frame_gives_identical_descriptors() {
        let d = DescriptorDetector::new(8).unwrap();
        let frame = textured_frame(64, 64, 0.0, 0.0);
        let a = d.detect_with_descriptors(&frame).unwrap();
        let b = d.detect_with_descriptors(&frame).unwrap();
        for (da, db) in a
            .descriptors
            .unwrap()
            .iter()
            .zip(b.descriptors.unwrap().iter())
        {
            assert!(euclidean(da, db) < EPS);
        }
    }
}
