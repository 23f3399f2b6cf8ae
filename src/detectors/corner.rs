use crate::detectors::FeatureDetector;
use crate::utils::frame::Frame;
use crate::utils::point_2d::{FeaturePoint, FeatureSet};
use crate::Errors;
use anyhow::Result;
use itertools::Itertools;
use log::debug;

/// Minimum-eigenvalue (Shi-Tomasi) corner score for every pixel of the frame.
///
/// The structure tensor is accumulated over a `block_size x block_size`
/// window of central-difference gradients; the score is its smaller
/// eigenvalue.
pub(crate) fn min_eigenvalue_scores(frame: &Frame, block_size: usize) -> Vec<f32> {
    let (w, h) = (frame.width(), frame.height());
    let mut gx = vec![0.0f32; w * h];
    let mut gy = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let (xi, yi) = (x as i64, y as i64);
            gx[y * w + x] = (frame.get(xi + 1, yi) - frame.get(xi - 1, yi)) * 0.5;
            gy[y * w + x] = (frame.get(xi, yi + 1) - frame.get(xi, yi - 1)) * 0.5;
        }
    }

    let r = (block_size / 2) as i64;
    let mut scores = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let (mut a, mut b, mut c) = (0.0f32, 0.0f32, 0.0f32);
            for dy in -r..=r {
                for dx in -r..=r {
                    let sx = (x as i64 + dx).clamp(0, w as i64 - 1) as usize;
                    let sy = (y as i64 + dy).clamp(0, h as i64 - 1) as usize;
                    let (ix, iy) = (gx[sy * w + sx], gy[sy * w + sx]);
                    a += ix * ix;
                    b += ix * iy;
                    c += iy * iy;
                }
            }
            scores[y * w + x] = 0.5 * ((a + c) - ((a - c).powi(2) + 4.0 * b * b).sqrt());
        }
    }
    scores
}

/// Ranks scored pixels descending and greedily keeps up to `max_points` of
/// them that clear `threshold` and stay `min_distance` apart.
pub(crate) fn select_corners(
    scores: &[f32],
    width: usize,
    threshold: f32,
    min_distance: f32,
    max_points: usize,
) -> FeatureSet {
    let min_dist2 = min_distance * min_distance;
    let ranked = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| **s >= threshold)
        .sorted_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap());

    let mut picked = FeatureSet::new();
    for (idx, _) in ranked {
        if picked.len() == max_points {
            break;
        }
        let p = FeaturePoint::new((idx % width) as f32, (idx / width) as f32);
        let far_enough = picked
            .iter()
            .all(|q| (q.x - p.x).powi(2) + (q.y - p.y).powi(2) >= min_dist2);
        if far_enough {
            picked.push(p);
        }
    }
    picked
}

/// Corner detector modeled after the classic "good features to track"
/// selection: strongest min-eigenvalue corners, thresholded relative to the
/// best one, spread out by a minimum pairwise distance.
#[derive(Clone, Debug)]
pub struct CornerDetector {
    max_points: usize,
    quality_ratio: f32,
    min_distance: f32,
    block_size: usize,
}

impl CornerDetector {
    pub fn new(
        max_points: usize,
        quality_ratio: f32,
        min_distance: f32,
        block_size: usize,
    ) -> Result<Self> {
        if max_points == 0 {
            return Err(Errors::ZeroMaxPoints.into());
        }
        if !(quality_ratio > 0.0 && quality_ratio <= 1.0) {
            return Err(Errors::InvalidQualityRatio(quality_ratio).into());
        }
        Ok(Self {
            max_points,
            quality_ratio,
            min_distance,
            block_size: block_size.max(1),
        })
    }
}

impl FeatureDetector for CornerDetector {
    fn detect(&self, frame: &Frame) -> Result<FeatureSet> {
        let scores = min_eigenvalue_scores(frame, self.block_size);
        let max_score = scores.iter().cloned().fold(0.0f32, f32::max);
        if max_score <= 0.0 {
            debug!("no corner response anywhere in the frame");
            return Ok(FeatureSet::new());
        }

        let picked = select_corners(
            &scores,
            frame.width(),
            self.quality_ratio * max_score,
            self.min_distance,
            self.max_points,
        );
        if picked.len() < self.max_points {
            debug!(
                "corner detection yielded {} of {} requested points",
                picked.len(),
                self.max_points
            );
        }
        Ok(picked)
    }
}
