use crate::utils::frame::Frame;
use crate::utils::point_2d::{FeaturePoint, FeatureSet};
use nalgebra::{Matrix2, Vector2};

/// Spatial gradient matrices below this determinant are treated as flat
/// patches that carry no flow information.
const MIN_GRADIENT_DET: f32 = 1e-9;

#[derive(Clone, Copy, Debug)]
pub struct PyrLkOptions {
    /// Half size of the tracking window, window is `(2r + 1) x (2r + 1)`.
    pub window_radius: i64,
    /// Maximum number of pyramid levels above the full-resolution one.
    pub levels: usize,
    /// Iteration cap per pyramid level.
    pub max_iterations: usize,
    /// Iteration stops when the last step length falls below this value.
    pub epsilon: f32,
}

impl Default for PyrLkOptions {
    fn default() -> Self {
        Self {
            window_radius: 10,
            levels: 3,
            max_iterations: 30,
            epsilon: 0.01,
        }
    }
}

/// Iterative pyramidal Lucas-Kanade optical flow.
///
/// `track` predicts where every input point moved between two frames and
/// reports a per-point convergence status alongside. Output cardinality always
/// equals input cardinality; a point whose patch was flat or fell outside the
/// frame keeps the best prediction reached so far with its status lowered.
#[derive(Clone, Debug, Default)]
pub struct PyrLkFlow {
    opts: PyrLkOptions,
}

impl PyrLkFlow {
    pub fn new(opts: PyrLkOptions) -> Self {
        Self { opts }
    }

    fn pyramid(&self, frame: &Frame) -> Vec<Frame> {
        let window = 2 * self.opts.window_radius as usize + 1;
        let mut levels = vec![frame.clone()];
        while levels.len() <= self.opts.levels {
            let last = levels.last().unwrap();
            if last.width().min(last.height()) / 2 < window {
                break;
            }
            levels.push(last.downsample_half());
        }
        levels
    }

    pub fn track(
        &self,
        prev: &Frame,
        curr: &Frame,
        points: &FeatureSet,
    ) -> (FeatureSet, Vec<bool>) {
        let prev_pyr = self.pyramid(prev);
        let curr_pyr = self.pyramid(curr);
        let levels = prev_pyr.len().min(curr_pyr.len());

        let mut out = FeatureSet::with_capacity(points.len());
        let mut status = Vec::with_capacity(points.len());
        for p in points {
            let (q, ok) = self.track_point(&prev_pyr[..levels], &curr_pyr[..levels], p);
            out.push(q);
            status.push(ok);
        }
        (out, status)
    }

    fn track_point(&self, prev_pyr: &[Frame], curr_pyr: &[Frame], p: &FeaturePoint) -> (FeaturePoint, bool) {
        let r = self.opts.window_radius;
        let mut flow = Vector2::zeros();
        let mut ok = true;

        for level in (0..prev_pyr.len()).rev() {
            let scale = (1u32 << level) as f32;
            let prev_l = &prev_pyr[level];
            let curr_l = &curr_pyr[level];
            let base = Vector2::new(p.x / scale, p.y / scale);

            // Spatial gradients of the previous patch, fixed per level.
            let mut grads = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
            let mut g_mat = Matrix2::zeros();
            for dy in -r..=r {
                for dx in -r..=r {
                    let (x, y) = (base.x + dx as f32, base.y + dy as f32);
                    let ix = (prev_l.sample(x + 1.0, y) - prev_l.sample(x - 1.0, y)) * 0.5;
                    let iy = (prev_l.sample(x, y + 1.0) - prev_l.sample(x, y - 1.0)) * 0.5;
                    g_mat += Matrix2::new(ix * ix, ix * iy, ix * iy, iy * iy);
                    grads.push((ix, iy));
                }
            }

            if g_mat.determinant().abs() < MIN_GRADIENT_DET {
                ok = false;
                if level > 0 {
                    flow *= 2.0;
                }
                continue;
            }
            let g_inv = match g_mat.try_inverse() {
                Some(inv) => inv,
                None => {
                    ok = false;
                    if level > 0 {
                        flow *= 2.0;
                    }
                    continue;
                }
            };

            let mut nu = Vector2::zeros();
            for _ in 0..self.opts.max_iterations {
                let mut b = Vector2::zeros();
                let mut cell = 0;
                for dy in -r..=r {
                    for dx in -r..=r {
                        let (ix, iy) = grads[cell];
                        cell += 1;
                        let (x, y) = (base.x + dx as f32, base.y + dy as f32);
                        let delta = prev_l.sample(x, y)
                            - curr_l.sample(x + flow.x + nu.x, y + flow.y + nu.y);
                        b += Vector2::new(ix, iy) * delta;
                    }
                }
                let eta = g_inv * b;
                nu += eta;
                if eta.norm() < self.opts.epsilon {
                    break;
                }
            }

            flow = if level > 0 { (flow + nu) * 2.0 } else { flow + nu };
        }

        let q = FeaturePoint::new(p.x + flow.x, p.y + flow.y);
        let inside = q.x >= 0.0
            && q.y >= 0.0
            && q.x <= (prev_pyr[0].width() - 1) as f32
            && q.y <= (prev_pyr[0].height() - 1) as f32;
        (q, ok && inside)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_stuff::textured_frame;
    use crate::utils::point_2d::FeaturePoint;
    use crate::utils::pyrlk::{PyrLkFlow, PyrLkOptions};

    #[test]
    fn identical_frames_keep_points() {
        let f = textured_frame(64, 64, 0.0, 0.0);
        let flow = PyrLkFlow::default();
        let points = vec![FeaturePoint::new(20.0, 20.0), FeaturePoint::new(40.0, 31.0)];
        let (tracked, status) = flow.track(&f, &f, &points);
        assert_eq!(tracked.len(), points.len());
        for (p, q) in points.iter().zip(&tracked) {
            assert!((p.x - q.x).abs() < 0.01);
            assert!((p.y - q.y).abs() < 0.01);
        }
        assert!(status.iter().all(|s| *s));
    }

    #[test]
    fn recovers_constant_translation() {
        let prev = textured_frame(64, 64, 0.0, 0.0);
        let curr = textured_frame(64, 64, 3.0, -2.0);
        let flow = PyrLkFlow::default();
        let points = vec![
            FeaturePoint::new(25.0, 30.0),
            FeaturePoint::new(33.0, 22.0),
            FeaturePoint::new(40.0, 40.0),
        ];
        let (tracked, _) = flow.track(&prev, &curr, &points);
        for (p, q) in points.iter().zip(&tracked) {
            assert!((q.x - (p.x + 3.0)).abs() < 0.25, "x: {} vs {}", q.x, p.x + 3.0);
            assert!((q.y - (p.y - 2.0)).abs() < 0.25, "y: {} vs {}", q.y, p.y - 2.0);
        }
    }

    #[test]
    fn flat_patch_reports_failure() {
        let prev = textured_frame(64, 64, 0.0, 0.0);
        let flat = crate::utils::frame::Frame::from_intensity(64, 64, vec![0.5; 64 * 64]).unwrap();
        let flow = PyrLkFlow::new(PyrLkOptions {
            levels: 0,
            ..PyrLkOptions::default()
        });
        let points = vec![FeaturePoint::new(32.0, 32.0)];
        let (tracked, status) = flow.track(&flat, &prev, &points);
        assert_eq!(tracked.len(), 1);
        assert!(!status[0]);
    }
}
