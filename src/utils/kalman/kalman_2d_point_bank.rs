use crate::utils::kalman::kalman_2d_point::{
    Point2DKalmanFilter, DEFAULT_MEASUREMENT_NOISE_MULT, DEFAULT_PROCESS_NOISE_MULT,
    DIM_2D_POINT_X2,
};
use crate::utils::kalman::KalmanState;
use crate::utils::point_2d::{FeaturePoint, FeatureSet};
use crate::Errors;
use anyhow::Result;
use nalgebra::{Point2, Vector2};

#[derive(Clone, Copy, Debug)]
pub struct KalmanBankOptions {
    pub process_noise_mult: f32,
    pub measurement_noise_mult: f32,
    /// Seed freshly reset slots with the average velocity of the previous
    /// cycle instead of zero. Historically called "average acceleration" even
    /// though it averages the velocity components; the literal behavior is
    /// kept.
    pub velocity_carryover: bool,
}

impl Default for KalmanBankOptions {
    fn default() -> Self {
        Self {
            process_noise_mult: DEFAULT_PROCESS_NOISE_MULT,
            measurement_noise_mult: DEFAULT_MEASUREMENT_NOISE_MULT,
            velocity_carryover: false,
        }
    }
}

/// Fixed-size bank of independent constant-velocity filters, one per tracked
/// slot.
///
/// Slots are allocated once at construction and live for the whole run; a
/// detection tick re-seeds their contents through [reset](KalmanBank::reset),
/// it never reallocates them.
#[derive(Debug)]
pub struct KalmanBank {
    filter: Point2DKalmanFilter,
    states: Vec<KalmanState<DIM_2D_POINT_X2>>,
    velocity_carryover: bool,
}

impl KalmanBank {
    pub fn new(n_points: usize, opts: KalmanBankOptions) -> Result<Self> {
        if n_points == 0 {
            return Err(Errors::ZeroMaxPoints.into());
        }
        if opts.process_noise_mult <= 0.0 || opts.measurement_noise_mult <= 0.0 {
            return Err(Errors::InvalidNoiseMultipliers(
                opts.process_noise_mult,
                opts.measurement_noise_mult,
            )
            .into());
        }
        let filter = Point2DKalmanFilter::new(opts.process_noise_mult, opts.measurement_noise_mult);
        let states = vec![filter.initiate(&Point2::from([-1.0, -1.0]), &Vector2::zeros()); n_points];
        Ok(Self {
            filter,
            states,
            velocity_carryover: opts.velocity_carryover,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.states.len()
    }

    /// Re-seeds the first `min(n, len(points))` slots from a fresh detection.
    ///
    /// With velocity carryover enabled the seed velocity is the component-wise
    /// mean of those slots' current velocities, taken before they are
    /// overwritten; otherwise it is zero. Re-seeding replaces state and
    /// covariance wholesale. Slots beyond the detection keep their old state.
    pub fn reset(&mut self, points: &FeatureSet) {
        let m = self.states.len().min(points.len());
        if m == 0 {
            return;
        }

        let velocity = if self.velocity_carryover {
            let mut acc = Vector2::zeros();
            for s in &self.states[..m] {
                acc += Vector2::new(s.mean[2], s.mean[3]);
            }
            acc / m as f32
        } else {
            Vector2::zeros()
        };

        for (state, p) in self.states[..m].iter_mut().zip(&points[..m]) {
            *state = self.filter.initiate(&Point2::from([p.x, p.y]), &velocity);
        }
    }

    /// Advances every slot by one tick and returns all `n` predicted points.
    ///
    /// When ground truth is supplied, each slot with a corresponding point is
    /// corrected before the prediction; the remaining slots (and every slot on
    /// ticks without ground truth) dead-reckon from their last state.
    pub fn predict(&mut self, ground_truth: Option<&FeatureSet>) -> FeatureSet {
        let gt = ground_truth.map(|g| g.as_slice()).unwrap_or(&[]);
        let mut out = FeatureSet::with_capacity(self.states.len());
        for (i, state) in self.states.iter_mut().enumerate() {
            if let Some(p) = gt.get(i) {
                *state = self.filter.update(state, &Point2::from([p.x, p.y]));
            }
            *state = self.filter.predict(state);
            out.push(FeaturePoint::new(state.mean[0], state.mean[1]));
        }
        out
    }

    pub fn states(&self) -> &[KalmanState<DIM_2D_POINT_X2>] {
        &self.states
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::kalman::kalman_2d_point_bank::{KalmanBank, KalmanBankOptions};
    use crate::utils::point_2d::FeaturePoint;
    use crate::EPS;

    fn points(coords: &[(f32, f32)]) -> Vec<FeaturePoint> {
        coords.iter().map(|(x, y)| FeaturePoint::new(*x, *y)).collect()
    }

    #[test]
    fn zero_points_is_a_configuration_error() {
        assert!(KalmanBank::new(0, KalmanBankOptions::default()).is_err());
    }

    #[test]
    fn non_positive_noise_is_a_configuration_error() {
        let opts = KalmanBankOptions {
            measurement_noise_mult: 0.0,
            ..KalmanBankOptions::default()
        };
        assert!(KalmanBank::new(3, opts).is_err());
    }

    #[test]
    fn reset_then_predict_is_stationary() {
        let mut bank = KalmanBank::new(3, KalmanBankOptions::default()).unwrap();
        let p = points(&[(10.0, 10.0), (20.0, 5.0), (1.0, 2.0)]);
        bank.reset(&p);
        let predicted = bank.predict(None);
        assert_eq!(predicted.len(), 3);
        for (a, b) in p.iter().zip(&predicted) {
            assert!((a.x - b.x).abs() < EPS);
            assert!((a.y - b.y).abs() < EPS);
        }
    }

    #[test]
    fn output_cardinality_is_fixed() {
        let mut bank = KalmanBank::new(4, KalmanBankOptions::default()).unwrap();
        bank.reset(&points(&[(1.0, 1.0), (2.0, 2.0)]));
        let predicted = bank.predict(Some(&points(&[(1.5, 1.5)])));
        assert_eq!(predicted.len(), 4);
    }

    #[test]
    fn stationary_ground_truth_drives_velocity_to_zero() {
        let mut bank = KalmanBank::new(1, KalmanBankOptions::default()).unwrap();
        bank.reset(&points(&[(7.0, 7.0)]));
        let gt = points(&[(7.0, 7.0)]);
        for _ in 0..100 {
            bank.predict(Some(&gt));
        }
        let s = &bank.states()[0];
        assert!(s.mean()[2].abs() < 0.01);
        assert!(s.mean()[3].abs() < 0.01);
        assert!((s.mean()[0] - 7.0).abs() < 0.1);
    }

    #[test]
    fn carryover_seeds_average_velocity() {
        let opts = KalmanBankOptions {
            velocity_carryover: true,
            ..KalmanBankOptions::default()
        };
        let mut bank = KalmanBank::new(2, opts).unwrap();
        bank.reset(&points(&[(0.0, 0.0), (0.0, 10.0)]));

        // Drive both slots with constant motion so they accumulate velocity.
        for i in 1..=80 {
            let gt = points(&[(2.0 * i as f32, 0.0), (1.0 * i as f32, 10.0)]);
            bank.predict(Some(&gt));
        }
        let expected_vx =
            (bank.states()[0].mean()[2] + bank.states()[1].mean()[2]) / 2.0;
        let expected_vy =
            (bank.states()[0].mean()[3] + bank.states()[1].mean()[3]) / 2.0;
        assert!(expected_vx > 1.0);

        bank.reset(&points(&[(100.0, 100.0), (200.0, 200.0)]));
        for s in bank.states() {
            assert!((s.mean()[2] - expected_vx).abs() < EPS);
            assert!((s.mean()[3] - expected_vy).abs() < EPS);
        }
    }

    #[test]
    fn without_carryover_velocity_seed_is_zero() {
        let mut bank = KalmanBank::new(1, KalmanBankOptions::default()).unwrap();
        bank.reset(&points(&[(0.0, 0.0)]));
        for i in 1..=50 {
            bank.predict(Some(&points(&[(i as f32, 0.0)])));
        }
        bank.reset(&points(&[(5.0, 5.0)]));
        let s = &bank.states()[0];
        assert!(s.mean()[2].abs() < EPS);
        assert!(s.mean()[3].abs() < EPS);
    }
}
