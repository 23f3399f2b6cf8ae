use crate::utils::kalman::{KalmanState, DT};
use nalgebra::{Point2, SMatrix, SVector, Vector2};

pub const DIM_2D_POINT: usize = 2;
pub const DIM_2D_POINT_X2: usize = DIM_2D_POINT * 2;

pub const DEFAULT_PROCESS_NOISE_MULT: f32 = 0.003;
pub const DEFAULT_MEASUREMENT_NOISE_MULT: f32 = 1.0;

/// Constant-velocity Kalman filter over a 2D point.
///
/// State is `[x, y, vx, vy]` with a unit time step. The noise model is the
/// plain scaled-identity one: process covariance `I4 * q`, measurement
/// covariance `I2 * r`. The measurement matrix extracts the position.
#[derive(Debug, Clone)]
pub struct Point2DKalmanFilter {
    motion_matrix: SMatrix<f32, DIM_2D_POINT_X2, DIM_2D_POINT_X2>,
    update_matrix: SMatrix<f32, DIM_2D_POINT, DIM_2D_POINT_X2>,
    process_noise: SMatrix<f32, DIM_2D_POINT_X2, DIM_2D_POINT_X2>,
    measurement_noise: SMatrix<f32, DIM_2D_POINT, DIM_2D_POINT>,
}

impl Default for Point2DKalmanFilter {
    fn default() -> Self {
        Point2DKalmanFilter::new(DEFAULT_PROCESS_NOISE_MULT, DEFAULT_MEASUREMENT_NOISE_MULT)
    }
}

impl Point2DKalmanFilter {
    pub fn new(process_noise_mult: f32, measurement_noise_mult: f32) -> Self {
        let mut motion_matrix: SMatrix<f32, DIM_2D_POINT_X2, DIM_2D_POINT_X2> = SMatrix::identity();

        for i in 0..DIM_2D_POINT {
            motion_matrix[(i, DIM_2D_POINT + i)] = DT as f32;
        }

        Point2DKalmanFilter {
            motion_matrix,
            update_matrix: SMatrix::identity(),
            process_noise: SMatrix::identity() * process_noise_mult,
            measurement_noise: SMatrix::identity() * measurement_noise_mult,
        }
    }

    /// Fresh filter state located at `p` with the given velocity seed and zero
    /// covariance.
    pub fn initiate(&self, p: &Point2<f32>, velocity: &Vector2<f32>) -> KalmanState<DIM_2D_POINT_X2> {
        KalmanState {
            mean: SVector::from_iterator([p.x, p.y, velocity.x, velocity.y]),
            covariance: SMatrix::zeros(),
        }
    }

    pub fn predict(&self, state: &KalmanState<DIM_2D_POINT_X2>) -> KalmanState<DIM_2D_POINT_X2> {
        let (mean, covariance) = (state.mean, state.covariance);
        let mean = self.motion_matrix * mean;
        let covariance = self.motion_matrix * covariance * self.motion_matrix.transpose()
            + self.process_noise;
        KalmanState { mean, covariance }
    }

    fn project(
        &self,
        mean: SVector<f32, DIM_2D_POINT_X2>,
        covariance: SMatrix<f32, DIM_2D_POINT_X2, DIM_2D_POINT_X2>,
    ) -> KalmanState<DIM_2D_POINT> {
        let mean = self.update_matrix * mean;
        let covariance = self.update_matrix * covariance * self.update_matrix.transpose()
            + self.measurement_noise;
        KalmanState { mean, covariance }
    }

    pub fn update(
        &self,
        state: &KalmanState<DIM_2D_POINT_X2>,
        p: &Point2<f32>,
    ) -> KalmanState<DIM_2D_POINT_X2> {
        let (mean, covariance) = (state.mean, state.covariance);
        let projected_state = self.project(mean, covariance);
        let (projected_mean, projected_cov) = (projected_state.mean, projected_state.covariance);

        // Innovation covariance contains R > 0, so the factorization holds.
        let choletsky = projected_cov.cholesky().unwrap();
        let b = (covariance * self.update_matrix.transpose()).transpose();
        let kalman_gain = choletsky.solve(&b);

        let innovation = SVector::from_iterator([p.x, p.y]) - projected_mean;
        let innovation: SMatrix<f32, 1, DIM_2D_POINT> = innovation.transpose();

        let mean = mean + (innovation * kalman_gain).transpose();
        let covariance = covariance - kalman_gain.transpose() * projected_cov * kalman_gain;
        KalmanState { mean, covariance }
    }
}

impl From<KalmanState<{ DIM_2D_POINT_X2 }>> for Point2<f32> {
    fn from(s: KalmanState<{ DIM_2D_POINT_X2 }>) -> Self {
        Point2::from([s.mean.x, s.mean.y])
    }
}
