use nalgebra::{SMatrix, SVector};

/// Constant-velocity point filter
pub mod kalman_2d_point;

/// Fixed-size bank of independent point filters
pub mod kalman_2d_point_bank;

pub const DT: u64 = 1;

/// Mean and covariance of a filter.
///
/// A single state stands in for the classic pre/post pair: `update` yields the
/// posterior, `predict` the next prior, and a blind tick is just another
/// `predict` from the last state.
#[derive(Copy, Clone, Debug)]
pub struct KalmanState<const X: usize> {
    pub(crate) mean: SVector<f32, X>,
    pub(crate) covariance: SMatrix<f32, X, X>,
}

impl<const X: usize> KalmanState<X> {
    pub fn mean(&self) -> &SVector<f32, X> {
        &self.mean
    }

    pub fn covariance(&self) -> &SMatrix<f32, X, X> {
        &self.covariance
    }
}
