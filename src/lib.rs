/// Descriptor distance kernels
pub mod distance;

/// Fixed-length SIMD descriptor vectors
pub mod descriptor;

/// Nearest-neighbor descriptor matching
pub mod matching;

/// Feature detectors (corner and descriptor based)
pub mod detectors;

/// Tracking engine, session and propagation strategies
pub mod trackers;

/// Numeric primitives: frames, points, optical flow, Kalman filters
pub mod utils;

/// Synthetic frames and scenes for tests and demos
pub mod test_stuff;

pub mod prelude;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Errors {
    #[error("Maximum point count must be a positive number.")]
    ZeroMaxPoints,
    #[error("Quality ratio must be within (0.0, 1.0], got {0}.")]
    InvalidQualityRatio(f32),
    #[error("Detection interval must be a positive number.")]
    ZeroInterval,
    #[error("Correction period must be a positive number.")]
    ZeroCorrectionPeriod,
    #[error("Noise multipliers must be positive, got process={0}, measurement={1}.")]
    InvalidNoiseMultipliers(f32, f32),
    #[error("Detection carries no descriptors - rematch propagation cannot be re-based.")]
    MissingDescriptors,
    #[error("Frame buffer of {got} pixels does not match {width}x{height}.")]
    FrameShape {
        width: usize,
        height: usize,
        got: usize,
    },
    #[error("Frame dimensions must be positive.")]
    EmptyFrame,
}

pub(crate) const EPS: f32 = 0.00001;
