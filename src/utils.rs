/// Intensity frames and pixel sampling
pub mod frame;

/// Feature points and feature sets
pub mod point_2d;

/// Pyramidal Lucas-Kanade optical flow
pub mod pyrlk;

/// Kalman filter
pub mod kalman;
