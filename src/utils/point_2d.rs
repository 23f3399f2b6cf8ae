use nalgebra::Point2;

/// A single tracked 2D feature point.
///
/// The default value `(-1, -1)` is the "unset" sentinel inherited from the
/// slot model: a slot that never received a measurement stays at the sentinel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeaturePoint {
    pub x: f32,
    pub y: f32,
}

impl Default for FeaturePoint {
    fn default() -> Self {
        Self { x: -1.0, y: -1.0 }
    }
}

impl FeaturePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_set(&self) -> bool {
        *self != Self::default()
    }
}

impl From<Point2<f32>> for FeaturePoint {
    fn from(p: Point2<f32>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<FeaturePoint> for Point2<f32> {
    fn from(p: FeaturePoint) -> Self {
        Point2::from([p.x, p.y])
    }
}

/// Ordered set of feature points.
///
/// The index within the set is the slot identity: propagation strategies that
/// keep a one-to-one correspondence report the new position of slot `i` at
/// index `i`. Slot identities are only meaningful between two detection ticks.
pub type FeatureSet = Vec<FeaturePoint>;
