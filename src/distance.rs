use crate::descriptor::Descriptor;
use std::ops::{MulAssign, SubAssign};

/// Euclidian distance between two descriptors
///
/// When the descriptor lengths don't match, the longer descriptor is truncated
/// to the shorter one when the distance is calculated.
///
pub fn euclidean(d1: &Descriptor, d2: &Descriptor) -> f32 {
    let mut acc = 0.0;
    for i in 0..d1.len().min(d2.len()) {
        let mut block1 = d1[i];
        let block2 = &d2[i];
        block1.sub_assign(block2);
        block1.mul_assign(block1);
        acc += block1.reduce_add();
    }
    acc.sqrt()
}
