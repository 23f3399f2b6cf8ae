use ultraviolet::f32x8;

pub const DESCRIPTOR_LANES_SIZE: usize = 8;

/// Fixed-length feature descriptor packed into SIMD lanes.
///
/// Descriptors are opaque to the tracking core: every consumer goes through
/// [euclidean](crate::distance::euclidean) and never looks at individual
/// components.
pub type Descriptor = Vec<f32x8>;

pub trait FromVec<V, R> {
    fn from_vec(vec: V) -> R;
}

impl FromVec<&Descriptor, Vec<f32>> for Vec<f32> {
    fn from_vec(vec: &Descriptor) -> Vec<f32> {
        let mut res = Vec::with_capacity(vec.len() * DESCRIPTOR_LANES_SIZE);
        for e in vec {
            res.extend_from_slice(e.as_array_ref());
        }
        res
    }
}

impl FromVec<Vec<f32>, Descriptor> for Descriptor {
    fn from_vec(vec: Vec<f32>) -> Descriptor {
        Descriptor::from_vec(&vec)
    }
}

/// Descriptor from &Vec<f32>
///
/// The tail is zero-padded up to a whole number of lanes, which leaves L2
/// distances unchanged.
///
impl FromVec<&Vec<f32>, Descriptor> for Descriptor {
    fn from_vec(vec: &Vec<f32>) -> Descriptor {
        let mut descriptor = {
            let one_more = usize::from(vec.len() % DESCRIPTOR_LANES_SIZE > 0);
            Descriptor::with_capacity(vec.len() / DESCRIPTOR_LANES_SIZE + one_more)
        };

        let mut acc: [f32; DESCRIPTOR_LANES_SIZE] = [0.0; DESCRIPTOR_LANES_SIZE];
        let mut part = 0;
        for (counter, i) in vec.iter().enumerate() {
            part = counter % DESCRIPTOR_LANES_SIZE;
            if part == 0 {
                acc = [0.0; DESCRIPTOR_LANES_SIZE];
            }
            acc[part] = *i;
            if part == DESCRIPTOR_LANES_SIZE - 1 {
                descriptor.push(f32x8::new(acc));
            }
        }

        if part < DESCRIPTOR_LANES_SIZE - 1 {
            descriptor.push(f32x8::new(acc));
        }

        descriptor
    }
}
