use crate::descriptor::Descriptor;
use crate::distance::euclidean;
use log::debug;

/// Correspondence between a descriptor of the previous (baseline) set and one
/// of the current set, with their L2 distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DescriptorMatch {
    pub previous: usize,
    pub current: usize,
    pub distance: f32,
}

/// One-way nearest-neighbor matcher under L2 distance.
///
/// For every baseline descriptor exactly one candidate is considered - the
/// single closest current descriptor - and the pair survives only when its
/// distance is strictly below the threshold. No ratio test and no mutual
/// cross-check are applied.
#[derive(Clone, Copy, Debug)]
pub struct DescriptorMatcher {
    threshold: f32,
}

impl DescriptorMatcher {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn match_sets(&self, previous: &[Descriptor], current: &[Descriptor]) -> Vec<DescriptorMatch> {
        let mut matches = Vec::with_capacity(previous.len());
        for (pi, pd) in previous.iter().enumerate() {
            let nearest = current
                .iter()
                .enumerate()
                .map(|(ci, cd)| (ci, euclidean(pd, cd)))
                .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap());
            if let Some((ci, distance)) = nearest {
                if distance < self.threshold {
                    matches.push(DescriptorMatch {
                        previous: pi,
                        current: ci,
                        distance,
                    });
                }
            }
        }
        debug!(
            "{} of {} baseline descriptors survived matching",
            matches.len(),
            previous.len()
        );
        matches
    }
}

#[cfg(test)]
mod tests {
    use crate::descriptor::{Descriptor, FromVec};
    use crate::matching::DescriptorMatcher;
    use crate::EPS;

    fn descriptors(vals: &[f32]) -> Vec<Descriptor> {
        vals.iter()
            .map(|v| Descriptor::from_vec(vec![*v, 0.0, 0.0]))
            .collect()
    }

    #[test]
    fn picks_the_nearest_neighbor() {
        let prev = descriptors(&[0.0, 10.0]);
        let curr = descriptors(&[9.0, 1.0, 5.0]);
        let m = DescriptorMatcher::new(100.0).match_sets(&prev, &curr);
        assert_eq!(m.len(), 2);
        assert_eq!((m[0].previous, m[0].current), (0, 1));
        assert_eq!((m[1].previous, m[1].current), (1, 0));
    }

    #[test]
    fn threshold_is_strict() {
        let prev = descriptors(&[0.0]);
        let curr = descriptors(&[3.0]);
        assert!(DescriptorMatcher::new(3.0).match_sets(&prev, &curr).is_empty());
        assert_eq!(DescriptorMatcher::new(3.1).match_sets(&prev, &curr).len(), 1);
    }

    #[test]
    fn identical_sets_match_at_zero_distance() {
        let prev = descriptors(&[1.0, 2.0, 3.0]);
        let m = DescriptorMatcher::new(0.001).match_sets(&prev, &prev.clone());
        assert_eq!(m.len(), 3);
        for (i, mm) in m.iter().enumerate() {
            assert_eq!(mm.previous, i);
            assert_eq!(mm.current, i);
            assert!(mm.distance.abs() < EPS);
        }
    }

    #[test]
    fn empty_current_set_matches_nothing() {
        let prev = descriptors(&[1.0]);
        assert!(DescriptorMatcher::new(10.0).match_sets(&prev, &[]).is_empty());
    }
}
