use rand::seq::index::sample;
use rand::Rng;

use crate::dna::{Candidate, MutationKind, Shape};
use crate::mutation_config::{MutationProfile, Mutator};

impl Mutator {
    /// Clone `current` and apply exactly one local edit, chosen from this variant's
    /// weight table. The clone's divergence is stale until it is evaluated.
    pub fn mutate<R: Rng>(&self, rng: &mut R, current: &Candidate, width: u32, height: u32) -> Candidate {
        profiling::scope!("Mutator::mutate");
        let profile = self.profile(width, height);
        let kind = profile.kind_for_roll(rng.random_range(0..profile.total_weight()));
        let mut next = current.clone();
        apply_mutation(rng, &mut next, kind, &profile, width, height);
        next
    }
}

/// apply one edit of `kind` in place and tag the candidate with it
pub fn apply_mutation<R: Rng>(
    rng: &mut R,
    candidate: &mut Candidate,
    kind: MutationKind,
    profile: &MutationProfile,
    width: u32,
    height: u32,
) {
    profiling::scope!("apply_mutation");
    candidate.last_mutation = Some(kind);
    if candidate.shapes.is_empty() {
        return;
    }

    let idx = rng.random_range(0..candidate.shapes.len());
    match kind {
        MutationKind::ReplaceShape => {
            let vertices = candidate.shapes[idx].points.len();
            candidate.shapes[idx] = random_shape(rng, vertices, width, height);
        }
        MutationKind::ReplaceColor => {
            candidate.shapes[idx].rgba = random_color(rng);
        }
        MutationKind::ReplacePoint => {
            let shape = &mut candidate.shapes[idx];
            let v = rng.random_range(0..shape.points.len());
            shape.points[v] = random_point(rng, width, height);
        }
        MutationKind::ReplacePoints => {
            let shape = &mut candidate.shapes[idx];
            for v in random_subset(rng, shape.points.len()) {
                shape.points[v] = random_point(rng, width, height);
            }
        }
        MutationKind::AdjustColor => {
            let shape = &mut candidate.shapes[idx];
            for channel in &mut shape.rgba {
                *channel = adjust_channel(rng, *channel, profile.color_jitter);
            }
        }
        MutationKind::AdjustPoint => {
            let shape = &mut candidate.shapes[idx];
            let v = rng.random_range(0..shape.points.len());
            shape.points[v] = adjust_point(rng, shape.points[v], profile.point_jitter, width, height);
        }
        MutationKind::AdjustPoints => {
            let shape = &mut candidate.shapes[idx];
            for v in random_subset(rng, shape.points.len()) {
                shape.points[v] = adjust_point(rng, shape.points[v], profile.point_jitter, width, height);
            }
        }
        MutationKind::SwapShapes => {
            let len = candidate.shapes.len();
            if len > 1 {
                // pick a second, distinct position
                let mut other = rng.random_range(0..len - 1);
                if other >= idx {
                    other += 1;
                }
                candidate.shapes.swap(idx, other);
            }
        }
    }
}

/// uniformly random point in [0,width)x[0,height)
#[inline]
pub fn random_point<R: Rng>(rng: &mut R, width: u32, height: u32) -> (u32, u32) {
    (rng.random_range(0..width), rng.random_range(0..height))
}

#[inline]
pub fn random_color<R: Rng>(rng: &mut R) -> [u8; 4] {
    rng.random()
}

/// random shape with `vertices` points, used for fresh replacements
pub fn random_shape<R: Rng>(rng: &mut R, vertices: usize, width: u32, height: u32) -> Shape {
    let points = (0..vertices).map(|_| random_point(rng, width, height)).collect();
    Shape::new(points, random_color(rng))
}

/// distinct vertex indices, between 1 and `len` of them
fn random_subset<R: Rng>(rng: &mut R, len: usize) -> Vec<usize> {
    let amount = rng.random_range(1..=len);
    sample(rng, len, amount).into_vec()
}

/// move `value` by a uniform offset in [-jitter, jitter], clamped into [0, limit)
#[inline]
pub fn jitter_coord<R: Rng>(rng: &mut R, value: u32, jitter: u32, limit: u32) -> u32 {
    let j = jitter as i64;
    let moved = value as i64 + rng.random_range(-j..=j);
    moved.clamp(0, limit as i64 - 1) as u32
}

/// jitter both coordinates of a point, keeping it on the canvas
#[inline]
pub fn adjust_point<R: Rng>(rng: &mut R, point: (u32, u32), jitter: u32, width: u32, height: u32) -> (u32, u32) {
    (
        jitter_coord(rng, point.0, jitter, width),
        jitter_coord(rng, point.1, jitter, height),
    )
}

/// jitter one color channel, clamped into [0,255]
#[inline]
pub fn adjust_channel<R: Rng>(rng: &mut R, value: u8, jitter: u8) -> u8 {
    let j = jitter as i16;
    (value as i16 + rng.random_range(-j..=j)).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializer::Initializer;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn start(rng: &mut Pcg32, shapes: usize, vertices: usize) -> Candidate {
        Initializer::Segmented { rgba: [10, 20, 30, 200] }.initialize(rng, shapes, vertices, 100, 80)
    }

    /// number of positions where two shape lists differ
    fn differing_shapes(a: &Candidate, b: &Candidate) -> usize {
        a.shapes.iter().zip(&b.shapes).filter(|(x, y)| x != y).count()
    }

    #[test]
    fn test_clamping_at_origin_with_huge_jitter() {
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..10_000 {
            let (x, y) = adjust_point(&mut rng, (0, 0), 500, 100, 100);
            assert!(x <= 99 && y <= 99);
        }
    }

    #[test]
    fn test_channel_clamping() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut saw_floor = false;
        let mut saw_ceiling = false;
        for _ in 0..2_000 {
            saw_floor |= adjust_channel(&mut rng, 3, 255) == 0;
            saw_ceiling |= adjust_channel(&mut rng, 250, 255) == 255;
        }
        assert!(saw_floor && saw_ceiling);
    }

    #[test]
    fn test_mutate_leaves_source_untouched_and_tags_result() {
        let mut rng = Pcg32::seed_from_u64(11);
        let original = start(&mut rng, 12, 4);
        let snapshot = original.clone();
        for m in [Mutator::Harder, Mutator::Hard, Mutator::Medium, Mutator::Soft { divisor: 10 }, Mutator::Soft { divisor: 2 }] {
            for _ in 0..200 {
                let next = m.mutate(&mut rng, &original, 100, 80);
                assert!(next.last_mutation.is_some());
                assert_eq!(next.shapes.len(), 12);
                assert!(next.shapes.iter().all(|s| s.points.len() == 4 && s.within(100, 80)));
            }
        }
        assert!(original.same_shapes(&snapshot));
    }

    #[test]
    fn test_single_edits_touch_one_shape() {
        let mut rng = Pcg32::seed_from_u64(3);
        let original = start(&mut rng, 8, 5);
        let profile = Mutator::Medium.profile(100, 80);
        for kind in MutationKind::ALL {
            if kind == MutationKind::SwapShapes {
                continue;
            }
            for _ in 0..50 {
                let mut next = original.clone();
                apply_mutation(&mut rng, &mut next, kind, &profile, 100, 80);
                assert!(differing_shapes(&original, &next) <= 1, "{kind}");
                assert_eq!(next.last_mutation, Some(kind));
            }
        }
    }

    #[test]
    fn test_swap_reorders_without_changing_geometry() {
        let mut rng = Pcg32::seed_from_u64(21);
        let original = start(&mut rng, 6, 3);
        let profile = Mutator::Hard.profile(100, 80);
        for _ in 0..50 {
            let mut next = original.clone();
            apply_mutation(&mut rng, &mut next, MutationKind::SwapShapes, &profile, 100, 80);
            assert_eq!(differing_shapes(&original, &next), 2);

            let mut a = original.shapes.clone();
            let mut b = next.shapes.clone();
            a.sort_by(|x, y| x.points.cmp(&y.points));
            b.sort_by(|x, y| x.points.cmp(&y.points));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_swap_with_single_shape_is_noop() {
        let mut rng = Pcg32::seed_from_u64(2);
        let original = start(&mut rng, 1, 3);
        let mut next = original.clone();
        apply_mutation(&mut rng, &mut next, MutationKind::SwapShapes, &Mutator::Hard.profile(100, 80), 100, 80);
        assert!(next.same_shapes(&original));
        assert_eq!(next.last_mutation, Some(MutationKind::SwapShapes));
    }

    #[test]
    fn test_random_shape_in_bounds() {
        let mut rng = Pcg32::seed_from_u64(8);
        let s = random_shape(&mut rng, 6, 7, 3);
        assert_eq!(s.points.len(), 6);
        assert!(s.within(7, 3));
    }

    proptest! {
        #[test]
        fn prop_adjusted_points_stay_on_canvas(
            seed in any::<u64>(),
            x in 0u32..1000,
            y in 0u32..1000,
            jitter in 0u32..5000,
            width in 1u32..1000,
            height in 1u32..1000,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let (x, y) = (x % width, y % height);
            let (nx, ny) = adjust_point(&mut rng, (x, y), jitter, width, height);
            prop_assert!(nx < width && ny < height);
        }
    }
}
