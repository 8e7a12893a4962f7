//! Bounded rejection sampling of decoration positions

use glam::Vec2;
use rand::Rng;

use super::ScatterCategory;

/// Where a decoration landed on the ground plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// `(x, z)` on the ground plane
    pub position: Vec2,
    /// Candidates drawn, including the accepted one
    pub attempts: u32,
    /// The cap was exhausted and the last candidate was pushed out to the clearance circle
    pub fallback: bool,
}

/// Draw a position outside the category's clearance circle
///
/// Candidates are uniform in the category's square. After `max_attempts` rejections the last
/// candidate is moved radially onto the clearance circle (along +X if it sat on the origin), so
/// the clearance constraint holds for every returned placement.
pub fn place(rng: &mut impl Rng, category: &ScatterCategory) -> Placement {
    let extent = category.half_extent.max(0.0);
    let clearance = category.clearance.max(0.0);
    let max_attempts = category.max_attempts.max(1);

    let mut candidate = Vec2::ZERO;
    for attempt in 1..=max_attempts {
        candidate = Vec2::new(
            rng.gen_range(-extent..=extent),
            rng.gen_range(-extent..=extent),
        );
        if candidate.length() >= clearance {
            return Placement {
                position: candidate,
                attempts: attempt,
                fallback: false,
            };
        }
    }

    let direction = candidate.try_normalize().unwrap_or(Vec2::X);
    log::warn!(
        "No position outside r={clearance} after {max_attempts} attempts, pushing to the boundary"
    );
    Placement {
        position: onto_circle(direction, clearance),
        attempts: max_attempts,
        fallback: true,
    }
}

/// `direction * radius`, nudged outward until rounding leaves it on or outside the circle
fn onto_circle(direction: Vec2, radius: f32) -> Vec2 {
    let mut scale = radius;
    let mut position = direction * scale;
    while position.length() < radius {
        scale = scale.max(f32::MIN_POSITIVE) * (1.0 + f32::EPSILON);
        position = direction * scale;
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    #[case::trees(ScatterCategory::new(50, 25.0, 8.0))]
    #[case::bushes(ScatterCategory::new(100, 20.0, 6.0))]
    #[case::rocks(ScatterCategory::new(20, 20.0, 7.0))]
    #[case::no_clearance(ScatterCategory::new(30, 20.0, 0.0))]
    fn placements_respect_clearance(#[case] category: ScatterCategory) {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let placement = place(&mut rng, &category);
            assert!(placement.position.length() >= category.clearance);
            assert!(placement.attempts <= category.max_attempts);
        }
    }

    #[test]
    fn impossible_region_falls_back_to_the_boundary() {
        let category = ScatterCategory::new(1, 1.0, 5.0);
        let mut rng = StdRng::seed_from_u64(1);
        let placement = place(&mut rng, &category);
        assert!(placement.fallback);
        assert_eq!(placement.attempts, category.max_attempts);
        assert_relative_eq!(placement.position.length(), 5.0, epsilon = 1e-4);
        assert!(placement.position.length() >= 5.0);
    }

    #[rstest]
    #[case(1.5)]
    #[case(2.3)]
    #[case(5.0)]
    #[case(7.3)]
    #[case(11.9)]
    fn fallback_never_lands_inside_the_circle(#[case] clearance: f32) {
        let category = ScatterCategory::new(1, 1.0, clearance);
        for seed in 0..2000 {
            let placement = place(&mut StdRng::seed_from_u64(seed), &category);
            assert!(placement.fallback);
            let length = placement.position.length();
            assert!(length >= clearance, "seed {seed}: {length} < {clearance}");
        }
    }

    #[test]
    fn degenerate_square_pushes_along_x() {
        let category = ScatterCategory {
            max_attempts: 3,
            ..ScatterCategory::new(1, 0.0, 2.0)
        };
        let placement = place(&mut StdRng::seed_from_u64(0), &category);
        assert!(placement.fallback);
        assert_eq!(placement.position, Vec2::new(2.0, 0.0));
    }
}
