use super::CollisionNeighbor;
use crate::error::MovementError;
use crate::wire::Vector2;

const SPIRAL_STEP: f32 = 0.5;
const SPIRAL_MAX_RINGS: u32 = 12;

/// Validates and resolves a dash/charge-style teleport request: bounded by
/// `max_distance`, clamped to world bounds, and nudged off any overlapping
/// neighbor via an expanding spiral search (spec 4.6).
pub fn teleport(
    from: Vector2,
    target: Vector2,
    max_distance: f32,
    bounds_min: Vector2,
    bounds_max: Vector2,
    neighbors: &[CollisionNeighbor],
) -> Result<Vector2, MovementError> {
    if from.distance(target) > max_distance {
        return Err(MovementError::Rejected);
    }
    if target.0 < bounds_min.0
        || target.0 > bounds_max.0
        || target.1 < bounds_min.1
        || target.1 > bounds_max.1
    {
        return Err(MovementError::OutOfBounds);
    }

    if !blocked(target, neighbors) {
        return Ok(target);
    }

    for ring in 1..=SPIRAL_MAX_RINGS {
        let radius = ring as f32 * SPIRAL_STEP;
        let samples = 8 * ring;
        for i in 0..samples {
            let angle = (i as f32 / samples as f32) * std::f32::consts::TAU;
            let candidate = target + Vector2(angle.cos(), angle.sin()) * radius;
            if candidate.0 < bounds_min.0
                || candidate.0 > bounds_max.0
                || candidate.1 < bounds_min.1
                || candidate.1 > bounds_max.1
            {
                continue;
            }
            if !blocked(candidate, neighbors) {
                return Ok(candidate);
            }
        }
    }

    Err(MovementError::Blocked)
}

fn blocked(position: Vector2, neighbors: &[CollisionNeighbor]) -> bool {
    neighbors
        .iter()
        .any(|n| position.distance(n.position) < n.combined_radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeds_within_max_distance_and_clear_of_neighbors() {
        let result = teleport(
            Vector2::ZERO,
            Vector2(5.0, 0.0),
            8.0,
            Vector2(-100.0, -100.0),
            Vector2(100.0, 100.0),
            &[],
        );
        assert_eq!(result, Ok(Vector2(5.0, 0.0)));
    }

    #[test]
    fn rejects_beyond_max_distance() {
        let result = teleport(
            Vector2::ZERO,
            Vector2(50.0, 0.0),
            8.0,
            Vector2(-100.0, -100.0),
            Vector2(100.0, 100.0),
            &[],
        );
        assert_eq!(result, Err(MovementError::Rejected));
    }

    #[test]
    fn resolves_blocked_destination_via_spiral_search() {
        let neighbors = [CollisionNeighbor {
            position: Vector2(5.0, 0.0),
            combined_radius: 1.0,
        }];
        let result = teleport(
            Vector2::ZERO,
            Vector2(5.0, 0.0),
            8.0,
            Vector2(-100.0, -100.0),
            Vector2(100.0, 100.0),
            &neighbors,
        )
        .unwrap();
        assert!(result.distance(neighbors[0].position) >= 1.0 - 1e-4);
    }
}
