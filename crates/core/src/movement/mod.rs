//! Authoritative movement resolution: input validation, speed computation,
//! spatial-grid collision push-out, and the dash/charge teleport API
//! (spec 4.6).

mod teleport;

pub use teleport::teleport;

use crate::config::GameBalance;
use crate::error::MovementError;
use crate::player::{AntiCheatVerdict, Player};
use crate::wire::{PlayerInput, Vector2};

/// Another body to push out of: its position and the combined collision
/// radius (`PlayerCollisionRadius + MobCollisionRadius`, etc).
#[derive(Debug, Clone, Copy)]
pub struct CollisionNeighbor {
    pub position: Vector2,
    pub combined_radius: f32,
}

/// Resolves one player input into an authoritative position/velocity update.
/// Returns `Ok(true)` if the player moved, `Ok(false)` for a legitimate
/// no-op (dead, casting, zero input), or `Err` if anti-cheat rejected it.
pub fn resolve(
    player: &mut Player,
    input: &PlayerInput,
    dt: f32,
    balance: &GameBalance,
    bounds_min: Vector2,
    bounds_max: Vector2,
    neighbors: &[CollisionNeighbor],
) -> Result<bool, MovementError> {
    if !player.alive || player.is_casting {
        return Ok(false);
    }
    if input.move_input.magnitude() > balance.max_input_magnitude {
        return Err(MovementError::Rejected);
    }
    if input.move_input.magnitude() < f32::EPSILON {
        player.velocity = Vector2::ZERO;
        player.is_moving = false;
        return Ok(false);
    }

    let sprinting = input.is_sprinting && player.mana > 0.0;
    let mut speed =
        balance.movement_speed * player.class.speed_modifier() * player.status.speed_modifier();
    if sprinting {
        speed *= balance.sprint_multiplier;
        player.mana = (player.mana - balance.mana_per_sprint_second * dt).max(0.0);
    }

    let direction = input.move_input.normalized();
    let mut proposed = player.position + direction * (speed * dt);

    let out_of_bounds = proposed.0 < bounds_min.0
        || proposed.0 > bounds_max.0
        || proposed.1 < bounds_min.1
        || proposed.1 > bounds_max.1;
    if out_of_bounds {
        proposed.0 = proposed.0.clamp(bounds_min.0, bounds_max.0);
        proposed.1 = proposed.1.clamp(bounds_min.1, bounds_max.1);
    } else {
        for neighbor in neighbors {
            let delta = proposed - neighbor.position;
            let dist = delta.magnitude();
            if dist < neighbor.combined_radius && dist > f32::EPSILON {
                let penetration = neighbor.combined_radius - dist;
                proposed = proposed + delta * (1.0 / dist) * penetration;
            }
        }
    }

    if let AntiCheatVerdict::Reject = player.anticheat.evaluate(proposed, speed, dt) {
        return Err(MovementError::Rejected);
    }

    player.position = proposed;
    player.velocity = if out_of_bounds {
        Vector2::ZERO
    } else {
        direction * speed
    };
    player.aim_direction = input.aim_direction;
    player.is_moving = true;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Class;

    fn input(move_input: Vector2) -> PlayerInput {
        PlayerInput {
            sequence_number: 1,
            ack_sequence_number: 0,
            client_timestamp: 0.0,
            move_input,
            is_sprinting: false,
            aim_direction: 0.0,
            is_attacking: false,
            ability_type: None,
            ability_target: Vector2::ZERO,
        }
    }

    #[test]
    fn moves_in_input_direction() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        let balance = GameBalance::default();
        let moved = resolve(
            &mut player,
            &input(Vector2(1.0, 0.0)),
            1.0 / 60.0,
            &balance,
            Vector2(-100.0, -100.0),
            Vector2(100.0, 100.0),
            &[],
        )
        .unwrap();
        assert!(moved);
        assert!(player.position.0 > 0.0);
    }

    #[test]
    fn oversized_input_is_rejected() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        let balance = GameBalance::default();
        let result = resolve(
            &mut player,
            &input(Vector2(5.0, 5.0)),
            1.0 / 60.0,
            &balance,
            Vector2(-100.0, -100.0),
            Vector2(100.0, 100.0),
            &[],
        );
        assert_eq!(result.unwrap_err(), MovementError::Rejected);
    }

    #[test]
    fn out_of_bounds_position_is_clamped_and_zeroes_velocity() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        player.position = Vector2(9.99, 0.0);
        let balance = GameBalance::default();
        resolve(
            &mut player,
            &input(Vector2(1.0, 0.0)),
            1.0,
            &balance,
            Vector2(-10.0, -10.0),
            Vector2(10.0, 10.0),
            &[],
        )
        .unwrap();
        assert_eq!(player.position.0, 10.0);
        assert_eq!(player.velocity, Vector2::ZERO);
    }

    #[test]
    fn dead_player_does_not_move() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        player.alive = false;
        let balance = GameBalance::default();
        let moved = resolve(
            &mut player,
            &input(Vector2(1.0, 0.0)),
            1.0 / 60.0,
            &balance,
            Vector2(-100.0, -100.0),
            Vector2(100.0, 100.0),
            &[],
        )
        .unwrap();
        assert!(!moved);
    }

    #[test]
    fn collision_pushes_out_of_overlapping_neighbor() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        player.position = Vector2(0.0, 0.0);
        let balance = GameBalance::default();
        let neighbors = [CollisionNeighbor {
            position: Vector2(0.2, 0.0),
            combined_radius: 1.0,
        }];
        resolve(
            &mut player,
            &input(Vector2(1.0, 0.0)),
            1.0 / 60.0,
            &balance,
            Vector2(-100.0, -100.0),
            Vector2(100.0, 100.0),
            &neighbors,
        )
        .unwrap();
        assert!(player.position.distance(neighbors[0].position) >= 1.0 - 1e-4);
    }
}
