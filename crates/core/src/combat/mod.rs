//! Melee combat resolution: target acquisition, the damage pipeline, and
//! class attack effects (spec 4.7).

mod ability;
mod damage;

pub use ability::{AbilityDef, can_cast};
pub use damage::{DamageInput, DamageOutcome, compute_damage};

use std::time::{Duration, Instant};

use rand::Rng;

use crate::config::GameBalance;
use crate::error::CombatError;
use crate::event::GameEvent;
use crate::player::{Class, Player, StatusEffect, StatusKind};
use crate::wire::Vector2;

const STEALTH_DETECTION_RANGE: f32 = 3.0;

pub(crate) fn aim_vector(angle: f32) -> Vector2 {
    Vector2(angle.cos(), angle.sin())
}

/// Players within melee range and the attacker's aim cone, excluding the
/// attacker and anyone stealthed beyond detection range (spec 4.7).
pub fn acquire_melee_targets<'a>(
    attacker: &Player,
    candidates: &'a [&'a Player],
    balance: &GameBalance,
) -> Vec<&'a Player> {
    let aim = aim_vector(attacker.aim_direction);
    candidates
        .iter()
        .copied()
        .filter(|target| {
            target.id != attacker.id
                && target.alive
                && target.room_id == attacker.room_id
                && attacker.position.distance(target.position) <= balance.melee_range
                && in_cone(attacker.position, target.position, aim, balance.melee_cone_cos)
                && (!target.status.has(StatusKind::Stealth)
                    || attacker.position.distance(target.position) <= STEALTH_DETECTION_RANGE)
        })
        .collect()
}

pub(crate) fn in_cone(from: Vector2, to: Vector2, aim: Vector2, cone_cos: f32) -> bool {
    let to_target = (to - from).normalized();
    if to_target.magnitude() < f32::EPSILON {
        return true;
    }
    to_target.0 * aim.0 + to_target.1 * aim.1 >= cone_cos
}

/// Resolves a basic melee attack against already-acquired targets: rejects
/// on cooldown/casting, otherwise applies damage and the class attack
/// effect to each target and starts the next cooldown window (spec 4.7).
pub fn attack(
    attacker: &mut Player,
    targets: &mut [&mut Player],
    balance: &GameBalance,
    now: Instant,
    rng: &mut impl Rng,
) -> Result<Vec<GameEvent>, CombatError> {
    if attacker.is_casting {
        return Err(CombatError::Casting);
    }
    if now < attacker.attack_ready_at {
        return Err(CombatError::OnCooldown);
    }

    let mut events = Vec::new();
    for target in targets.iter_mut() {
        let outcome = compute_damage(
            &DamageInput {
                attacker_class: attacker.class,
                weapon_damage: 0.0,
                strength: 0.0,
                damage_reduction: 0.0,
            },
            rng,
        );
        let killed = target.apply_damage(outcome.amount);
        apply_class_effect(attacker.class, target);

        events.push(GameEvent::MeleeHit {
            attacker_id: attacker.id,
            target_id: target.id,
            damage: outcome.amount,
            critical: outcome.critical,
        });
        if killed {
            events.push(GameEvent::PlayerDeath {
                player_id: target.id,
                killer_id: Some(attacker.id),
                position: target.position,
            });
        }
    }

    attacker.attack_ready_at = now + Duration::from_millis(balance.attack_cooldown_ms);
    Ok(events)
}

fn apply_class_effect(class: Class, target: &mut Player) {
    match class {
        Class::Tank => target
            .status
            .apply(StatusEffect::new(StatusKind::Slow, 0.3, Duration::from_secs(2))),
        Class::Scout => target
            .status
            .apply(StatusEffect::new(StatusKind::Poison, 2.0, Duration::from_secs(4))),
        Class::Support => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn player_at(id: u32, class: Class, position: Vector2) -> Player {
        let mut p = Player::new(id, format!("p{id}"), 0, class, 100.0);
        p.position = position;
        p
    }

    #[test]
    fn target_behind_attacker_excluded_by_cone() {
        let mut attacker = player_at(1, Class::Scout, Vector2::ZERO);
        attacker.aim_direction = 0.0; // facing +x
        let behind = player_at(2, Class::Scout, Vector2(-1.0, 0.0));
        let balance = GameBalance::default();
        let candidates = [&behind];
        assert!(acquire_melee_targets(&attacker, &candidates, &balance).is_empty());
    }

    #[test]
    fn target_in_front_within_range_is_acquired() {
        let attacker = player_at(1, Class::Scout, Vector2::ZERO);
        let ahead = player_at(2, Class::Scout, Vector2(1.0, 0.0));
        let balance = GameBalance::default();
        let candidates = [&ahead];
        assert_eq!(acquire_melee_targets(&attacker, &candidates, &balance).len(), 1);
    }

    #[test]
    fn stealthed_target_excluded_unless_close() {
        let attacker = player_at(1, Class::Scout, Vector2::ZERO);
        let mut stealthed = player_at(2, Class::Scout, Vector2(1.0, 0.0));
        stealthed
            .status
            .apply(StatusEffect::new(StatusKind::Stealth, 1.0, Duration::from_secs(5)));
        let balance = GameBalance::default();
        let candidates = [&stealthed];
        assert!(acquire_melee_targets(&attacker, &candidates, &balance).is_empty());
    }

    #[test]
    fn cooldown_blocks_repeat_attack() {
        let mut attacker = player_at(1, Class::Tank, Vector2::ZERO);
        let balance = GameBalance::default();
        let now = Instant::now();
        let mut target = player_at(2, Class::Scout, Vector2(1.0, 0.0));
        let mut rng = StepRng::new(0, 1);

        attack(&mut attacker, &mut [&mut target], &balance, now, &mut rng).unwrap();
        let result = attack(&mut attacker, &mut [&mut target], &balance, now, &mut rng);
        assert_eq!(result.unwrap_err(), CombatError::OnCooldown);
    }

    #[test]
    fn tank_attack_applies_slow_to_target() {
        let mut attacker = player_at(1, Class::Tank, Vector2::ZERO);
        let balance = GameBalance::default();
        let now = Instant::now();
        let mut target = player_at(2, Class::Scout, Vector2(1.0, 0.0));
        let mut rng = StepRng::new(0, 1);

        attack(&mut attacker, &mut [&mut target], &balance, now, &mut rng).unwrap();
        assert!(target.status.has(StatusKind::Slow));
    }
}
