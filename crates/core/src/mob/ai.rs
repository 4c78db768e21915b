use std::time::{Duration, Instant};

use super::{Mob, MobState};
use crate::event::GameEvent;
use crate::wire::Vector2;

/// A candidate target visible to the AI step.
pub struct VisiblePlayer {
    pub player_id: u32,
    pub position: Vector2,
    pub class: &'static str,
}

/// Runs one AI state-machine step for `mob`, given the players currently in
/// its room, and returns an event if its state changed (spec 4.10).
pub fn step(mob: &mut Mob, visible: &[VisiblePlayer], dt: Duration) -> Option<GameEvent> {
    let previous_state = mob.state;

    if mob.state == MobState::Dead {
        return None;
    }

    let health_fraction = mob.health_fraction();
    let nearest = nearest_target(mob, visible);

    if health_fraction < mob.kind.flee_threshold()
        && !matches!(mob.state, MobState::Fleeing | MobState::Enraged)
    {
        if matches!(mob.kind, super::MobKind::Boss) {
            mob.state = MobState::Enraged;
            mob.enraged = true;
        } else {
            mob.state = MobState::Fleeing;
        }
    } else {
        match mob.state {
            MobState::Spawning => mob.state = MobState::Idle,
            MobState::Idle | MobState::Patrol | MobState::Guarding => {
                if let Some(target) = nearest {
                    if target.1 <= mob.kind.detection_range() {
                        mob.state = MobState::Alert;
                        mob.target_player = Some(target.0.player_id);
                    } else {
                        mob.state = MobState::Patrol;
                        advance_patrol(mob, dt);
                    }
                }
            }
            MobState::Alert => {
                if mob.target_player.is_some() {
                    mob.state = MobState::Pursuing;
                }
            }
            MobState::Pursuing => {
                if let Some((target, distance)) = nearest {
                    mob.target_player = Some(target.player_id);
                    if distance <= mob.kind.attack_range()
                        && Instant::now() >= mob.attack_ready_at
                    {
                        mob.state = MobState::Attacking;
                    } else {
                        pursue(mob, target.position, dt);
                    }
                } else {
                    mob.state = MobState::Idle;
                    mob.target_player = None;
                }
            }
            MobState::Attacking => {
                mob.state = MobState::Pursuing;
            }
            MobState::Fleeing => {
                if health_fraction >= mob.kind.flee_threshold() * 1.5 {
                    mob.state = MobState::Idle;
                } else if let Some((target, _)) = nearest {
                    flee_from(mob, target.position, dt);
                }
            }
            MobState::Enraged => {
                if let Some((target, _)) = nearest {
                    mob.target_player = Some(target.player_id);
                    pursue(mob, target.position, dt);
                }
            }
            MobState::Stunned | MobState::Casting | MobState::Dead => {}
        }
    }

    if mob.state != previous_state {
        Some(GameEvent::MobStateChanged {
            mob_id: mob.id,
            state: format!("{:?}", mob.state),
        })
    } else {
        None
    }
}

fn nearest_target<'a>(
    mob: &Mob,
    visible: &'a [VisiblePlayer],
) -> Option<(&'a VisiblePlayer, f32)> {
    visible
        .iter()
        .map(|p| (p, mob.position.distance(p.position)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

const MOB_SPEED: f32 = 3.0;

fn pursue(mob: &mut Mob, target: Vector2, dt: Duration) {
    let direction = (target - mob.position).normalized();
    mob.position = mob.position + direction * (MOB_SPEED * dt.as_secs_f32());
}

fn flee_from(mob: &mut Mob, threat: Vector2, dt: Duration) {
    let direction = (mob.position - threat).normalized();
    mob.position = mob.position + direction * (MOB_SPEED * dt.as_secs_f32());
}

fn advance_patrol(mob: &mut Mob, dt: Duration) {
    let direction = (mob.patrol_target - mob.position).normalized();
    if mob.position.distance(mob.patrol_target) < 0.5 {
        return;
    }
    mob.position = mob.position + direction * (MOB_SPEED * 0.5 * dt.as_secs_f32());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mob::MobKind;

    #[test]
    fn idle_mob_alerts_when_player_enters_detection_range() {
        let mut mob = Mob::new(1, MobKind::Grunt, Vector2::ZERO, (0, 0));
        mob.state = MobState::Idle;
        let visible = vec![VisiblePlayer {
            player_id: 1,
            position: Vector2(5.0, 0.0),
            class: "Scout",
        }];
        step(&mut mob, &visible, Duration::from_millis(16));
        assert_eq!(mob.state, MobState::Alert);
    }

    #[test]
    fn low_health_mob_flees() {
        let mut mob = Mob::new(1, MobKind::Grunt, Vector2::ZERO, (0, 0));
        mob.state = MobState::Pursuing;
        mob.health = mob.max_health * 0.1;
        step(&mut mob, &[], Duration::from_millis(16));
        assert_eq!(mob.state, MobState::Fleeing);
    }

    #[test]
    fn low_health_boss_enrages_instead_of_fleeing() {
        let mut mob = Mob::new(1, MobKind::Boss, Vector2::ZERO, (0, 0));
        mob.state = MobState::Pursuing;
        mob.health = mob.max_health * 0.1;
        step(&mut mob, &[], Duration::from_millis(16));
        assert_eq!(mob.state, MobState::Enraged);
        assert!(mob.enraged);
    }
}
