mod class;
mod status;

pub use class::Class;
pub use status::{StatusEffect, StatusEffects, StatusKind};

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::wire::{PlayerStateUpdate, Vector2};

const ANTICHEAT_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy)]
struct PositionSample {
    position: Vector2,
    at: Instant,
}

/// Sliding-window speed/teleport anti-cheat tracker (spec 4.6).
#[derive(Debug, Default)]
pub struct AntiCheat {
    samples: VecDeque<PositionSample>,
    suspicion: u32,
    valid_streak: u32,
}

pub enum AntiCheatVerdict {
    Ok,
    Suspicious,
    Reject,
}

impl AntiCheat {
    pub fn evaluate(&mut self, position: Vector2, max_speed: f32, dt: f32) -> AntiCheatVerdict {
        let now = Instant::now();
        let verdict = if let Some(last) = self.samples.back() {
            let dist = position.distance(last.position);
            let elapsed = now.duration_since(last.at).as_secs_f32().max(dt);
            let speed = dist / elapsed;

            if dist > 2.0 * max_speed * elapsed {
                AntiCheatVerdict::Reject
            } else if speed > max_speed * 1.5 {
                AntiCheatVerdict::Reject
            } else if speed > max_speed * 1.2 {
                AntiCheatVerdict::Suspicious
            } else {
                AntiCheatVerdict::Ok
            }
        } else {
            AntiCheatVerdict::Ok
        };

        match verdict {
            AntiCheatVerdict::Reject => {
                self.suspicion += 2;
                self.valid_streak = 0;
                return AntiCheatVerdict::Reject;
            }
            AntiCheatVerdict::Suspicious => {
                self.suspicion += 1;
                self.valid_streak = 0;
            }
            AntiCheatVerdict::Ok => {
                self.valid_streak += 1;
                if self.valid_streak >= 5 {
                    self.suspicion = self.suspicion.saturating_sub(1);
                }
            }
        }

        if self.samples.len() >= ANTICHEAT_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(PositionSample { position, at: now });
        verdict
    }

    pub fn suspicion(&self) -> u32 {
        self.suspicion
    }
}

/// Authoritative player record owned exclusively by its world (spec 3).
pub struct Player {
    pub id: u32,
    pub name: String,
    pub team_id: u8,
    pub class: Class,
    pub position: Vector2,
    pub velocity: Vector2,
    pub aim_direction: f32,
    pub alive: bool,
    pub health: f32,
    pub max_health: f32,
    pub mana: f32,
    pub max_mana: f32,
    pub shield: f32,
    pub max_shield: f32,
    pub room_id: (i32, i32),
    pub inventory: Vec<u64>,
    pub max_inventory: usize,
    pub status: StatusEffects,
    pub ability_cooldowns: HashMap<&'static str, Instant>,
    pub anticheat: AntiCheat,
    pub is_casting: bool,
    pub is_moving: bool,
    pub died_at: Option<Instant>,
    pub attack_ready_at: Instant,
    force_next_snapshot: bool,
    last_sent: Option<PlayerStateUpdate>,
}

impl Player {
    pub fn new(id: u32, name: String, team_id: u8, class: Class, base_health: f32) -> Self {
        let now = Instant::now();
        Self {
            id,
            name,
            team_id,
            class,
            position: Vector2::ZERO,
            velocity: Vector2::ZERO,
            aim_direction: 0.0,
            alive: true,
            health: base_health,
            max_health: base_health,
            mana: 50.0,
            max_mana: 50.0,
            shield: 0.0,
            max_shield: 50.0,
            room_id: (0, 0),
            inventory: Vec::new(),
            max_inventory: 20,
            status: StatusEffects::default(),
            ability_cooldowns: HashMap::new(),
            anticheat: AntiCheat::default(),
            is_casting: false,
            is_moving: false,
            died_at: None,
            attack_ready_at: now,
            force_next_snapshot: true,
            last_sent: None,
        }
    }

    pub fn is_ability_ready(&self, ability: &str, now: Instant) -> bool {
        self.ability_cooldowns
            .get(ability)
            .is_none_or(|ready_at| now >= *ready_at)
    }

    pub fn set_cooldown(&mut self, ability: &'static str, duration: Duration, now: Instant) {
        self.ability_cooldowns.insert(ability, now + duration);
    }

    pub fn inventory_full(&self) -> bool {
        self.inventory.len() >= self.max_inventory
    }

    /// Clamps health into `[0, max_health]` and keeps `alive` in sync,
    /// returning `true` if this call was the killing blow (spec 3, 4.7).
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if amount <= 0.0 || !self.alive {
            return false;
        }
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let remaining = amount - absorbed;
        self.health = (self.health - remaining).clamp(0.0, self.max_health);

        if self.health <= 0.0 && self.alive {
            self.alive = false;
            self.died_at = Some(Instant::now());
            self.force_next_snapshot = true;
            return true;
        }
        false
    }

    pub fn heal(&mut self, amount: f32) {
        if self.alive {
            self.health = (self.health + amount).clamp(0.0, self.max_health);
        }
    }

    pub fn mark_dirty(&mut self) {
        self.force_next_snapshot = true;
    }

    /// `HasSignificantChange()` delta policy from spec 4.13.
    pub fn has_significant_change(&self) -> bool {
        if self.force_next_snapshot {
            return true;
        }
        let Some(last) = &self.last_sent else {
            return true;
        };
        if self.position.distance(last.position) > 0.01 {
            return true;
        }
        if self.velocity.distance(last.velocity) > 0.01 {
            return true;
        }
        if (self.aim_direction - last.aim_direction).abs() > 0.5_f32.to_radians() {
            return true;
        }
        self.health != last.health
            || self.alive != last.alive
            || self.is_moving != last.is_moving
            || self.is_casting != last.is_casting
            || self.max_health != last.max_health
    }

    pub fn to_state_update(&self) -> PlayerStateUpdate {
        PlayerStateUpdate {
            player_id: self.id,
            position: self.position,
            velocity: self.velocity,
            aim_direction: self.aim_direction,
            health: self.health,
            max_health: self.max_health,
            mana: self.mana,
            shield: self.shield,
            alive: self.alive,
            is_moving: self.is_moving,
            is_casting: self.is_casting,
            room_id: self.room_id,
        }
    }

    /// Records the just-sent snapshot as the new delta baseline.
    pub fn commit_sent(&mut self) {
        self.last_sent = Some(self.to_state_update());
        self.force_next_snapshot = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_clamps_and_flips_alive() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        assert!(!player.apply_damage(40.0));
        assert_eq!(player.health, 60.0);
        assert!(player.apply_damage(1000.0));
        assert_eq!(player.health, 0.0);
        assert!(!player.alive);
    }

    #[test]
    fn shield_absorbs_before_health() {
        let mut player = Player::new(1, "a".into(), 0, Class::Tank, 100.0);
        player.shield = 30.0;
        player.apply_damage(20.0);
        assert_eq!(player.shield, 10.0);
        assert_eq!(player.health, 100.0);
    }

    #[test]
    fn first_snapshot_is_always_significant() {
        let player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        assert!(player.has_significant_change());
    }

    #[test]
    fn unchanged_state_is_not_significant_after_commit() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        player.commit_sent();
        assert!(!player.has_significant_change());
    }

    #[test]
    fn anticheat_rejects_teleport() {
        let mut ac = AntiCheat::default();
        ac.evaluate(Vector2(0.0, 0.0), 5.0, 1.0 / 60.0);
        let verdict = ac.evaluate(Vector2(1000.0, 0.0), 5.0, 1.0 / 60.0);
        assert!(matches!(verdict, AntiCheatVerdict::Reject));
    }
}
