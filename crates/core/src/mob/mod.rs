//! Mob AI: state machine transitions and priority-scheduled updates
//! (spec 4.10).

mod ai;
mod state;

pub use ai::{VisiblePlayer, step};
pub use state::MobState;

use std::time::Instant;

use crate::wire::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobKind {
    Grunt,
    Archer,
    Boss,
}

impl MobKind {
    pub fn base_health(self) -> f32 {
        match self {
            MobKind::Grunt => 60.0,
            MobKind::Archer => 45.0,
            MobKind::Boss => 600.0,
        }
    }

    pub fn detection_range(self) -> f32 {
        match self {
            MobKind::Grunt => 12.0,
            MobKind::Archer => 16.0,
            MobKind::Boss => 20.0,
        }
    }

    pub fn attack_range(self) -> f32 {
        match self {
            MobKind::Grunt => 2.0,
            MobKind::Archer => 10.0,
            MobKind::Boss => 3.0,
        }
    }

    pub fn flee_threshold(self) -> f32 {
        0.2
    }

    pub fn loot_table(self) -> &'static str {
        match self {
            MobKind::Grunt => "common_grunt",
            MobKind::Archer => "common_archer",
            MobKind::Boss => "boss_guaranteed",
        }
    }
}

pub struct Mob {
    pub id: u64,
    pub kind: MobKind,
    pub position: Vector2,
    pub patrol_target: Vector2,
    pub state: MobState,
    pub health: f32,
    pub max_health: f32,
    pub room_id: (i32, i32),
    pub target_player: Option<u32>,
    pub attack_ready_at: Instant,
    pub enraged: bool,
}

impl Mob {
    pub fn new(id: u64, kind: MobKind, position: Vector2, room_id: (i32, i32)) -> Self {
        let health = kind.base_health();
        Self {
            id,
            kind,
            position,
            patrol_target: position,
            state: MobState::Idle,
            health,
            max_health: health,
            room_id,
            target_player: None,
            attack_ready_at: Instant::now(),
            enraged: false,
        }
    }

    pub fn health_fraction(&self) -> f32 {
        self.health / self.max_health
    }

    pub fn is_dead(&self) -> bool {
        matches!(self.state, MobState::Dead)
    }

    /// Applies damage, clamping at zero and transitioning to `Dead` on the
    /// killing blow (mirrors `Player::apply_damage`, spec 4.7, 4.10).
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if amount <= 0.0 || self.is_dead() {
            return false;
        }
        self.health = (self.health - amount).clamp(0.0, self.max_health);
        if self.health <= 0.0 {
            self.state = MobState::Dead;
            return true;
        }
        false
    }

    pub fn base_attack_damage(&self) -> f32 {
        match self.kind {
            MobKind::Grunt => 8.0,
            MobKind::Archer => 10.0,
            MobKind::Boss => if self.enraged { 40.0 } else { 25.0 },
        }
    }

    /// Stagger factor from spec 4.10: distance-banded update frequency so
    /// load scales with how many mobs are actually near a player.
    pub fn update_frequency(&self, nearest_player_distance: f32) -> u32 {
        if nearest_player_distance < 10.0 {
            1
        } else if nearest_player_distance < 30.0 {
            3
        } else if nearest_player_distance < 50.0 {
            6
        } else {
            30
        }
    }

    pub fn should_update_this_tick(&self, tick: u64, nearest_player_distance: f32) -> bool {
        let frequency = self.update_frequency(nearest_player_distance) as u64;
        let stagger = self.id % frequency.max(1);
        (tick + stagger) % frequency.max(1) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_mobs_update_every_tick() {
        let mob = Mob::new(1, MobKind::Grunt, Vector2::ZERO, (0, 0));
        assert_eq!(mob.update_frequency(5.0), 1);
        assert!(mob.should_update_this_tick(42, 5.0));
    }

    #[test]
    fn far_mobs_update_rarely() {
        let mob = Mob::new(1, MobKind::Grunt, Vector2::ZERO, (0, 0));
        assert_eq!(mob.update_frequency(100.0), 30);
    }
}
