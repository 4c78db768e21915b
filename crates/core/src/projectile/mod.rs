//! Skillshot stepping and lag-compensated hit detection via position
//! history rewind (spec 4.8).

mod history;
mod preset;

pub use history::PositionHistory;
pub use preset::ProjectilePreset;

use std::time::Instant;

use crate::player::StatusEffect;
use crate::wire::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageType {
    Physical,
    Magical,
    True,
}

pub struct Projectile {
    pub id: u64,
    pub owner_id: u32,
    pub team_id: u8,
    pub position: Vector2,
    pub direction: Vector2,
    pub speed: f32,
    pub max_range: f32,
    pub traveled: f32,
    pub radius: f32,
    pub damage: f32,
    pub damage_type: DamageType,
    pub pierce: bool,
    pub max_pierce_count: u32,
    pub hit_targets: Vec<u32>,
    pub status_effect: Option<StatusEffect>,
    pub client_timestamp: f32,
    pub spawned_at: Instant,
    pub max_lifetime_secs: f32,
}

impl Projectile {
    pub fn from_preset(
        id: u64,
        owner_id: u32,
        team_id: u8,
        position: Vector2,
        direction: Vector2,
        client_timestamp: f32,
        preset: ProjectilePreset,
    ) -> Self {
        Self {
            id,
            owner_id,
            team_id,
            position,
            direction: direction.normalized(),
            speed: preset.speed,
            max_range: preset.max_range,
            traveled: 0.0,
            radius: preset.radius,
            damage: preset.damage,
            damage_type: preset.damage_type,
            pierce: preset.pierce,
            max_pierce_count: preset.max_pierce_count,
            hit_targets: Vec::new(),
            status_effect: None,
            client_timestamp,
            spawned_at: Instant::now(),
            max_lifetime_secs: preset.max_lifetime_secs,
        }
    }

    pub fn step(&mut self, dt: f32) {
        self.position = self.position + self.direction * (self.speed * dt);
        self.traveled += self.speed * dt;
    }

    pub fn is_expired(&self) -> bool {
        self.traveled >= self.max_range
            || self.spawned_at.elapsed().as_secs_f32() >= self.max_lifetime_secs
    }

    pub fn has_hit(&self, player_id: u32) -> bool {
        self.hit_targets.contains(&player_id)
    }

    /// Range-based falloff past 80% of max range, per spec 4.8.
    pub fn damage_with_falloff(&self) -> f32 {
        let fraction = self.traveled / self.max_range;
        if fraction > 0.8 {
            let falloff = 1.0 - (fraction - 0.8) / 0.2 * 0.5;
            self.damage * falloff.max(0.5)
        } else {
            self.damage
        }
    }

    pub fn record_hit(&mut self, player_id: u32) -> bool {
        self.hit_targets.push(player_id);
        !self.pierce || self.hit_targets.len() as u32 >= self.max_pierce_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_max_range() {
        let mut p = Projectile::from_preset(
            1,
            1,
            0,
            Vector2::ZERO,
            Vector2(1.0, 0.0),
            0.0,
            ProjectilePreset::arrow(),
        );
        for _ in 0..10_000 {
            if p.is_expired() {
                break;
            }
            p.step(0.1);
        }
        assert!(p.is_expired());
    }

    #[test]
    fn non_piercing_destroyed_after_first_hit() {
        let mut p = Projectile::from_preset(
            1,
            1,
            0,
            Vector2::ZERO,
            Vector2(1.0, 0.0),
            0.0,
            ProjectilePreset::arrow(),
        );
        assert!(p.record_hit(2));
    }

    #[test]
    fn piercing_survives_until_max_pierce_count() {
        let mut p = Projectile::from_preset(
            1,
            1,
            0,
            Vector2::ZERO,
            Vector2(1.0, 0.0),
            0.0,
            ProjectilePreset::piercing_arrow(),
        );
        assert!(!p.record_hit(2));
        assert!(p.record_hit(3));
    }
}
