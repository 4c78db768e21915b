use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Poison,
    Slow,
    Speed,
    Shield,
    Regen,
    Stealth,
    Burn,
    StrengthBoost,
}

#[derive(Debug, Clone)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub magnitude: f32,
    pub expires_at: Instant,
    last_tick: Instant,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, magnitude: f32, duration: Duration) -> Self {
        let now = Instant::now();
        Self {
            kind,
            magnitude,
            expires_at: now + duration,
            last_tick: now,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Replace-on-reapply status list, ticking DoT/HoT at one-second intervals
/// per the original spec's note that the approximate per-frame modulo test
/// should be made deterministic (SPEC_FULL design notes, spec 4.7).
#[derive(Debug, Default)]
pub struct StatusEffects {
    active: Vec<StatusEffect>,
}

pub struct StatusTickResult {
    pub health_delta: f32,
    pub speed_modifier: f32,
    pub shield_gain: f32,
}

impl StatusEffects {
    pub fn apply(&mut self, effect: StatusEffect) {
        self.active.retain(|e| e.kind != effect.kind);
        self.active.push(effect);
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.active.iter().any(|e| e.kind == kind)
    }

    pub fn speed_modifier(&self) -> f32 {
        let mut modifier = 1.0;
        for effect in &self.active {
            match effect.kind {
                StatusKind::Slow => modifier *= 1.0 - effect.magnitude,
                StatusKind::Speed => modifier *= 1.0 + effect.magnitude,
                _ => {}
            }
        }
        modifier.max(0.1)
    }

    /// Advances every active effect by `dt`, applying DoT/HoT at 1-second
    /// intervals and dropping expired effects.
    pub fn tick(&mut self, dt: Duration) -> StatusTickResult {
        let now = Instant::now();
        let mut result = StatusTickResult {
            health_delta: 0.0,
            speed_modifier: 1.0,
            shield_gain: 0.0,
        };

        for effect in &mut self.active {
            let elapsed_since_tick = now.duration_since(effect.last_tick);
            match effect.kind {
                StatusKind::Poison | StatusKind::Burn => {
                    if elapsed_since_tick >= Duration::from_secs(1) {
                        result.health_delta -= effect.magnitude;
                        effect.last_tick = now;
                    }
                }
                StatusKind::Regen => {
                    if elapsed_since_tick >= Duration::from_secs(1) {
                        result.health_delta += effect.magnitude;
                        effect.last_tick = now;
                    }
                }
                StatusKind::Shield => {
                    result.shield_gain += effect.magnitude * dt.as_secs_f32();
                }
                _ => {}
            }
        }

        result.speed_modifier = self.speed_modifier();
        self.active.retain(|e| !e.is_expired(now));
        result
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reapplying_same_kind_replaces_it() {
        let mut effects = StatusEffects::default();
        effects.apply(StatusEffect::new(
            StatusKind::Slow,
            0.3,
            Duration::from_secs(5),
        ));
        effects.apply(StatusEffect::new(
            StatusKind::Slow,
            0.5,
            Duration::from_secs(5),
        ));
        assert_eq!(effects.active.len(), 1);
        assert!((effects.speed_modifier() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn expired_effects_are_dropped() {
        let mut effects = StatusEffects::default();
        effects.apply(StatusEffect::new(
            StatusKind::Speed,
            0.2,
            Duration::from_millis(1),
        ));
        std::thread::sleep(Duration::from_millis(5));
        effects.tick(Duration::from_millis(5));
        assert!(!effects.has(StatusKind::Speed));
    }
}
