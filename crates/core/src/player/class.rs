use serde::{Deserialize, Serialize};

/// Playable class, fixing the per-class multipliers used by movement and
/// combat (spec 4.6, 4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Class {
    Scout,
    Tank,
    Support,
}

impl Class {
    pub fn parse(name: &str) -> Option<Class> {
        match name {
            "Scout" => Some(Class::Scout),
            "Tank" => Some(Class::Tank),
            "Support" => Some(Class::Support),
            _ => None,
        }
    }

    pub fn speed_modifier(self) -> f32 {
        match self {
            Class::Scout => 1.1,
            Class::Tank => 0.9,
            Class::Support => 1.0,
        }
    }

    pub fn base_melee_damage(self) -> f32 {
        match self {
            Class::Tank => 35.0,
            Class::Scout => 25.0,
            Class::Support => 20.0,
        }
    }

    pub fn crit_chance(self) -> f32 {
        match self {
            Class::Scout => 0.20,
            Class::Support => 0.08,
            Class::Tank => 0.05,
        }
    }

    pub fn abilities(self) -> &'static [&'static str] {
        match self {
            Class::Scout => &["dash", "stealth", "arrow", "piercing_arrow"],
            Class::Tank => &["charge", "shield"],
            Class::Support => &["heal", "buff", "fireball", "ice_bolt"],
        }
    }
}
