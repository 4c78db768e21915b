use super::DamageType;

#[derive(Debug, Clone, Copy)]
pub struct ProjectilePreset {
    pub speed: f32,
    pub max_range: f32,
    pub radius: f32,
    pub damage: f32,
    pub damage_type: DamageType,
    pub pierce: bool,
    pub max_pierce_count: u32,
    pub max_lifetime_secs: f32,
}

impl ProjectilePreset {
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "arrow" => Some(Self::arrow()),
            "piercing_arrow" => Some(Self::piercing_arrow()),
            "fireball" => Some(Self::fireball()),
            "ice_bolt" => Some(Self::ice_bolt()),
            _ => None,
        }
    }

    pub fn arrow() -> Self {
        Self {
            speed: 20.0,
            max_range: 25.0,
            radius: 0.3,
            damage: 18.0,
            damage_type: DamageType::Physical,
            pierce: false,
            max_pierce_count: 1,
            max_lifetime_secs: 3.0,
        }
    }

    pub fn piercing_arrow() -> Self {
        Self {
            speed: 22.0,
            max_range: 25.0,
            radius: 0.3,
            damage: 14.0,
            damage_type: DamageType::Physical,
            pierce: true,
            max_pierce_count: 3,
            max_lifetime_secs: 3.0,
        }
    }

    pub fn fireball() -> Self {
        Self {
            speed: 14.0,
            max_range: 18.0,
            radius: 0.8,
            damage: 30.0,
            damage_type: DamageType::Magical,
            pierce: false,
            max_pierce_count: 1,
            max_lifetime_secs: 3.0,
        }
    }

    pub fn ice_bolt() -> Self {
        Self {
            speed: 16.0,
            max_range: 16.0,
            radius: 0.5,
            damage: 15.0,
            damage_type: DamageType::Magical,
            pierce: false,
            max_pierce_count: 1,
            max_lifetime_secs: 3.0,
        }
    }
}
