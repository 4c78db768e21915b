//! Per-class ability costs and cooldowns (spec 4.7: "Each has fixed
//! cooldown and mana cost"). The effect each ability has on the world is
//! applied by the tick engine, which has access to the rest of the world's
//! entities; this module only answers "is the cast legal".

use std::time::Instant;

use crate::error::CombatError;
use crate::player::Player;

#[derive(Debug, Clone, Copy)]
pub struct AbilityDef {
    pub name: &'static str,
    pub cooldown_ms: u64,
    pub mana_cost: f32,
}

const ABILITIES: &[AbilityDef] = &[
    AbilityDef { name: "dash", cooldown_ms: 3_000, mana_cost: 10.0 },
    AbilityDef { name: "stealth", cooldown_ms: 8_000, mana_cost: 20.0 },
    AbilityDef { name: "arrow", cooldown_ms: 800, mana_cost: 5.0 },
    AbilityDef { name: "piercing_arrow", cooldown_ms: 6_000, mana_cost: 15.0 },
    AbilityDef { name: "charge", cooldown_ms: 5_000, mana_cost: 15.0 },
    AbilityDef { name: "shield", cooldown_ms: 6_000, mana_cost: 20.0 },
    AbilityDef { name: "heal", cooldown_ms: 4_000, mana_cost: 25.0 },
    AbilityDef { name: "buff", cooldown_ms: 10_000, mana_cost: 20.0 },
    AbilityDef { name: "fireball", cooldown_ms: 3_000, mana_cost: 20.0 },
    AbilityDef { name: "ice_bolt", cooldown_ms: 3_000, mana_cost: 15.0 },
];

pub fn lookup(name: &str) -> Option<AbilityDef> {
    ABILITIES.iter().copied().find(|a| a.name == name)
}

/// Validates a cast request against class ownership, casting state,
/// cooldown, and mana, returning the resolved definition on success.
pub fn can_cast(player: &Player, ability: &str, now: Instant) -> Result<AbilityDef, CombatError> {
    if player.is_casting {
        return Err(CombatError::Casting);
    }
    if !player.class.abilities().contains(&ability) {
        return Err(CombatError::UnknownAbility);
    }
    let def = lookup(ability).ok_or(CombatError::UnknownAbility)?;
    if !player.is_ability_ready(def.name, now) {
        return Err(CombatError::OnCooldown);
    }
    if player.mana < def.mana_cost {
        return Err(CombatError::InsufficientMana);
    }
    Ok(def)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Class;

    #[test]
    fn rejects_ability_not_owned_by_class() {
        let player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        let now = Instant::now();
        assert_eq!(can_cast(&player, "charge", now).unwrap_err(), CombatError::UnknownAbility);
    }

    #[test]
    fn rejects_when_mana_insufficient() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        player.mana = 1.0;
        let now = Instant::now();
        assert_eq!(
            can_cast(&player, "piercing_arrow", now).unwrap_err(),
            CombatError::InsufficientMana
        );
    }

    #[test]
    fn rejects_while_on_cooldown() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        let now = Instant::now();
        let def = can_cast(&player, "dash", now).unwrap();
        player.set_cooldown(def.name, std::time::Duration::from_millis(def.cooldown_ms), now);
        assert_eq!(can_cast(&player, "dash", now).unwrap_err(), CombatError::OnCooldown);
    }
}
