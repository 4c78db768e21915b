use rand::Rng;

use crate::player::Class;

/// Everything the damage pipeline needs beyond the attacker's class, so the
/// same formula serves melee (spec 4.7) and projectile hits (spec 4.8).
pub struct DamageInput {
    pub attacker_class: Class,
    pub weapon_damage: f32,
    pub strength: f32,
    pub damage_reduction: f32,
}

pub struct DamageOutcome {
    pub amount: f32,
    pub critical: bool,
}

/// `base(class) + weapon + strength*2`, +/-20% variance, reduction, then a
/// class-weighted crit roll at 2x (spec 4.7).
pub fn compute_damage(input: &DamageInput, rng: &mut impl Rng) -> DamageOutcome {
    let base = input.attacker_class.base_melee_damage() + input.weapon_damage + input.strength * 2.0;
    let variance = rng.gen_range(-0.2..=0.2);
    let mut amount = (base * (1.0 + variance)).max(0.0);
    amount *= 1.0 - input.damage_reduction;

    let critical = rng.gen_range(0.0..1.0) < input.attacker_class.crit_chance();
    if critical {
        amount *= 2.0;
    }

    DamageOutcome {
        amount: amount.max(0.0),
        critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn damage_is_never_negative() {
        let mut rng = StepRng::new(0, 1);
        let outcome = compute_damage(
            &DamageInput {
                attacker_class: Class::Tank,
                weapon_damage: 0.0,
                strength: 0.0,
                damage_reduction: 1.0,
            },
            &mut rng,
        );
        assert_eq!(outcome.amount, 0.0);
    }

    #[test]
    fn strength_and_weapon_scale_base_damage() {
        let mut rng = StepRng::new(u64::MAX / 2, 0);
        let base = compute_damage(
            &DamageInput {
                attacker_class: Class::Scout,
                weapon_damage: 0.0,
                strength: 0.0,
                damage_reduction: 0.0,
            },
            &mut rng,
        );
        let mut rng2 = StepRng::new(u64::MAX / 2, 0);
        let boosted = compute_damage(
            &DamageInput {
                attacker_class: Class::Scout,
                weapon_damage: 10.0,
                strength: 5.0,
                damage_reduction: 0.0,
            },
            &mut rng2,
        );
        assert!(boosted.amount > base.amount);
    }
}
