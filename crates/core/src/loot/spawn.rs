use std::time::Instant;

use rand::Rng;
use rand::rngs::SmallRng;

use super::LootItem;
use super::table::LootRoll;
use crate::player::Class;
use crate::wire::Vector2;

/// Builds a `LootItem` from an accepted roll, nudged by a small random
/// offset so multiple drops from one source don't stack exactly (spec 4.9).
pub fn materialize(
    roll: LootRoll,
    id: u64,
    base_position: Vector2,
    room_id: (i32, i32),
    rng: &mut SmallRng,
    offset_radius: f32,
) -> LootItem {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let offset = Vector2(angle.cos(), angle.sin()) * rng.gen_range(0.0..offset_radius.max(0.01));
    LootItem {
        id,
        name: roll.name,
        item_type: roll.item_type,
        rarity: roll.rarity,
        position: base_position + offset,
        room_id,
        spawned_at: Instant::now(),
    }
}

/// Luck modifier contributed by a killer's class, applied to mob-death drop
/// rolls (spec 4.9: "Scout +0.1").
pub fn luck_modifier(killer_class: Class) -> f32 {
    match killer_class {
        Class::Scout => 0.1,
        _ => 0.0,
    }
}

/// Re-spawns up to 3 already-known items from a dead player's inventory at
/// randomly offset positions (spec 4.9). The caller resolves each
/// inventory id to its `LootItem` (the world's loot registry) before
/// calling this.
pub fn drop_from_inventory(
    mut items: Vec<LootItem>,
    position: Vector2,
    room_id: (i32, i32),
    rng: &mut SmallRng,
) -> Vec<LootItem> {
    items.truncate(3);
    for item in &mut items {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let offset = Vector2(angle.cos(), angle.sin()) * rng.gen_range(0.5..2.0);
        item.position = position + offset;
        item.room_id = room_id;
        item.spawned_at = Instant::now();
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loot::Rarity;
    use rand::SeedableRng;

    #[test]
    fn player_death_drop_caps_at_three_items() {
        let mut rng = SmallRng::seed_from_u64(3);
        let items: Vec<LootItem> = (0..5)
            .map(|id| LootItem {
                id,
                name: "Item".into(),
                item_type: "material".into(),
                rarity: Rarity::Common,
                position: Vector2::ZERO,
                room_id: (0, 0),
                spawned_at: Instant::now(),
            })
            .collect();
        let dropped = drop_from_inventory(items, Vector2(5.0, 5.0), (1, 1), &mut rng);
        assert_eq!(dropped.len(), 3);
        assert!(dropped.iter().all(|i| i.room_id == (1, 1)));
    }

    #[test]
    fn scout_gets_luck_bonus() {
        assert!(luck_modifier(Class::Scout) > luck_modifier(Class::Tank));
    }
}
