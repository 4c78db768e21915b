use std::collections::HashMap;

use rand::Rng;
use rand::rngs::SmallRng;

use super::Rarity;

#[derive(Debug, Clone)]
pub struct LootRoll {
    pub name: String,
    pub item_type: String,
    pub rarity: Rarity,
}

#[derive(Debug, Clone)]
struct LootEntry {
    name: String,
    item_type: String,
    rarity: Rarity,
    drop_chance: f32,
}

/// One named table of weighted drops (spec 4.9).
#[derive(Debug, Clone, Default)]
pub struct LootTable {
    entries: Vec<LootEntry>,
}

impl LootTable {
    pub fn add(
        mut self,
        name: &str,
        item_type: &str,
        rarity: Rarity,
        drop_chance: f32,
    ) -> Self {
        self.entries.push(LootEntry {
            name: name.to_string(),
            item_type: item_type.to_string(),
            rarity,
            drop_chance,
        });
        self
    }

    /// Rolls every entry independently against `luck_modifier`-scaled
    /// chance, matching the mob-death "up to N rolls" semantics of 4.9.
    pub fn roll(&self, rng: &mut SmallRng, luck_modifier: f32, max_drops: usize) -> Vec<LootRoll> {
        let mut drops = Vec::new();
        for entry in &self.entries {
            if drops.len() >= max_drops {
                break;
            }
            let chance = (entry.drop_chance * (1.0 + luck_modifier)).min(1.0);
            if rng.r#gen::<f32>() < chance {
                drops.push(LootRoll {
                    name: entry.name.clone(),
                    item_type: entry.item_type.clone(),
                    rarity: entry.rarity,
                });
            }
        }
        drops
    }

    /// A guaranteed roll of rarity >= `min_rank`, used for boss deaths.
    pub fn roll_guaranteed_min_rarity(&self, rng: &mut SmallRng, min_rank: u8) -> Option<LootRoll> {
        let candidates: Vec<&LootEntry> = self
            .entries
            .iter()
            .filter(|e| e.rarity.rank() >= min_rank)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..candidates.len());
        let chosen = candidates[idx];
        Some(LootRoll {
            name: chosen.name.clone(),
            item_type: chosen.item_type.clone(),
            rarity: chosen.rarity,
        })
    }
}

#[derive(Debug, Default)]
pub struct LootTables {
    tables: HashMap<&'static str, LootTable>,
}

impl LootTables {
    pub fn insert(&mut self, id: &'static str, table: LootTable) {
        self.tables.insert(id, table);
    }

    pub fn get(&self, id: &str) -> Option<&LootTable> {
        self.tables.get(id)
    }

    /// The built-in table set referenced by spec 4.9 and `WorldGenConfig`.
    pub fn defaults() -> Self {
        let mut tables = Self::default();
        tables.insert(
            "common",
            LootTable::default()
                .add("Bandage", "consumable", Rarity::Common, 0.4)
                .add("Scrap Metal", "material", Rarity::Common, 0.3)
                .add("Energy Cell", "material", Rarity::Uncommon, 0.15),
        );
        tables.insert(
            "common_grunt",
            LootTable::default()
                .add("Scrap Metal", "material", Rarity::Common, 0.3)
                .add("Ammo Pack", "consumable", Rarity::Common, 0.2),
        );
        tables.insert(
            "common_archer",
            LootTable::default()
                .add("Arrow Bundle", "consumable", Rarity::Common, 0.35)
                .add("Energy Cell", "material", Rarity::Uncommon, 0.12),
        );
        tables.insert(
            "boss_guaranteed",
            LootTable::default()
                .add("Plated Core", "material", Rarity::Rare, 1.0)
                .add("Rift Shard", "material", Rarity::Epic, 1.0)
                .add("Crown Fragment", "material", Rarity::Legendary, 1.0),
        );
        tables.insert(
            "room_completion",
            LootTable::default().add("Stabilizer", "consumable", Rarity::Uncommon, 0.6),
        );
        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn guaranteed_roll_meets_minimum_rarity() {
        let tables = LootTables::defaults();
        let boss_table = tables.get("boss_guaranteed").unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let roll = boss_table
            .roll_guaranteed_min_rarity(&mut rng, Rarity::Rare.rank())
            .unwrap();
        assert!(roll.rarity.rank() >= Rarity::Rare.rank());
    }

    #[test]
    fn roll_respects_max_drops_cap() {
        let tables = LootTables::defaults();
        let common = tables.get("common").unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let drops = common.roll(&mut rng, 1.0, 1);
        assert!(drops.len() <= 1);
    }
}
