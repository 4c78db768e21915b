//! Loot lifecycle: spawn tables, spawn triggers, pickup, and expiry/density
//! cleanup (spec 4.9).

mod pickup;
mod spawn;
mod table;

pub use pickup::process_loot_grab;
pub use spawn::{drop_from_inventory, luck_modifier, materialize};
pub use table::{LootRoll, LootTable, LootTables};

use std::time::Instant;

use crate::wire::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn rank(self) -> u8 {
        match self {
            Rarity::Common => 0,
            Rarity::Uncommon => 1,
            Rarity::Rare => 2,
            Rarity::Epic => 3,
            Rarity::Legendary => 4,
        }
    }
}

pub struct LootItem {
    pub id: u64,
    pub name: String,
    pub item_type: String,
    pub rarity: Rarity,
    pub position: Vector2,
    pub room_id: (i32, i32),
    pub spawned_at: Instant,
}

impl LootItem {
    pub fn is_expired(&self, ttl: std::time::Duration) -> bool {
        self.spawned_at.elapsed() > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn expires_after_ttl() {
        let item = LootItem {
            id: 1,
            name: "Arrow".into(),
            item_type: "consumable".into(),
            rarity: Rarity::Common,
            position: Vector2::ZERO,
            room_id: (0, 0),
            spawned_at: Instant::now() - Duration::from_secs(3600),
        };
        assert!(item.is_expired(Duration::from_secs(60)));
    }
}
