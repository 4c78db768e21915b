use super::LootItem;
use crate::error::LootError;
use crate::player::Player;

/// `ProcessLootGrab` from spec 4.9: validates range, room, inventory, and
/// alive state before transferring the item into the player's inventory.
pub fn process_loot_grab(
    player: &mut Player,
    loot: &LootItem,
    grab_range: f32,
) -> Result<(), LootError> {
    if !player.alive {
        return Err(LootError::Dead);
    }
    if player.room_id != loot.room_id {
        return Err(LootError::WrongRoom);
    }
    if player.position.distance(loot.position) > grab_range {
        return Err(LootError::OutOfRange);
    }
    if player.inventory_full() {
        return Err(LootError::InventoryFull);
    }

    player.inventory.push(loot.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Class;
    use crate::wire::Vector2;
    use std::time::Instant;

    fn loot_at(pos: Vector2, room: (i32, i32)) -> LootItem {
        LootItem {
            id: 1,
            name: "Bandage".into(),
            item_type: "consumable".into(),
            rarity: super::super::Rarity::Common,
            position: pos,
            room_id: room,
            spawned_at: Instant::now(),
        }
    }

    #[test]
    fn succeeds_within_range_same_room_not_full() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        player.position = Vector2(1.0, 0.0);
        let loot = loot_at(Vector2(2.0, 0.0), (0, 0));
        assert!(process_loot_grab(&mut player, &loot, 3.0).is_ok());
        assert_eq!(player.inventory, vec![1]);
    }

    #[test]
    fn rejects_out_of_range() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        let loot = loot_at(Vector2(10.0, 0.0), (0, 0));
        assert_eq!(
            process_loot_grab(&mut player, &loot, 3.0).unwrap_err(),
            LootError::OutOfRange
        );
    }

    #[test]
    fn rejects_wrong_room() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        let loot = loot_at(Vector2::ZERO, (1, 1));
        assert_eq!(
            process_loot_grab(&mut player, &loot, 3.0).unwrap_err(),
            LootError::WrongRoom
        );
    }

    #[test]
    fn rejects_dead_player() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        player.alive = false;
        let loot = loot_at(Vector2::ZERO, (0, 0));
        assert_eq!(
            process_loot_grab(&mut player, &loot, 3.0).unwrap_err(),
            LootError::Dead
        );
    }

    #[test]
    fn rejects_full_inventory() {
        let mut player = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        player.max_inventory = 1;
        player.inventory.push(99);
        let loot = loot_at(Vector2::ZERO, (0, 0));
        assert_eq!(
            process_loot_grab(&mut player, &loot, 3.0).unwrap_err(),
            LootError::InventoryFull
        );
    }
}
