//! Delta-compressed snapshot assembly: filters players by significant
//! change, drains this tick's events, and attaches acknowledged input
//! sequence numbers (spec 4.13).

use crate::wire::ServerMessage;
use crate::world::World;

/// Builds one `world_update` snapshot for `world`, committing the delta
/// baseline for every player included.
pub fn build_snapshot(
    world: &mut World,
    acknowledged_inputs: Vec<(u32, u32)>,
    server_time: f32,
) -> ServerMessage {
    let mut players = Vec::new();
    for player in world.players.values_mut() {
        if player.has_significant_change() {
            players.push(player.to_state_update());
            player.commit_sent();
        }
    }

    let events = world.events.drain();

    ServerMessage::WorldUpdate {
        acknowledged_inputs,
        server_time,
        frame_number: world.tick as i64,
        players,
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldGenConfig;
    use crate::loot::LootTables;
    use crate::player::{Class, Player};
    use crate::world::World;

    #[test]
    fn only_changed_players_are_included() {
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        let mut world = World::new(1, &world_gen, &loot_tables, 1);
        world
            .players
            .insert(1, Player::new(1, "a".into(), 0, Class::Scout, 100.0));

        let snapshot = build_snapshot(&mut world, vec![], 0.0);
        let ServerMessage::WorldUpdate { players, .. } = snapshot else {
            panic!("expected WorldUpdate");
        };
        assert_eq!(players.len(), 1);

        let snapshot2 = build_snapshot(&mut world, vec![], 0.0);
        let ServerMessage::WorldUpdate {
            players: players2, ..
        } = snapshot2
        else {
            panic!("expected WorldUpdate");
        };
        assert!(players2.is_empty());
    }
}
