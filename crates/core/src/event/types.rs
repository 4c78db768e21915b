use serde::{Deserialize, Serialize};

use crate::wire::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReliabilityMode {
    Unreliable,
    Reliable,
}

/// One notable thing that happened this tick, embedded verbatim in the
/// next `world_update` snapshot (spec 4.13, 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameEvent {
    RoomChanged {
        player_id: u32,
        room_id: (i32, i32),
    },
    MeleeHit {
        attacker_id: u32,
        target_id: u32,
        damage: f32,
        critical: bool,
    },
    ProjectileHit {
        projectile_id: u64,
        owner_id: u32,
        hit_player_id: Option<u32>,
        position: Vector2,
    },
    PlayerDeath {
        player_id: u32,
        killer_id: Option<u32>,
        position: Vector2,
    },
    LootSpawned {
        loot_id: u64,
        room_id: (i32, i32),
    },
    LootTaken {
        loot_id: u64,
        player_id: u32,
    },
    LootExpired {
        loot_id: u64,
    },
    MobStateChanged {
        mob_id: u64,
        state: String,
    },
    MobDied {
        mob_id: u64,
    },
    ExtractionProgress {
        extraction_id: u32,
        team_id: u8,
        remaining_secs: f32,
    },
    RoomCompleted {
        room_id: (i32, i32),
        team_id: u8,
    },
    LobbyReadyToStart {
        lobby_id: u64,
    },
}

impl GameEvent {
    pub fn reliability(&self) -> ReliabilityMode {
        match self {
            GameEvent::PlayerDeath { .. }
            | GameEvent::RoomCompleted { .. }
            | GameEvent::LobbyReadyToStart { .. }
            | GameEvent::MobDied { .. } => ReliabilityMode::Reliable,
            _ => ReliabilityMode::Unreliable,
        }
    }
}
