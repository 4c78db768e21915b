//! Tunable defaults for the simulation, mirroring spec section 6.
//!
//! There is no config-file format; everything here has a sensible `Default`
//! and the server binary overrides individual fields from CLI flags.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub udp_port: u16,
    pub world_update_rate: u32,
    pub player_update_rate: u32,
    pub reliable_message_retries: u32,
    pub client_timeout_secs: u64,
    pub max_packet_size: usize,
    pub socket_timeout_ms: u64,
    pub compression_threshold: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            udp_port: 7001,
            world_update_rate: 20,
            player_update_rate: 60,
            reliable_message_retries: 3,
            client_timeout_secs: 30,
            max_packet_size: 1400,
            socket_timeout_ms: 5000,
            compression_threshold: 1200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameBalance {
    pub movement_speed: f32,
    pub sprint_multiplier: f32,
    pub mana_per_sprint_second: f32,
    pub base_health: f32,
    pub melee_range: f32,
    pub melee_cone_cos: f32,
    pub attack_cooldown_ms: u64,
    pub extraction_time_secs: f32,
    pub max_inventory_size: usize,
    pub max_team_size: usize,
    pub max_input_magnitude: f32,
    pub player_collision_radius: f32,
    pub mob_collision_radius: f32,
    pub teleport_max_distance: f32,
    pub lag_compensation_max_ms: u64,
    pub loot_grab_range: f32,
    pub loot_expiration_minutes: f32,
    pub max_loot_per_room: usize,
    pub max_drops_per_mob: usize,
}

impl Default for GameBalance {
    fn default() -> Self {
        Self {
            movement_speed: 5.0,
            sprint_multiplier: 1.5,
            mana_per_sprint_second: 5.0,
            base_health: 100.0,
            melee_range: 2.5,
            melee_cone_cos: 0.7,
            attack_cooldown_ms: 1000,
            extraction_time_secs: 30.0,
            max_inventory_size: 20,
            max_team_size: 6,
            max_input_magnitude: 1.1,
            player_collision_radius: 0.5,
            mob_collision_radius: 0.5,
            teleport_max_distance: 8.0,
            lag_compensation_max_ms: 200,
            loot_grab_range: 3.0,
            loot_expiration_minutes: 20.0,
            max_loot_per_room: 8,
            max_drops_per_mob: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldGenConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    pub room_size: (f32, f32),
    pub room_spacing: f32,
    pub mobs_per_room: usize,
    pub initial_loot_count: usize,
    pub loot_respawn_interval_secs: f32,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            grid_width: 4,
            grid_height: 4,
            room_size: (50.0, 50.0),
            room_spacing: 60.0,
            mobs_per_room: 3,
            initial_loot_count: 12,
            loot_respawn_interval_secs: 120.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyConfig {
    pub max_wait_time_secs: f32,
    pub absolute_max_wait_time_secs: f32,
    pub min_players_to_start: usize,
    pub min_teams_to_start: usize,
    pub empty_lobby_cleanup_minutes: f32,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            max_wait_time_secs: 30.0,
            absolute_max_wait_time_secs: 60.0,
            min_players_to_start: 4,
            min_teams_to_start: 2,
            empty_lobby_cleanup_minutes: 5.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub balance: GameBalance,
    pub world_gen: WorldGenConfig,
    pub lobby: LobbyConfig,
}
