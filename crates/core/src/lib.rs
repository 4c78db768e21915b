pub mod combat;
pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod lobby;
pub mod loot;
pub mod mob;
pub mod movement;
pub mod net;
pub mod player;
pub mod projectile;
pub mod session;
pub mod snapshot;
pub mod spatial;
pub mod tick;
pub mod wire;
pub mod world;

pub use config::{GameBalance, LobbyConfig, NetworkConfig, ServerConfig, WorldGenConfig};
pub use error::{CombatError, LobbyError, LootError, MovementError, SessionError, WireError};
pub use event::{EventQueue, GameEvent, ReliabilityMode};
pub use input::{InputBuffer, InputStats};
pub use lobby::{Lobby, LobbyManager, LobbyStatus};
pub use loot::{LootItem, LootRoll, LootTable, LootTables, Rarity};
pub use mob::{Mob, MobKind, MobState};
pub use movement::CollisionNeighbor;
pub use net::{NetworkEndpoint, NetworkStats, PendingReliable, RateLimiter, ReliabilityOverlay};
pub use player::{AntiCheat, AntiCheatVerdict, Class, Player, StatusEffect, StatusEffects, StatusKind};
pub use projectile::{DamageType, PositionHistory, Projectile, ProjectilePreset};
pub use session::{SavedPlayerState, Session, SessionManager};
pub use spatial::SpatialGrid;
pub use tick::{FixedTimestep, ReadyInput, step_world, step_worlds_parallel};
pub use wire::{
    AbilityTarget, ClientMessage, DEFAULT_PORT, DEFAULT_TICK_RATE, Envelope, PROTOCOL_VERSION,
    PlayerInput, PlayerStateUpdate, ServerMessage, Vector2, decode_datagram, encode_datagram,
};
pub use world::{ExtractionPoint, Room, World};
