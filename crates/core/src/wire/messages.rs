use serde::{Deserialize, Serialize};

use crate::event::GameEvent;

/// MessagePack array `[x, y]`, per spec 6.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2(pub f32, pub f32);

impl Vector2 {
    pub const ZERO: Vector2 = Vector2(0.0, 0.0);

    pub fn magnitude(self) -> f32 {
        (self.0 * self.0 + self.1 * self.1).sqrt()
    }

    pub fn normalized(self) -> Vector2 {
        let mag = self.magnitude();
        if mag < f32::EPSILON {
            Vector2::ZERO
        } else {
            Vector2(self.0 / mag, self.1 / mag)
        }
    }

    pub fn distance(self, other: Vector2) -> f32 {
        (self - other).magnitude()
    }
}

impl std::ops::Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2(self.0 + rhs.0, self.1 + rhs.1)
    }
}

impl std::ops::Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2(self.0 - rhs.0, self.1 - rhs.1)
    }
}

impl std::ops::Mul<f32> for Vector2 {
    type Output = Vector2;
    fn mul(self, rhs: f32) -> Vector2 {
        Vector2(self.0 * rhs, self.1 * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityTarget {
    None,
    Direction,
    Position,
}

/// One reported client input for a single simulation step (spec 6,
/// `player_input`). Carried inside `ClientMessage::PlayerInput`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInput {
    pub sequence_number: u32,
    pub ack_sequence_number: u32,
    pub client_timestamp: f32,
    pub move_input: Vector2,
    pub is_sprinting: bool,
    pub aim_direction: f32,
    pub is_attacking: bool,
    pub ability_type: Option<String>,
    pub ability_target: Vector2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    Connect {
        player_name: String,
        player_class: String,
        team_id: u8,
        auth_token: String,
    },
    Reconnect {
        session_token: String,
        player_name: String,
        client_timestamp: f32,
    },
    Heartbeat,
    PlayerInput(PlayerInput),
    LootGrab {
        loot_id: u64,
    },
    UseItem {
        item_id: u64,
        item_type: String,
        target_position: Vector2,
    },
    Extraction {
        action: String,
        extraction_id: u32,
    },
    Chat {
        message: String,
        chat_type: String,
    },
    TradeRequest {
        target_player_id: u32,
        offered_item_ids: Vec<u64>,
        requested_item_ids: Vec<u64>,
    },
    MessageAck {
        message_id: u64,
        success: bool,
        error_message: Option<String>,
    },
}

/// Per-player fields sent in a `world_update` snapshot (spec 4.13, 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStateUpdate {
    pub player_id: u32,
    pub position: Vector2,
    pub velocity: Vector2,
    pub aim_direction: f32,
    pub health: f32,
    pub max_health: f32,
    pub mana: f32,
    pub shield: f32,
    pub alive: bool,
    pub is_moving: bool,
    pub is_casting: bool,
    pub room_id: (i32, i32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    ConnectResponse {
        player_id: u32,
        world_id: u64,
        is_lobby: bool,
        session_token: String,
        spawn_position: Vector2,
    },
    ReconnectResponse {
        success: bool,
        reason: Option<String>,
        player: Option<PlayerStateUpdate>,
        time_since_disconnect_secs: f32,
    },
    WorldUpdate {
        acknowledged_inputs: Vec<(u32, u32)>,
        server_time: f32,
        frame_number: i64,
        players: Vec<PlayerStateUpdate>,
        events: Vec<GameEvent>,
    },
    PlayerJoined {
        player_id: u32,
        player_name: String,
        team_id: u8,
    },
    PlayerDisconnected {
        player_id: u32,
    },
    GameStarted {
        world_id: u64,
    },
    LobbyUpdate {
        total_players: usize,
        min_players: usize,
    },
    Error {
        message: String,
    },
    Pong {
        timestamp: u64,
    },
    HeartbeatAck,
    /// Relayed chat line; the server does not interpret `chat_type` beyond
    /// choosing who it's forwarded to (room vs. team).
    ChatMessage {
        sender_id: u32,
        sender_name: String,
        message: String,
        chat_type: String,
    },
    /// Opaque trade offer relayed to its target; no trade state machine is
    /// implemented on top of it.
    TradeRequestForwarded {
        from_player_id: u32,
        offered_item_ids: Vec<u64>,
        requested_item_ids: Vec<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector2_normalization_has_unit_magnitude() {
        let v = Vector2(3.0, 4.0).normalized();
        assert!((v.magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_vector_normalizes_to_zero() {
        assert_eq!(Vector2::ZERO.normalized(), Vector2::ZERO);
    }
}
