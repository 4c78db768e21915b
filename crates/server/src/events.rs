use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub enum ServerEvent {
    PlayerConnected {
        player_id: u32,
        addr: SocketAddr,
        player_name: String,
    },
    PlayerReconnected {
        player_id: u32,
        addr: SocketAddr,
    },
    PlayerDisconnected {
        player_id: u32,
        reason: DisconnectReason,
    },
    ConnectionDenied {
        addr: SocketAddr,
        reason: String,
    },
    WorldStarted {
        world_id: u64,
        lobby_id: u64,
        player_count: usize,
    },
    WorldCompleted {
        world_id: u64,
        winning_team: u8,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum DisconnectReason {
    Graceful,
    Timeout,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Graceful => "disconnected",
            DisconnectReason::Timeout => "timed out",
        }
    }
}
