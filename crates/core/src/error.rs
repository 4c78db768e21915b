use thiserror::Error;

/// Errors surfaced by the wire codec when decoding a datagram.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] rmp_serde::decode::Error),
    #[error("failed to encode payload: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("unsupported message type: {0}")]
    UnsupportedType(String),
    #[error("payload exceeds max packet size ({0} > {1})")]
    TooLarge(usize, usize),
    #[error("decompression failed: {0}")]
    Decompress(#[from] std::io::Error),
}

/// Rejection reasons for a reconnect attempt, surfaced verbatim to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session token is not recognized")]
    Invalid,
    #[error("session has expired")]
    Expired,
    #[error("session is already active")]
    AlreadyActive,
    #[error("session has no saved state to restore")]
    NoSavedState,
}

/// Rejection reasons for joining a lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("lobby is full")]
    LobbyFull,
    #[error("team is full")]
    TeamFull,
    #[error("lobby is closed")]
    LobbyClosed,
}

/// Rejection reasons for authoritative movement input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MovementError {
    #[error("movement blocked by collision")]
    Blocked,
    #[error("position would leave world bounds")]
    OutOfBounds,
    #[error("input rejected by anti-cheat")]
    Rejected,
}

/// Rejection reasons for combat actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("attack is on cooldown")]
    OnCooldown,
    #[error("player is casting")]
    Casting,
    #[error("ability is not known for this class")]
    UnknownAbility,
    #[error("not enough mana")]
    InsufficientMana,
}

/// Rejection reasons for picking up loot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LootError {
    #[error("player is dead")]
    Dead,
    #[error("loot item no longer exists")]
    Missing,
    #[error("loot is out of pickup range")]
    OutOfRange,
    #[error("player is not in the loot's room")]
    WrongRoom,
    #[error("inventory is full")]
    InventoryFull,
}
