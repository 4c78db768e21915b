//! Token-based session manager: issuance, saved-state snapshots for
//! disconnected players, reconnect validation, and TTL sweeping (spec 4.3).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::SessionError;
use crate::wire::Vector2;

pub const SESSION_TTL: Duration = Duration::from_secs(300);

/// Deep copy of a disconnected player's state, restored verbatim on
/// reconnect (spec 4.3, testable scenario 4).
#[derive(Debug, Clone)]
pub struct SavedPlayerState {
    pub player_name: String,
    pub class: String,
    pub team_id: u8,
    pub position: Vector2,
    pub room_id: (i32, i32),
    pub health: f32,
    pub max_health: f32,
    pub mana: f32,
    pub max_mana: f32,
    pub shield: f32,
    pub inventory: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub player_id: u32,
    pub world_id: u64,
    pub is_lobby: bool,
    pub saved_state: Option<SavedPlayerState>,
    pub created_at: Instant,
    pub last_activity: Instant,
    pub expires_at: Option<Instant>,
    pub deactivated_at: Option<Instant>,
    pub active: bool,
}

impl Session {
    pub fn is_expired(&self, now: Instant) -> bool {
        !self.active && self.expires_at.is_some_and(|exp| now >= exp)
    }
}

fn random_token() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<String, Session>,
    by_player: HashMap<u32, String>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new active session for a freshly connected player.
    pub fn issue(&mut self, player_id: u32, world_id: u64, is_lobby: bool) -> String {
        let token = random_token();
        let now = Instant::now();
        self.sessions.insert(
            token.clone(),
            Session {
                token: token.clone(),
                player_id,
                world_id,
                is_lobby,
                saved_state: None,
                created_at: now,
                last_activity: now,
                expires_at: None,
                deactivated_at: None,
                active: true,
            },
        );
        self.by_player.insert(player_id, token.clone());
        token
    }

    pub fn touch(&mut self, token: &str) {
        if let Some(session) = self.sessions.get_mut(token) {
            session.last_activity = Instant::now();
        }
    }

    /// Re-points a session at the world it was just moved into, e.g. when a
    /// lobby transitions to a running match (spec 4.3, 4.12).
    pub fn set_world(&mut self, token: &str, world_id: u64, is_lobby: bool) {
        if let Some(session) = self.sessions.get_mut(token) {
            session.world_id = world_id;
            session.is_lobby = is_lobby;
        }
    }

    /// Deactivates a session on disconnect, retaining `saved_state` for the
    /// TTL window.
    pub fn deactivate(&mut self, token: &str, saved_state: SavedPlayerState) {
        if let Some(session) = self.sessions.get_mut(token) {
            let now = Instant::now();
            session.active = false;
            session.saved_state = Some(saved_state);
            session.expires_at = Some(now + SESSION_TTL);
            session.deactivated_at = Some(now);
        }
    }

    /// Validates and reactivates a reconnect attempt, returning the saved
    /// state to restore along with how long the player was disconnected
    /// (spec 4.3, testable scenario 4: `TimeSinceDisconnect`).
    pub fn reconnect(&mut self, token: &str) -> Result<(SavedPlayerState, Duration), SessionError> {
        let now = Instant::now();
        let session = self.sessions.get_mut(token).ok_or(SessionError::Invalid)?;

        if session.active {
            return Err(SessionError::AlreadyActive);
        }
        if session.is_expired(now) {
            self.sessions.remove(token);
            return Err(SessionError::Expired);
        }
        let saved = session
            .saved_state
            .take()
            .ok_or(SessionError::NoSavedState)?;
        let disconnect_duration = session
            .deactivated_at
            .map(|at| now.duration_since(at))
            .unwrap_or_default();

        session.active = true;
        session.expires_at = None;
        session.deactivated_at = None;
        session.last_activity = now;
        Ok((saved, disconnect_duration))
    }

    pub fn get(&self, token: &str) -> Option<&Session> {
        self.sessions.get(token)
    }

    pub fn token_for_player(&self, player_id: u32) -> Option<&str> {
        self.by_player.get(&player_id).map(String::as_str)
    }

    /// Purges every session past its TTL, returning the player ids removed.
    pub fn sweep_expired(&mut self) -> Vec<u32> {
        let now = Instant::now();
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.is_expired(now))
            .map(|(token, _)| token.clone())
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for token in expired {
            if let Some(session) = self.sessions.remove(&token) {
                self.by_player.remove(&session.player_id);
                removed.push(session.player_id);
            }
        }
        removed
    }

    /// Active sessions (tokens, player ids) idle past `timeout`, per
    /// `ClientTimeoutSeconds` (spec 6). Does not deactivate them; the caller
    /// decides how to tear the connection down.
    pub fn timed_out(&self, timeout: Duration, now: Instant) -> Vec<(String, u32)> {
        self.sessions
            .values()
            .filter(|s| s.active && now.duration_since(s.last_activity) >= timeout)
            .map(|s| (s.token.clone(), s.player_id))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.values().filter(|s| s.active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved() -> SavedPlayerState {
        SavedPlayerState {
            player_name: "scout1".into(),
            class: "Scout".into(),
            team_id: 0,
            position: Vector2(5.0, 5.0),
            room_id: (0, 0),
            health: 80.0,
            max_health: 100.0,
            mana: 40.0,
            max_mana: 50.0,
            shield: 0.0,
            inventory: vec![1, 2],
        }
    }

    #[test]
    fn reconnect_restores_saved_state() {
        let mut manager = SessionManager::new();
        let token = manager.issue(1, 10, false);
        manager.deactivate(&token, saved());

        let (restored, elapsed) = manager.reconnect(&token).unwrap();
        assert_eq!(restored.position, Vector2(5.0, 5.0));
        assert!(manager.get(&token).unwrap().active);
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn reconnect_reports_elapsed_disconnect_time() {
        let mut manager = SessionManager::new();
        let token = manager.issue(1, 10, false);
        manager.deactivate(&token, saved());
        manager.sessions.get_mut(&token).unwrap().deactivated_at =
            Some(Instant::now() - Duration::from_secs(120));

        let (_, elapsed) = manager.reconnect(&token).unwrap();
        assert!((elapsed.as_secs_f32() - 120.0).abs() < 1.0);
    }

    #[test]
    fn reconnect_rejects_unknown_token() {
        let mut manager = SessionManager::new();
        assert_eq!(manager.reconnect("nope").unwrap_err(), SessionError::Invalid);
    }

    #[test]
    fn reconnect_rejects_already_active() {
        let mut manager = SessionManager::new();
        let token = manager.issue(1, 10, false);
        assert_eq!(
            manager.reconnect(&token).unwrap_err(),
            SessionError::AlreadyActive
        );
    }

    #[test]
    fn expired_sessions_are_swept() {
        let mut manager = SessionManager::new();
        let token = manager.issue(1, 10, false);
        manager.deactivate(&token, saved());
        manager.sessions.get_mut(&token).unwrap().expires_at = Some(Instant::now());
        std::thread::sleep(Duration::from_millis(5));

        let removed = manager.sweep_expired();
        assert_eq!(removed, vec![1]);
        assert!(manager.get(&token).is_none());
    }
}
