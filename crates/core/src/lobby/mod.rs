//! Lobby manager: matchmaking, team balance, and start conditions
//! (spec 4.12).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::{GameBalance, LobbyConfig};
use crate::error::LobbyError;
use crate::event::GameEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyStatus {
    WaitingForPlayers,
    Starting,
    Error,
}

/// A pending match waiting for enough players across enough teams
/// (spec 3, 4.12). Invariant: `team_counts.values().sum() == players.len()`.
pub struct Lobby {
    pub id: u64,
    pub status: LobbyStatus,
    pub created_at: Instant,
    pub last_join: Instant,
    pub team_counts: HashMap<u8, usize>,
    pub players: HashMap<u32, u8>,
    max_team_size: usize,
    max_teams: u8,
}

impl Lobby {
    pub fn new(id: u64, max_team_size: usize, max_teams: u8) -> Self {
        let now = Instant::now();
        Self {
            id,
            status: LobbyStatus::WaitingForPlayers,
            created_at: now,
            last_join: now,
            team_counts: HashMap::new(),
            players: HashMap::new(),
            max_team_size,
            max_teams,
        }
    }

    pub fn total_players(&self) -> usize {
        self.players.len()
    }

    pub fn max_players(&self) -> usize {
        self.max_team_size * self.max_teams as usize
    }

    pub fn distinct_teams(&self) -> usize {
        self.team_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn can_accept(&self, team_id: u8) -> bool {
        if self.status != LobbyStatus::WaitingForPlayers {
            return false;
        }
        if self.total_players() >= self.max_players() {
            return false;
        }
        let count = self.team_counts.get(&team_id).copied().unwrap_or(0);
        count < self.max_team_size
    }

    pub fn join(&mut self, player_id: u32, team_id: u8) -> Result<(), LobbyError> {
        if self.status != LobbyStatus::WaitingForPlayers {
            return Err(LobbyError::LobbyClosed);
        }
        if self.total_players() >= self.max_players() {
            return Err(LobbyError::LobbyFull);
        }
        let count = self.team_counts.get(&team_id).copied().unwrap_or(0);
        if count >= self.max_team_size {
            return Err(LobbyError::TeamFull);
        }

        *self.team_counts.entry(team_id).or_insert(0) += 1;
        self.players.insert(player_id, team_id);
        self.last_join = Instant::now();
        Ok(())
    }

    /// Evaluates the three start conditions from spec 4.12, returning the
    /// `LobbyReadyToStart` event exactly once when one fires.
    pub fn check_start(&mut self, config: &LobbyConfig, now: Instant) -> Option<GameEvent> {
        if self.status != LobbyStatus::WaitingForPlayers {
            return None;
        }

        let immediate = self.total_players() >= self.max_players();
        let timed = self.total_players() >= config.min_players_to_start
            && self.distinct_teams() >= config.min_teams_to_start
            && now.duration_since(self.last_join)
                >= Duration::from_secs_f32(config.max_wait_time_secs);
        let hard_timeout = now.duration_since(self.created_at)
            >= Duration::from_secs_f32(config.absolute_max_wait_time_secs);

        if immediate || timed || hard_timeout {
            self.status = LobbyStatus::Starting;
            Some(GameEvent::LobbyReadyToStart { lobby_id: self.id })
        } else {
            None
        }
    }
}

/// Owns every pending lobby and implements `FindOrCreate` (spec 4.12).
#[derive(Default)]
pub struct LobbyManager {
    lobbies: HashMap<u64, Lobby>,
    next_id: u64,
}

impl LobbyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks an existing waiting lobby that can accept `team_id`, or
    /// creates a new one.
    pub fn find_or_create(&mut self, team_id: u8, balance: &GameBalance, max_teams: u8) -> u64 {
        if let Some(lobby) = self
            .lobbies
            .values()
            .find(|l| l.can_accept(team_id))
        {
            return lobby.id;
        }

        self.next_id += 1;
        let id = self.next_id;
        self.lobbies
            .insert(id, Lobby::new(id, balance.max_team_size, max_teams));
        id
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Lobby> {
        self.lobbies.get_mut(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<Lobby> {
        self.lobbies.remove(&id)
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut Lobby> {
        self.lobbies.values_mut()
    }

    pub fn count(&self) -> usize {
        self.lobbies.len()
    }

    /// Periodic cleanup (spec 4.12): empty lobbies older than
    /// `EmptyLobbyCleanupMinutes` and errored lobbies older than a minute
    /// are removed.
    pub fn cleanup(&mut self, config: &LobbyConfig, now: Instant) -> Vec<u64> {
        let empty_ttl = Duration::from_secs_f32(config.empty_lobby_cleanup_minutes * 60.0);
        let error_ttl = Duration::from_secs(60);

        let to_remove: Vec<u64> = self
            .lobbies
            .values()
            .filter(|l| {
                (l.is_empty() && now.duration_since(l.last_join) >= empty_ttl)
                    || (l.status == LobbyStatus::Error
                        && now.duration_since(l.created_at) >= error_ttl)
            })
            .map(|l| l.id)
            .collect();

        for id in &to_remove {
            self.lobbies.remove(id);
        }
        to_remove
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_start_when_full() {
        let mut lobby = Lobby::new(1, 2, 1);
        lobby.join(1, 0).unwrap();
        lobby.join(2, 0).unwrap();
        let config = LobbyConfig::default();
        assert!(lobby.check_start(&config, Instant::now()).is_some());
        assert_eq!(lobby.status, LobbyStatus::Starting);
    }

    #[test]
    fn timed_start_after_max_wait_with_enough_teams() {
        let mut lobby = Lobby::new(1, 6, 2);
        lobby.join(1, 0).unwrap();
        lobby.join(2, 0).unwrap();
        lobby.join(3, 1).unwrap();
        lobby.join(4, 1).unwrap();
        let mut config = LobbyConfig::default();
        config.min_players_to_start = 4;
        config.min_teams_to_start = 2;

        let too_soon = lobby.check_start(&config, Instant::now());
        assert!(too_soon.is_none());

        let later = Instant::now() + Duration::from_secs(31);
        assert!(lobby.check_start(&config, later).is_some());
    }

    #[test]
    fn team_full_rejects_further_joins() {
        let mut lobby = Lobby::new(1, 1, 2);
        lobby.join(1, 0).unwrap();
        assert_eq!(lobby.join(2, 0).unwrap_err(), LobbyError::TeamFull);
    }

    #[test]
    fn lobby_full_rejects_joins_even_for_new_team() {
        let mut lobby = Lobby::new(1, 1, 1);
        lobby.join(1, 0).unwrap();
        assert_eq!(lobby.join(2, 1).unwrap_err(), LobbyError::LobbyFull);
    }

    #[test]
    fn find_or_create_reuses_waiting_lobby() {
        let mut manager = LobbyManager::new();
        let balance = GameBalance::default();
        let first = manager.find_or_create(0, &balance, 2);
        let second = manager.find_or_create(1, &balance, 2);
        assert_eq!(first, second);
    }
}
