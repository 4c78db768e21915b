use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use outland::loot::process_loot_grab;
use outland::session::SavedPlayerState;
use outland::snapshot::build_snapshot;
use outland::tick::{ReadyInput, step_worlds_parallel};
use outland::{
    Class, ClientMessage, Envelope, FixedTimestep, GameBalance, GameEvent, InputBuffer,
    LobbyConfig, LobbyManager, LootTables, NetworkEndpoint, NetworkStats, Player,
    PlayerInput as WirePlayerInput, RateLimiter, ReliabilityOverlay, Room, ServerMessage,
    SessionManager, Vector2, World, WorldGenConfig, decode_datagram, encode_datagram,
};

use crate::config::ServerConfig;
use crate::events::{DisconnectReason, ServerEvent};

const RELIABLE_RETRY_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_BUCKET_CAPACITY: f32 = 20.0;
const LOBBY_CLEANUP_INTERVAL_TICKS: u64 = 300;

struct PlayerProfile {
    name: String,
    class: Class,
    team_id: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Lobby(u64),
    World(u64),
}

/// Orchestrates one authoritative server: UDP transport, sessions, lobbies,
/// and the fixed-rate world tick (spec 3, 4.13).
pub struct GameServer {
    endpoint: NetworkEndpoint,
    config: ServerConfig,
    balance: GameBalance,
    world_gen: WorldGenConfig,
    lobby_config: LobbyConfig,
    loot_tables: LootTables,

    sessions: SessionManager,
    lobbies: LobbyManager,
    worlds: HashMap<u64, World>,

    profiles: HashMap<u32, PlayerProfile>,
    addr_to_player: HashMap<SocketAddr, u32>,
    player_addr: HashMap<u32, SocketAddr>,
    player_location: HashMap<u32, Location>,
    input_buffers: HashMap<u32, InputBuffer>,
    reliability: HashMap<u32, ReliabilityOverlay>,
    ready_inputs: HashMap<u64, Vec<ReadyInput>>,

    rate_limiter: RateLimiter,
    timestep: FixedTimestep,
    tick: u64,
    next_player_id: u32,
    next_world_id: u64,

    running: Arc<AtomicBool>,
    start_time: Instant,
    pending_events: VecDeque<ServerEvent>,
}

impl GameServer {
    pub fn new(bind_addr: &str, config: ServerConfig) -> io::Result<Self> {
        let endpoint = NetworkEndpoint::bind(bind_addr, config.core.network.max_packet_size)?;
        let timestep = FixedTimestep::new(config.core.network.world_update_rate);
        let balance = config.core.balance.clone();
        let world_gen = config.core.world_gen.clone();
        let lobby_config = config.core.lobby.clone();

        Ok(Self {
            endpoint,
            balance,
            world_gen,
            lobby_config,
            loot_tables: LootTables::defaults(),
            sessions: SessionManager::new(),
            lobbies: LobbyManager::new(),
            worlds: HashMap::new(),
            profiles: HashMap::new(),
            addr_to_player: HashMap::new(),
            player_addr: HashMap::new(),
            player_location: HashMap::new(),
            input_buffers: HashMap::new(),
            reliability: HashMap::new(),
            ready_inputs: HashMap::new(),
            rate_limiter: RateLimiter::new(DEFAULT_BUCKET_CAPACITY, DEFAULT_BUCKET_CAPACITY),
            timestep,
            tick: 0,
            next_player_id: 1,
            next_world_id: 1,
            running: Arc::new(AtomicBool::new(true)),
            start_time: Instant::now(),
            pending_events: VecDeque::new(),
            config,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.pending_events.drain(..)
    }

    pub fn run(&mut self) {
        while self.running.load(Ordering::SeqCst) {
            self.tick_once();
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Drains the socket, then runs as many fixed ticks as wall-clock time
    /// has made due (spec 4.13 step 1).
    pub fn tick_once(&mut self) {
        if let Err(e) = self.process_network() {
            self.pending_events.push_back(ServerEvent::Error {
                message: format!("network error: {e}"),
            });
        }

        for _ in 0..self.timestep.advance() {
            self.tick();
        }
    }

    fn tick(&mut self) {
        self.tick += 1;
        let now = Instant::now();
        let dt = self.timestep.dt_secs();

        self.advance_lobbies(now);

        let mut world_refs: Vec<&mut World> = self.worlds.values_mut().collect();
        step_worlds_parallel(
            &mut world_refs,
            &self.ready_inputs,
            dt,
            &self.balance,
            &self.world_gen,
            &self.loot_tables,
        );
        self.ready_inputs.clear();

        self.broadcast_snapshots();
        self.retire_completed_worlds();
        self.resend_pending_reliable();
        self.reap_timed_out_sessions(now);
        self.reap_expired_sessions();

        if self.tick % LOBBY_CLEANUP_INTERVAL_TICKS == 0 {
            self.lobbies.cleanup(&self.lobby_config, now);
        }
    }

    fn advance_lobbies(&mut self, now: Instant) {
        let ready: Vec<u64> = {
            let mut ready = Vec::new();
            for lobby in self.lobbies.all_mut() {
                if lobby.check_start(&self.lobby_config, now).is_some() {
                    ready.push(lobby.id);
                }
            }
            ready
        };
        for lobby_id in ready {
            self.start_world(lobby_id);
        }
    }

    /// `CreateWorld(playersFromLobby)` (spec 4.11): moves every lobby member
    /// into a freshly generated world and announces `game_started`.
    fn start_world(&mut self, lobby_id: u64) {
        let Some(lobby) = self.lobbies.remove(lobby_id) else {
            return;
        };

        let world_id = self.next_world_id;
        self.next_world_id += 1;

        let mut world = World::new(world_id, &self.world_gen, &self.loot_tables, world_id);
        for point in &mut world.extraction_points {
            point.required_time_secs = self.balance.extraction_time_secs;
        }

        let player_ids: Vec<u32> = lobby.players.keys().copied().collect();
        for player_id in &player_ids {
            let team_id = lobby.players[player_id];
            let Some(profile) = self.profiles.get(player_id) else {
                continue;
            };
            let mut player = Player::new(
                *player_id,
                profile.name.clone(),
                team_id,
                profile.class,
                self.balance.base_health,
            );
            if let Some(room) = spawn_room_for_team(&world, team_id) {
                player.position = room.position;
                player.room_id = room.id;
            }
            world.players.insert(*player_id, player);

            self.player_location
                .insert(*player_id, Location::World(world_id));
            if let Some(token) = self.sessions.token_for_player(*player_id).map(str::to_string) {
                self.sessions.set_world(&token, world_id, false);
            }
            if let Some(addr) = self.player_addr.get(player_id).copied() {
                self.send_reliable(addr, *player_id, &ServerMessage::GameStarted { world_id });
            }
        }

        self.pending_events.push_back(ServerEvent::WorldStarted {
            world_id,
            lobby_id,
            player_count: player_ids.len(),
        });
        self.worlds.insert(world_id, world);
    }

    fn broadcast_snapshots(&mut self) {
        let server_time = self.start_time.elapsed().as_secs_f32();
        let world_ids: Vec<u64> = self.worlds.keys().copied().collect();

        for world_id in world_ids {
            let Some(world) = self.worlds.get_mut(&world_id) else {
                continue;
            };
            let acknowledged_inputs: Vec<(u32, u32)> = world
                .players
                .keys()
                .filter_map(|id| self.input_buffers.get(id).map(|buf| (*id, buf.last_processed())))
                .collect();
            let recipients: Vec<u32> = world.players.keys().copied().collect();
            let snapshot = build_snapshot(world, acknowledged_inputs, server_time);

            for player_id in recipients {
                if let Some(addr) = self.player_addr.get(&player_id).copied() {
                    self.send_unreliable(addr, player_id, &snapshot);
                }
            }
        }
    }

    /// `CompleteWorld`/`RemoveWorld` (spec 4.11): once `run_progression`
    /// marks a world complete, restore every occupant to a lobby-eligible
    /// saved session and free the world.
    fn retire_completed_worlds(&mut self) {
        let completed: Vec<u64> = self
            .worlds
            .iter()
            .filter(|(_, world)| world.completed)
            .map(|(id, _)| *id)
            .collect();

        for world_id in completed {
            let Some(world) = self.worlds.remove(&world_id) else {
                continue;
            };
            let winning_team = world.winning_team.unwrap_or(0);
            for (player_id, player) in &world.players {
                self.save_and_deactivate(*player_id, player);
                self.player_location.remove(player_id);
            }
            self.pending_events.push_back(ServerEvent::WorldCompleted {
                world_id,
                winning_team,
            });
        }
    }

    fn save_and_deactivate(&mut self, player_id: u32, player: &Player) {
        let Some(token) = self.sessions.token_for_player(player_id).map(str::to_string) else {
            return;
        };
        self.sessions.deactivate(
            &token,
            SavedPlayerState {
                player_name: player.name.clone(),
                class: class_name(player.class).to_string(),
                team_id: player.team_id,
                position: player.position,
                room_id: player.room_id,
                health: player.health,
                max_health: player.max_health,
                mana: player.mana,
                max_mana: player.max_mana,
                shield: player.shield,
                inventory: player.inventory.clone(),
            },
        );
    }

    fn resend_pending_reliable(&mut self) {
        let player_ids: Vec<u32> = self.reliability.keys().copied().collect();
        for player_id in player_ids {
            let Some(addr) = self.player_addr.get(&player_id).copied() else {
                continue;
            };
            let due = self
                .reliability
                .get_mut(&player_id)
                .map(|overlay| overlay.due_for_resend())
                .unwrap_or_default();
            for payload in due {
                self.endpoint.stats_mut().reliable_retransmits += 1;
                let _ = self.endpoint.send_to(&payload, addr);
            }
        }
    }

    /// Drops active sessions idle past `ClientTimeoutSeconds` (spec 6).
    fn reap_timed_out_sessions(&mut self, now: Instant) {
        let timeout = Duration::from_secs(self.config.core.network.client_timeout_secs);
        let timed_out = self.sessions.timed_out(timeout, now);
        for (_, player_id) in timed_out {
            self.disconnect_player(player_id, DisconnectReason::Timeout);
        }
    }

    /// Purges sessions that have sat disconnected past the session TTL,
    /// releasing the bookkeeping a reconnect would otherwise need.
    fn reap_expired_sessions(&mut self) {
        for player_id in self.sessions.sweep_expired() {
            self.profiles.remove(&player_id);
            self.input_buffers.remove(&player_id);
            self.reliability.remove(&player_id);
            if let Some(addr) = self.player_addr.remove(&player_id) {
                self.addr_to_player.remove(&addr);
            }
            self.player_location.remove(&player_id);
        }
    }

    fn disconnect_player(&mut self, player_id: u32, reason: DisconnectReason) {
        match self.player_location.remove(&player_id) {
            Some(Location::World(world_id)) => {
                if let Some(world) = self.worlds.get_mut(&world_id)
                    && let Some(player) = world.players.remove(&player_id)
                {
                    self.save_and_deactivate(player_id, &player);
                }
            }
            Some(Location::Lobby(lobby_id)) => {
                if let Some(lobby) = self.lobbies.get_mut(lobby_id)
                    && let Some(team_id) = lobby.players.remove(&player_id)
                    && let Some(count) = lobby.team_counts.get_mut(&team_id)
                {
                    *count = count.saturating_sub(1);
                }
                self.save_lobby_profile(player_id);
            }
            None => {}
        }

        if let Some(addr) = self.player_addr.remove(&player_id) {
            self.addr_to_player.remove(&addr);
        }
        self.pending_events
            .push_back(ServerEvent::PlayerDisconnected { player_id, reason });
    }

    /// A lobby member has no simulation state yet; save just enough to
    /// resume matchmaking identity on reconnect.
    fn save_lobby_profile(&mut self, player_id: u32) {
        let Some(token) = self.sessions.token_for_player(player_id).map(str::to_string) else {
            return;
        };
        let profile_class = self
            .profiles
            .get(&player_id)
            .map(|p| class_name(p.class).to_string())
            .unwrap_or_default();
        let profile_name = self
            .profiles
            .get(&player_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let team_id = self.profiles.get(&player_id).map(|p| p.team_id).unwrap_or(0);

        self.sessions.deactivate(
            &token,
            SavedPlayerState {
                player_name: profile_name,
                class: profile_class,
                team_id,
                position: Vector2::ZERO,
                room_id: (0, 0),
                health: self.balance.base_health,
                max_health: self.balance.base_health,
                mana: 50.0,
                max_mana: 50.0,
                shield: 0.0,
                inventory: Vec::new(),
            },
        );
    }

    fn process_network(&mut self) -> io::Result<()> {
        let datagrams = self.endpoint.receive()?;
        for (bytes, addr) in datagrams {
            if let Err(e) = self.handle_datagram(&bytes, addr) {
                self.endpoint.stats_mut().malformed_dropped += 1;
                self.pending_events.push_back(ServerEvent::Error {
                    message: format!("malformed datagram from {addr}: {e}"),
                });
            }
        }
        Ok(())
    }

    fn handle_datagram(&mut self, bytes: &[u8], addr: SocketAddr) -> anyhow::Result<()> {
        let envelope = decode_datagram(bytes)?;
        let message: ClientMessage = rmp_serde::from_slice(&envelope.data)?;

        if !self.rate_limiter.allow(addr, message_bucket(&message)) {
            self.endpoint.stats_mut().rate_limited_dropped += 1;
            return Ok(());
        }

        match message {
            ClientMessage::Connect {
                player_name,
                player_class,
                team_id,
                auth_token: _,
            } => self.handle_connect(addr, player_name, player_class, team_id),
            ClientMessage::Reconnect {
                session_token,
                player_name: _,
                client_timestamp: _,
            } => self.handle_reconnect(addr, session_token),
            ClientMessage::Heartbeat => self.handle_heartbeat(addr),
            ClientMessage::PlayerInput(input) => self.handle_player_input(addr, input),
            ClientMessage::LootGrab { loot_id } => self.handle_loot_grab(addr, loot_id),
            ClientMessage::UseItem {
                item_id,
                item_type,
                target_position: _,
            } => self.handle_use_item(addr, item_id, item_type),
            ClientMessage::Extraction {
                action,
                extraction_id,
            } => self.handle_extraction(addr, action, extraction_id),
            ClientMessage::Chat { message, chat_type } => self.handle_chat(addr, message, chat_type),
            ClientMessage::TradeRequest {
                target_player_id,
                offered_item_ids,
                requested_item_ids,
            } => self.handle_trade_request(addr, target_player_id, offered_item_ids, requested_item_ids),
            ClientMessage::MessageAck {
                message_id,
                success,
                error_message,
            } => self.handle_message_ack(addr, message_id, success, error_message),
        }

        if let Some(player_id) = self.addr_to_player.get(&addr).copied()
            && let Some(token) = self.sessions.token_for_player(player_id).map(str::to_string)
        {
            self.sessions.touch(&token);
        }

        Ok(())
    }

    fn handle_connect(&mut self, addr: SocketAddr, player_name: String, player_class: String, team_id: u8) {
        let Some(class) = Class::parse(&player_class) else {
            self.send_unreliable(addr, 0, &ServerMessage::Error {
                message: format!("unknown class '{player_class}'"),
            });
            self.pending_events.push_back(ServerEvent::ConnectionDenied {
                addr,
                reason: "unknown class".into(),
            });
            return;
        };

        let lobby_id = self.lobbies.find_or_create(team_id, &self.balance, self.config.max_teams);
        let player_id = self.next_player_id;

        let join_result = self
            .lobbies
            .get_mut(lobby_id)
            .map(|lobby| lobby.join(player_id, team_id));
        match join_result {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                self.send_unreliable(addr, 0, &ServerMessage::Error { message: e.to_string() });
                self.pending_events.push_back(ServerEvent::ConnectionDenied {
                    addr,
                    reason: e.to_string(),
                });
                return;
            }
            None => return,
        }
        self.next_player_id += 1;

        let token = self.sessions.issue(player_id, lobby_id, true);
        self.profiles.insert(player_id, PlayerProfile {
            name: player_name.clone(),
            class,
            team_id,
        });
        self.addr_to_player.insert(addr, player_id);
        self.player_addr.insert(player_id, addr);
        self.player_location.insert(player_id, Location::Lobby(lobby_id));
        self.input_buffers.insert(player_id, InputBuffer::new());
        self.reliability.insert(
            player_id,
            ReliabilityOverlay::new(RELIABLE_RETRY_DELAY, self.config.core.network.reliable_message_retries),
        );

        self.send_reliable(addr, player_id, &ServerMessage::ConnectResponse {
            player_id,
            world_id: lobby_id,
            is_lobby: true,
            session_token: token,
            spawn_position: Vector2::ZERO,
        });

        self.broadcast_player_joined(lobby_id, player_id, &player_name, team_id);
        self.broadcast_lobby_update(lobby_id);
        self.pending_events.push_back(ServerEvent::PlayerConnected {
            player_id,
            addr,
            player_name,
        });
    }

    fn broadcast_player_joined(&mut self, lobby_id: u64, player_id: u32, player_name: &str, team_id: u8) {
        let Some(lobby) = self.lobbies.get_mut(lobby_id) else {
            return;
        };
        let others: Vec<u32> = lobby.players.keys().copied().filter(|id| *id != player_id).collect();
        for other in others {
            if let Some(addr) = self.player_addr.get(&other).copied() {
                self.send_reliable(addr, other, &ServerMessage::PlayerJoined {
                    player_id,
                    player_name: player_name.to_string(),
                    team_id,
                });
            }
        }
    }

    fn broadcast_lobby_update(&mut self, lobby_id: u64) {
        let Some(lobby) = self.lobbies.get_mut(lobby_id) else {
            return;
        };
        let total_players = lobby.total_players();
        let min_players = self.lobby_config.min_players_to_start;
        let recipients: Vec<u32> = lobby.players.keys().copied().collect();
        for player_id in recipients {
            if let Some(addr) = self.player_addr.get(&player_id).copied() {
                self.send_unreliable(addr, player_id, &ServerMessage::LobbyUpdate {
                    total_players,
                    min_players,
                });
            }
        }
    }

    /// `reconnect` (spec 4.3): restores a saved lobby identity or
    /// simulation-owned player from the session's saved state.
    fn handle_reconnect(&mut self, addr: SocketAddr, session_token: String) {
        let outcome = self.sessions.reconnect(&session_token);
        let Ok((saved, disconnect_elapsed)) = outcome else {
            let reason = outcome.unwrap_err().to_string();
            self.send_unreliable(addr, 0, &ServerMessage::ReconnectResponse {
                success: false,
                reason: Some(reason),
                player: None,
                time_since_disconnect_secs: 0.0,
            });
            return;
        };
        let disconnect_elapsed_secs = disconnect_elapsed.as_secs_f32();

        let Some(session) = self.sessions.get(&session_token) else {
            return;
        };
        let player_id = session.player_id;
        let world_id = session.world_id;
        let is_lobby = session.is_lobby;

        self.profiles.insert(player_id, PlayerProfile {
            name: saved.player_name.clone(),
            class: Class::parse(&saved.class).unwrap_or(Class::Scout),
            team_id: saved.team_id,
        });
        self.addr_to_player.insert(addr, player_id);
        self.player_addr.insert(player_id, addr);
        self.input_buffers.entry(player_id).or_insert_with(InputBuffer::new);
        self.reliability.entry(player_id).or_insert_with(|| {
            ReliabilityOverlay::new(RELIABLE_RETRY_DELAY, self.config.core.network.reliable_message_retries)
        });

        if is_lobby {
            self.player_location.insert(player_id, Location::Lobby(world_id));
            self.send_reliable(addr, player_id, &ServerMessage::ReconnectResponse {
                success: true,
                reason: None,
                player: None,
                time_since_disconnect_secs: disconnect_elapsed_secs,
            });
        } else if let Some(world) = self.worlds.get_mut(&world_id) {
            let player = restore_player(player_id, &saved, self.balance.base_health);
            let state = player.to_state_update();
            world.players.insert(player_id, player);
            self.player_location.insert(player_id, Location::World(world_id));
            self.send_reliable(addr, player_id, &ServerMessage::ReconnectResponse {
                success: true,
                reason: None,
                player: Some(state),
                time_since_disconnect_secs: disconnect_elapsed_secs,
            });
        } else {
            self.send_reliable(addr, player_id, &ServerMessage::ReconnectResponse {
                success: false,
                reason: Some("world no longer exists".into()),
                player: None,
                time_since_disconnect_secs: 0.0,
            });
            return;
        }

        self.pending_events
            .push_back(ServerEvent::PlayerReconnected { player_id, addr });
    }

    fn handle_heartbeat(&mut self, addr: SocketAddr) {
        let Some(player_id) = self.addr_to_player.get(&addr).copied() else {
            return;
        };
        self.send_unreliable(addr, player_id, &ServerMessage::HeartbeatAck);
    }

    fn handle_player_input(&mut self, addr: SocketAddr, input: WirePlayerInput) {
        let Some(player_id) = self.addr_to_player.get(&addr).copied() else {
            return;
        };
        let Some(Location::World(world_id)) = self.player_location.get(&player_id).copied() else {
            return;
        };
        let Some(buffer) = self.input_buffers.get_mut(&player_id) else {
            return;
        };
        let ready = buffer.submit(input);
        if ready.is_empty() {
            return;
        }
        self.ready_inputs
            .entry(world_id)
            .or_default()
            .extend(ready.into_iter().map(|input| ReadyInput { player_id, input }));
    }

    /// `loot_grab` (spec 4.9): validated directly against the owning
    /// world, independent of the input-sequence buffer.
    fn handle_loot_grab(&mut self, addr: SocketAddr, loot_id: u64) {
        let Some(player_id) = self.addr_to_player.get(&addr).copied() else {
            return;
        };
        let Some(Location::World(world_id)) = self.player_location.get(&player_id).copied() else {
            return;
        };
        let Some(world) = self.worlds.get_mut(&world_id) else {
            return;
        };
        let Some(loot_item) = world.loot.get(&loot_id) else {
            self.send_unreliable(addr, player_id, &ServerMessage::Error {
                message: "loot no longer exists".into(),
            });
            return;
        };

        let grab_range = self.balance.loot_grab_range;
        let result = match world.players.get_mut(&player_id) {
            Some(player) => process_loot_grab(player, loot_item, grab_range),
            None => return,
        };

        match result {
            Ok(()) => {
                if let Some(item) = world.loot.remove(&loot_id) {
                    world.item_registry.insert(item.id, item);
                }
                world.events.push(GameEvent::LootTaken { loot_id, player_id });
            }
            Err(e) => {
                self.send_unreliable(addr, player_id, &ServerMessage::Error { message: e.to_string() });
            }
        }
    }

    /// `use_item` (spec 6): consumes an inventory item. No item-effect
    /// table exists yet beyond a flat heal for consumables; `target_position`
    /// is accepted but unused until an aimed-item type is added.
    fn handle_use_item(&mut self, addr: SocketAddr, item_id: u64, item_type: String) {
        let Some(player_id) = self.addr_to_player.get(&addr).copied() else {
            return;
        };
        let Some(Location::World(world_id)) = self.player_location.get(&player_id).copied() else {
            return;
        };
        let Some(world) = self.worlds.get_mut(&world_id) else {
            return;
        };
        let Some(player) = world.players.get_mut(&player_id) else {
            return;
        };

        let Some(pos) = player.inventory.iter().position(|id| *id == item_id) else {
            self.send_unreliable(addr, player_id, &ServerMessage::Error {
                message: "item not in inventory".into(),
            });
            return;
        };
        player.inventory.remove(pos);
        if item_type == "healthkit" || item_type == "potion" {
            player.heal(25.0);
        }
        player.mark_dirty();
    }

    fn handle_extraction(&mut self, addr: SocketAddr, action: String, extraction_id: u32) {
        let Some(player_id) = self.addr_to_player.get(&addr).copied() else {
            return;
        };
        let Some(Location::World(world_id)) = self.player_location.get(&player_id).copied() else {
            return;
        };
        let Some(world) = self.worlds.get_mut(&world_id) else {
            return;
        };
        let Some(team_id) = world.players.get(&player_id).map(|p| p.team_id) else {
            return;
        };
        world.handle_extraction_action(extraction_id, team_id, &action);
    }

    /// `chat` (spec 6): routed to the sender's team or everyone sharing
    /// their lobby/world, never interpreted beyond that.
    fn handle_chat(&mut self, addr: SocketAddr, message: String, chat_type: String) {
        let Some(sender_id) = self.addr_to_player.get(&addr).copied() else {
            return;
        };
        let Some(sender_name) = self.profiles.get(&sender_id).map(|p| p.name.clone()) else {
            return;
        };
        let Some(location) = self.player_location.get(&sender_id).copied() else {
            return;
        };

        let recipients: Vec<u32> = match location {
            Location::World(world_id) if chat_type == "team" => {
                let Some(world) = self.worlds.get(&world_id) else {
                    return;
                };
                let Some(team_id) = world.players.get(&sender_id).map(|p| p.team_id) else {
                    return;
                };
                world
                    .players
                    .values()
                    .filter(|p| p.team_id == team_id)
                    .map(|p| p.id)
                    .collect()
            }
            Location::World(world_id) => {
                let Some(world) = self.worlds.get(&world_id) else {
                    return;
                };
                world.players.keys().copied().collect()
            }
            Location::Lobby(lobby_id) => {
                let Some(lobby) = self.lobbies.get_mut(lobby_id) else {
                    return;
                };
                lobby.players.keys().copied().collect()
            }
        };

        let out = ServerMessage::ChatMessage {
            sender_id,
            sender_name,
            message,
            chat_type,
        };
        for player_id in recipients {
            if let Some(addr) = self.player_addr.get(&player_id).copied() {
                self.send_reliable(addr, player_id, &out);
            }
        }
    }

    /// `trade_request` (spec 6): an opaque offer relayed to its target; no
    /// trade state machine sits on top of it.
    fn handle_trade_request(
        &mut self,
        addr: SocketAddr,
        target_player_id: u32,
        offered_item_ids: Vec<u64>,
        requested_item_ids: Vec<u64>,
    ) {
        let Some(from_player_id) = self.addr_to_player.get(&addr).copied() else {
            return;
        };
        let Some(target_addr) = self.player_addr.get(&target_player_id).copied() else {
            self.send_unreliable(addr, from_player_id, &ServerMessage::Error {
                message: "target player not connected".into(),
            });
            return;
        };
        self.send_reliable(target_addr, target_player_id, &ServerMessage::TradeRequestForwarded {
            from_player_id,
            offered_item_ids,
            requested_item_ids,
        });
    }

    fn handle_message_ack(&mut self, addr: SocketAddr, message_id: u64, success: bool, error_message: Option<String>) {
        let Some(player_id) = self.addr_to_player.get(&addr).copied() else {
            return;
        };
        if let Some(overlay) = self.reliability.get_mut(&player_id) {
            overlay.ack(message_id);
        }
        if !success && let Some(reason) = error_message {
            log::warn!("player {player_id} rejected message {message_id}: {reason}");
        }
    }

    fn send_unreliable(&mut self, addr: SocketAddr, player_id: u32, message: &ServerMessage) {
        if let Ok(bytes) = self.build_datagram(player_id, message) {
            let _ = self.endpoint.send_to(&bytes, addr);
        }
    }

    fn send_reliable(&mut self, addr: SocketAddr, player_id: u32, message: &ServerMessage) {
        let Ok(bytes) = self.build_datagram(player_id, message) else {
            return;
        };
        let _ = self.endpoint.send_to(&bytes, addr);
        if let Some(overlay) = self.reliability.get_mut(&player_id) {
            overlay.track(bytes);
        }
    }

    fn build_datagram(&self, player_id: u32, message: &ServerMessage) -> anyhow::Result<Vec<u8>> {
        let data = rmp_serde::to_vec(message)?;
        let envelope = Envelope {
            msg_type: server_message_type(message).to_string(),
            player_id: player_id.to_string(),
            data,
            timestamp: self.start_time.elapsed().as_secs_f64(),
        };
        Ok(encode_datagram(
            &envelope,
            self.config.core.network.compression_threshold,
            self.config.core.network.max_packet_size,
        )?)
    }

    pub fn stats(&self) -> ServerStats {
        ServerStats {
            tick: self.tick,
            player_count: self.player_addr.len(),
            world_count: self.worlds.len(),
            lobby_count: self.lobbies.count(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            network_stats: self.endpoint.stats().clone(),
        }
    }
}

fn spawn_room_for_team(world: &World, team_id: u8) -> Option<&Room> {
    let mut ids: Vec<(i32, i32)> = world.rooms.keys().copied().collect();
    if ids.is_empty() {
        return None;
    }
    ids.sort();
    let index = team_id as usize % ids.len();
    world.rooms.get(&ids[index])
}

fn restore_player(id: u32, saved: &SavedPlayerState, default_base_health: f32) -> Player {
    let class = Class::parse(&saved.class).unwrap_or(Class::Scout);
    let mut player = Player::new(id, saved.player_name.clone(), saved.team_id, class, default_base_health);
    player.position = saved.position;
    player.room_id = saved.room_id;
    player.health = saved.health;
    player.max_health = saved.max_health;
    player.mana = saved.mana;
    player.max_mana = saved.max_mana;
    player.shield = saved.shield;
    player.inventory = saved.inventory.clone();
    player.mark_dirty();
    player
}

fn class_name(class: Class) -> &'static str {
    match class {
        Class::Scout => "Scout",
        Class::Tank => "Tank",
        Class::Support => "Support",
    }
}

fn message_bucket(message: &ClientMessage) -> &'static str {
    match message {
        ClientMessage::Connect { .. } => "connect",
        ClientMessage::Reconnect { .. } => "reconnect",
        ClientMessage::Heartbeat => "heartbeat",
        ClientMessage::PlayerInput(_) => "player_input",
        ClientMessage::LootGrab { .. } => "loot_grab",
        ClientMessage::UseItem { .. } => "use_item",
        ClientMessage::Extraction { .. } => "extraction",
        ClientMessage::Chat { .. } => "chat",
        ClientMessage::TradeRequest { .. } => "trade_request",
        ClientMessage::MessageAck { .. } => "message_ack",
    }
}

fn server_message_type(message: &ServerMessage) -> &'static str {
    match message {
        ServerMessage::ConnectResponse { .. } => "connect_response",
        ServerMessage::ReconnectResponse { .. } => "reconnect_response",
        ServerMessage::WorldUpdate { .. } => "world_update",
        ServerMessage::PlayerJoined { .. } => "player_joined",
        ServerMessage::PlayerDisconnected { .. } => "player_disconnected",
        ServerMessage::GameStarted { .. } => "game_started",
        ServerMessage::LobbyUpdate { .. } => "lobby_update",
        ServerMessage::Error { .. } => "error",
        ServerMessage::Pong { .. } => "pong",
        ServerMessage::HeartbeatAck => "heartbeat_ack",
        ServerMessage::ChatMessage { .. } => "chat_message",
        ServerMessage::TradeRequestForwarded { .. } => "trade_request_forwarded",
    }
}

#[derive(Debug, Clone)]
pub struct ServerStats {
    pub tick: u64,
    pub player_count: usize,
    pub world_count: usize,
    pub lobby_count: usize,
    pub uptime_secs: u64,
    pub network_stats: NetworkStats,
}
