//! World manager: room-grid generation, world lifecycle, and the owning
//! container for all per-world simulation state (spec 4.11).

mod room;

pub use room::{ExtractionPoint, Room};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::WorldGenConfig;
use crate::event::EventQueue;
use crate::loot::{LootItem, LootTables, materialize};
use crate::mob::Mob;
use crate::player::Player;
use crate::projectile::{Projectile, PositionHistory};
use crate::spatial::SpatialGrid;
use crate::wire::Vector2;

/// One active match: rooms, extraction points, and every entity the tick
/// engine owns exclusively while this world is being updated (spec 3, 4.11).
pub struct World {
    pub id: u64,
    pub rooms: HashMap<(i32, i32), Room>,
    pub extraction_points: Vec<ExtractionPoint>,
    pub players: HashMap<u32, Player>,
    pub mobs: HashMap<u64, Mob>,
    pub loot: HashMap<u64, LootItem>,
    pub projectiles: HashMap<u64, Projectile>,
    /// Metadata for items already picked up, kept so a player-death drop
    /// can re-materialize them into world loot (spec 4.9).
    pub item_registry: HashMap<u64, LootItem>,
    pub player_grid: SpatialGrid<u32>,
    pub mob_grid: SpatialGrid<u64>,
    pub events: EventQueue,
    pub tick: u64,
    pub rng: SmallRng,
    pub completed: bool,
    pub winning_team: Option<u8>,
    /// Per-player position ring used for lag-compensated projectile hit
    /// detection (spec 4.8).
    pub position_history: HashMap<u32, PositionHistory>,
    pub next_loot_spawn_at: Instant,
    next_loot_id: u64,
    next_mob_id: u64,
    next_projectile_id: u64,
}

impl World {
    /// `CreateWorld` from spec 4.11: generates the room grid, extraction
    /// points, and initial loot. Players are added afterward via
    /// `players.insert`, handing ownership from the lobby to the world.
    pub fn new(
        id: u64,
        world_gen: &WorldGenConfig,
        loot_tables: &LootTables,
        rng_seed: u64,
    ) -> Self {
        let rooms = generate_rooms(world_gen);
        let extraction_points = corner_extraction_points(world_gen, &rooms);
        let rng = SmallRng::seed_from_u64(rng_seed);

        let mut world = Self {
            id,
            rooms,
            extraction_points,
            players: HashMap::new(),
            mobs: HashMap::new(),
            loot: HashMap::new(),
            projectiles: HashMap::new(),
            item_registry: HashMap::new(),
            player_grid: SpatialGrid::new(crate::spatial::DEFAULT_CELL_SIZE),
            mob_grid: SpatialGrid::new(crate::spatial::DEFAULT_CELL_SIZE),
            events: EventQueue::new(),
            tick: 0,
            rng,
            completed: false,
            winning_team: None,
            position_history: HashMap::new(),
            next_loot_spawn_at: Instant::now()
                + Duration::from_secs_f32(world_gen.loot_respawn_interval_secs),
            next_loot_id: 1,
            next_mob_id: 1,
            next_projectile_id: 1,
        };

        world.spawn_initial_loot(world_gen, loot_tables);
        world.spawn_initial_mobs(world_gen);
        world
    }

    pub fn next_loot_id(&mut self) -> u64 {
        let id = self.next_loot_id;
        self.next_loot_id += 1;
        id
    }

    pub fn next_mob_id(&mut self) -> u64 {
        let id = self.next_mob_id;
        self.next_mob_id += 1;
        id
    }

    pub fn next_projectile_id(&mut self) -> u64 {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        id
    }

    /// World-wide bounds spanning every room, used for movement boundary
    /// clamping (spec 4.6).
    pub fn bounds(&self) -> (Vector2, Vector2) {
        let mut min = Vector2(f32::MAX, f32::MAX);
        let mut max = Vector2(f32::MIN, f32::MIN);
        for room in self.rooms.values() {
            let (room_min, room_max) = room.bounds();
            min.0 = min.0.min(room_min.0);
            min.1 = min.1.min(room_min.1);
            max.0 = max.0.max(room_max.0);
            max.1 = max.1.max(room_max.1);
        }
        (min, max)
    }

    /// Derives the room a position falls in via the bounds table
    /// (spec 4.6: "server derives current room by position -> room-bounds
    /// table").
    pub fn room_for_position(&self, position: Vector2) -> Option<(i32, i32)> {
        self.rooms
            .values()
            .find(|room| room.contains(position))
            .map(|room| room.id)
    }

    /// True when more than one team currently occupies `room_id`
    /// (spec 4.6 PvP encounter detection).
    pub fn has_pvp_encounter(&self, room_id: (i32, i32)) -> bool {
        let teams: std::collections::HashSet<u8> = self
            .players
            .values()
            .filter(|p| p.room_id == room_id && p.alive)
            .map(|p| p.team_id)
            .collect();
        teams.len() > 1
    }

    /// `CompleteWorld`: ends the match for the winning team (spec 4.11).
    pub fn complete(&mut self, winning_team: u8) {
        self.completed = true;
        self.winning_team = Some(winning_team);
    }

    /// Dispatches a client `extraction` action directly (spec 4.13 step 2).
    /// `start` begins or resumes progress for `team_id`; any other team
    /// already in progress is displaced. `cancel` resets progress.
    pub fn handle_extraction_action(&mut self, extraction_id: u32, team_id: u8, action: &str) {
        let Some(point) = self.extraction_points.iter_mut().find(|p| p.id == extraction_id) else {
            return;
        };
        if !point.active {
            return;
        }
        match action {
            "start" => {
                if point.progress_team != Some(team_id) {
                    point.progress_team = Some(team_id);
                    point.elapsed_secs = 0.0;
                }
            }
            "cancel" => {
                if point.progress_team == Some(team_id) {
                    point.progress_team = None;
                    point.elapsed_secs = 0.0;
                }
            }
            _ => {}
        }
    }

    fn spawn_initial_loot(&mut self, world_gen: &WorldGenConfig, loot_tables: &LootTables) {
        let Some(common) = loot_tables.get("common") else {
            return;
        };
        let room_ids: Vec<(i32, i32)> = self.rooms.keys().copied().collect();
        if room_ids.is_empty() {
            return;
        }

        for _ in 0..world_gen.initial_loot_count {
            let room_id = room_ids[self.rng.gen_range(0..room_ids.len())];
            let room_position = self.rooms[&room_id].position;
            let spread = self.rooms[&room_id].size.0 / 3.0;
            let rolls = common.roll(&mut self.rng, 0.0, 1);
            for roll in rolls {
                let id = self.next_loot_id();
                let item = materialize(roll, id, room_position, room_id, &mut self.rng, spread);
                self.loot.insert(item.id, item);
            }
        }
    }

    /// Populates each room with `MobsPerRoom` grunts/archers, plus a single
    /// boss guarding the room farthest from the starting corner (spec 2
    /// row 11, 4.10).
    fn spawn_initial_mobs(&mut self, world_gen: &WorldGenConfig) {
        let room_ids: Vec<(i32, i32)> = self.rooms.keys().copied().collect();
        if room_ids.is_empty() {
            return;
        }

        let boss_room = room_ids
            .iter()
            .copied()
            .max_by_key(|(x, y)| x * x + y * y)
            .unwrap_or(room_ids[0]);

        for &room_id in &room_ids {
            let (min, max) = self.rooms[&room_id].bounds();
            let room_position = self.rooms[&room_id].position;

            for i in 0..world_gen.mobs_per_room {
                let kind = if i % 3 == 0 {
                    crate::mob::MobKind::Archer
                } else {
                    crate::mob::MobKind::Grunt
                };
                let position = Vector2(
                    self.rng.gen_range(min.0..=max.0),
                    self.rng.gen_range(min.1..=max.1),
                );
                let id = self.next_mob_id();
                self.mobs.insert(id, Mob::new(id, kind, position, room_id));
            }

            if room_id == boss_room {
                let id = self.next_mob_id();
                self.mobs
                    .insert(id, Mob::new(id, crate::mob::MobKind::Boss, room_position, room_id));
            }
        }
    }
}

fn generate_rooms(world_gen: &WorldGenConfig) -> HashMap<(i32, i32), Room> {
    let mut rooms = HashMap::new();
    for x in 0..world_gen.grid_width as i32 {
        for y in 0..world_gen.grid_height as i32 {
            let id = (x, y);
            rooms.insert(
                id,
                Room {
                    id,
                    position: Vector2(
                        x as f32 * world_gen.room_spacing,
                        y as f32 * world_gen.room_spacing,
                    ),
                    size: world_gen.room_size,
                    connections: Vec::new(),
                    completed: false,
                },
            );
        }
    }

    let ids: Vec<(i32, i32)> = rooms.keys().copied().collect();
    for (x, y) in ids {
        let mut connections = Vec::new();
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let neighbor = (x + dx, y + dy);
            if rooms.contains_key(&neighbor) {
                connections.push(neighbor);
            }
        }
        rooms.get_mut(&(x, y)).unwrap().connections = connections;
    }

    rooms
}

/// Default `ExtractionTimeSeconds` (spec 6); a running server overrides
/// this per-world from `GameBalance` after `World::new` returns.
const DEFAULT_EXTRACTION_TIME_SECS: f32 = 30.0;

fn corner_extraction_points(
    world_gen: &WorldGenConfig,
    rooms: &HashMap<(i32, i32), Room>,
) -> Vec<ExtractionPoint> {
    let max_x = world_gen.grid_width as i32 - 1;
    let max_y = world_gen.grid_height as i32 - 1;
    let corners = [(0, 0), (max_x, 0), (0, max_y), (max_x, max_y)];

    corners
        .iter()
        .enumerate()
        .filter_map(|(i, &corner)| {
            rooms.get(&corner).map(|room| {
                ExtractionPoint::new(i as u32, room.position, corner, DEFAULT_EXTRACTION_TIME_SECS)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_full_grid_with_four_neighbor_connections() {
        let world_gen = WorldGenConfig::default();
        let rooms = generate_rooms(&world_gen);
        assert_eq!(
            rooms.len(),
            (world_gen.grid_width * world_gen.grid_height) as usize
        );

        let corner = &rooms[&(0, 0)];
        assert_eq!(corner.connections.len(), 2);

        let interior = &rooms[&(1, 1)];
        assert_eq!(interior.connections.len(), 4);
    }

    #[test]
    fn places_four_extraction_points_at_corners() {
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        let world = World::new(1, &world_gen, &loot_tables, 42);
        assert_eq!(world.extraction_points.len(), 4);
    }

    #[test]
    fn spawns_initial_loot_across_rooms() {
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        let world = World::new(1, &world_gen, &loot_tables, 42);
        assert!(!world.loot.is_empty());
    }

    #[test]
    fn room_for_position_matches_bounds_table() {
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        let world = World::new(1, &world_gen, &loot_tables, 42);
        let room = &world.rooms[&(0, 0)];
        assert_eq!(world.room_for_position(room.position), Some((0, 0)));
    }
}
