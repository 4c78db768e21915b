//! Fixed-rate tick loop primitives: the per-world system order and
//! rayon-scheduled parallel world updates (spec 4.13, 5).

mod timestep;

pub use timestep::FixedTimestep;

use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::combat::{self, DamageInput};
use crate::config::{GameBalance, WorldGenConfig};
use crate::event::GameEvent;
use crate::loot::{self, LootTables};
use crate::mob::{self, VisiblePlayer};
use crate::movement::{self, CollisionNeighbor};
use crate::player::Player;
use crate::wire::{PlayerInput, Vector2};
use crate::world::World;

const PLAYER_HITBOX_RADIUS: f32 = 0.5;
/// Broad-phase query radius for movement collision neighbors — generous
/// relative to `player_collision_radius` since the grid is a per-tick
/// snapshot and players keep moving while it's queried (spec 4.5).
const MOVEMENT_NEIGHBOR_QUERY_RADIUS: f32 = 5.0;
/// Broad-phase query radius for room-scoped lookups (melee targets, mob
/// visibility); covers a room's full diagonal (`room_size` default 50x50)
/// so the distance query never excludes an actual same-room occupant.
const ROOM_SCALE_QUERY_RADIUS: f32 = 40.0;
/// Broad-phase query radius for projectile hit candidates, wider than any
/// hit radius to tolerate the grid being built before this tick's movement.
const PROJECTILE_CANDIDATE_QUERY_RADIUS: f32 = 20.0;

/// A `player_input` ready for this tick, already ordered by the input
/// buffer (spec 4.4, 4.13 step 2).
pub struct ReadyInput {
    pub player_id: u32,
    pub input: PlayerInput,
}

/// Runs the fixed system order for one world: movement, projectiles,
/// combat status updates, loot processing, AI, then room/progression
/// checks (spec 4.13 step 3).
pub fn step_world(
    world: &mut World,
    ready_inputs: &[ReadyInput],
    dt: f32,
    balance: &GameBalance,
    world_gen: &WorldGenConfig,
    loot_tables: &LootTables,
) {
    world.tick += 1;
    let now = Instant::now();
    rebuild_spatial_grids(world);

    run_movement(world, ready_inputs, dt, balance);
    run_combat_inputs(world, ready_inputs, balance, loot_tables, now);
    run_abilities(world, ready_inputs, balance, now);
    run_projectiles(world, dt, balance, now);
    run_status_effects(world, dt);
    run_loot(world, world_gen, loot_tables, balance, now);
    run_ai(world, dt, now);
    run_progression(world, balance, dt);
}

/// Updates every world in parallel, capped to the rayon global pool's
/// thread count (CPU count by default), then runs `step_world` on each
/// (spec 5: "max parallelism = CPU count", "each world updated by at most
/// one task at a time").
pub fn step_worlds_parallel(
    worlds: &mut [&mut World],
    ready_inputs_by_world: &std::collections::HashMap<u64, Vec<ReadyInput>>,
    dt: f32,
    balance: &GameBalance,
    world_gen: &WorldGenConfig,
    loot_tables: &LootTables,
) {
    let empty = Vec::new();
    worlds.par_iter_mut().for_each(|world| {
        let ready_inputs = ready_inputs_by_world.get(&world.id).unwrap_or(&empty);
        step_world(world, ready_inputs, dt, balance, world_gen, loot_tables);
    });
}

/// Rebuilds the player/mob broad-phase index from current positions, once
/// per tick (spec 4.5: "rebuilt per tick"). Movement, combat target
/// acquisition, AI visibility, and projectile hit search all query it
/// instead of scanning every player/mob.
fn rebuild_spatial_grids(world: &mut World) {
    world.player_grid.clear();
    for player in world.players.values().filter(|p| p.alive) {
        world.player_grid.insert(player.position, player.id);
    }
    world.mob_grid.clear();
    for mob in world.mobs.values().filter(|m| !m.is_dead()) {
        world.mob_grid.insert(mob.position, mob.id);
    }
}

/// Re-materializes up to 3 of a dead player's inventory items into world
/// loot at randomly offset positions, clearing only the dropped ids from
/// the inventory (spec 4.9, testable scenario 6).
fn drop_inventory_on_death(world: &mut World, player_id: u32) {
    let Some(player) = world.players.get_mut(&player_id) else {
        return;
    };
    if player.inventory.is_empty() {
        return;
    }
    let position = player.position;
    let room_id = player.room_id;
    let candidate_ids = player.inventory.clone();

    let mut dropped_ids = Vec::new();
    let mut items = Vec::new();
    for id in candidate_ids {
        let Some(item) = world.item_registry.remove(&id) else {
            continue;
        };
        items.push(item);
        dropped_ids.push(id);
        if items.len() == 3 {
            break;
        }
    }
    if items.is_empty() {
        return;
    }

    let dropped = loot::drop_from_inventory(items, position, room_id, &mut world.rng);
    if let Some(player) = world.players.get_mut(&player_id) {
        player.inventory.retain(|id| !dropped_ids.contains(id));
    }
    for item in dropped {
        world.events.push(GameEvent::LootSpawned {
            loot_id: item.id,
            room_id,
        });
        world.loot.insert(item.id, item);
    }
}

fn run_movement(world: &mut World, ready_inputs: &[ReadyInput], dt: f32, balance: &GameBalance) {
    let (bounds_min, bounds_max) = world.bounds();

    for ready in ready_inputs {
        let query_position = world
            .players
            .get(&ready.player_id)
            .map(|p| p.position)
            .unwrap_or(Vector2::ZERO);
        let neighbors: Vec<CollisionNeighbor> = world
            .player_grid
            .nearby(query_position, MOVEMENT_NEIGHBOR_QUERY_RADIUS)
            .into_iter()
            .filter(|id| *id != ready.player_id)
            .filter_map(|id| world.players.get(&id))
            .map(|p| CollisionNeighbor {
                position: p.position,
                combined_radius: balance.player_collision_radius * 2.0,
            })
            .collect();

        let moved_position = {
            let Some(player) = world.players.get_mut(&ready.player_id) else {
                continue;
            };
            let _ = movement::resolve(
                player,
                &ready.input,
                dt,
                balance,
                bounds_min,
                bounds_max,
                &neighbors,
            );
            player.position
        };

        let previous_room = world.players.get(&ready.player_id).map(|p| p.room_id);
        if let Some(room_id) = world.room_for_position(moved_position) {
            if Some(room_id) != previous_room {
                if let Some(player) = world.players.get_mut(&ready.player_id) {
                    player.room_id = room_id;
                    player.mark_dirty();
                }
                world.events.push(GameEvent::RoomChanged {
                    player_id: ready.player_id,
                    room_id,
                });
            }
        }
    }
}

/// Basic melee attacks dispatched directly from `player_input.is_attacking`
/// (spec 4.7, 4.13 step 2: "other input types dispatch directly to owning
/// systems").
fn run_combat_inputs(
    world: &mut World,
    ready_inputs: &[ReadyInput],
    balance: &GameBalance,
    loot_tables: &LootTables,
    now: Instant,
) {
    for ready in ready_inputs {
        if !ready.input.is_attacking {
            continue;
        }
        let Some(mut attacker) = world.players.remove(&ready.player_id) else {
            continue;
        };

        attack_players(world, &mut attacker, balance, now);
        attack_mobs(world, &mut attacker, balance, loot_tables);

        world.players.insert(ready.player_id, attacker);
    }
}

fn attack_players(world: &mut World, attacker: &mut Player, balance: &GameBalance, now: Instant) {
    let candidate_ids: Vec<u32> = world
        .player_grid
        .nearby(attacker.position, ROOM_SCALE_QUERY_RADIUS)
        .into_iter()
        .filter(|id| {
            world.players.get(id).is_some_and(|p| {
                p.alive && p.room_id == attacker.room_id && p.team_id != attacker.team_id
            })
        })
        .collect();
    let candidate_refs: Vec<&Player> = candidate_ids
        .iter()
        .filter_map(|id| world.players.get(id))
        .collect();
    let acquired_ids: Vec<u32> = combat::acquire_melee_targets(attacker, &candidate_refs, balance)
        .iter()
        .map(|p| p.id)
        .collect();

    let mut targets: Vec<&mut Player> = Vec::new();
    for id in &acquired_ids {
        if let Some(player) = world.players.get_mut(id) {
            // SAFETY: `acquired_ids` are distinct HashMap keys (sourced from
            // `candidate_ids`, itself built from unique map keys), so each
            // `get_mut` call below yields a reference to a different entry.
            let player: &mut Player = unsafe { &mut *(player as *mut Player) };
            targets.push(player);
        }
    }
    if targets.is_empty() {
        return;
    }

    let Ok(events) = combat::attack(attacker, &mut targets, balance, now, &mut world.rng) else {
        return;
    };
    let died_ids: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            GameEvent::PlayerDeath { player_id, .. } => Some(*player_id),
            _ => None,
        })
        .collect();
    for event in events {
        world.events.push(event);
    }
    for player_id in died_ids {
        drop_inventory_on_death(world, player_id);
    }
}

fn attack_mobs(world: &mut World, attacker: &mut Player, balance: &GameBalance, loot_tables: &LootTables) {
    let aim = combat::aim_vector(attacker.aim_direction);
    let target_ids: Vec<u64> = world
        .mob_grid
        .nearby(attacker.position, balance.melee_range)
        .into_iter()
        .filter(|id| {
            world.mobs.get(id).is_some_and(|m| {
                !m.is_dead()
                    && m.room_id == attacker.room_id
                    && combat::in_cone(attacker.position, m.position, aim, balance.melee_cone_cos)
            })
        })
        .collect();

    for mob_id in target_ids {
        let outcome = combat::compute_damage(
            &DamageInput {
                attacker_class: attacker.class,
                weapon_damage: 0.0,
                strength: 0.0,
                damage_reduction: 0.0,
            },
            &mut world.rng,
        );

        let Some(mob) = world.mobs.get_mut(&mob_id) else {
            continue;
        };
        let killed = mob.apply_damage(outcome.amount);
        let mob_position = mob.position;
        let table_id = mob.kind.loot_table();
        let room_id = mob.room_id;

        if killed {
            world.events.push(GameEvent::MobDied { mob_id });
            let luck = loot::luck_modifier(attacker.class);
            if let Some(table) = loot_tables.get(table_id) {
                let rolls = table.roll(&mut world.rng, luck, 2);
                for roll in rolls {
                    let id = world.next_loot_id();
                    let item =
                        loot::materialize(roll, id, mob_position, room_id, &mut world.rng, 1.0);
                    world.events.push(GameEvent::LootSpawned {
                        loot_id: item.id,
                        room_id,
                    });
                    world.loot.insert(item.id, item);
                }
            }
        }
    }
}

/// Ability casts dispatched from `player_input.ability_type` (spec 4.7).
/// Movement/teleport abilities reuse the movement system's collision
/// search; projectile abilities spawn via the preset table (spec 4.8).
fn run_abilities(world: &mut World, ready_inputs: &[ReadyInput], balance: &GameBalance, now: Instant) {
    for ready in ready_inputs {
        let Some(ability) = ready.input.ability_type.as_deref() else {
            continue;
        };
        let Some(player) = world.players.get(&ready.player_id) else {
            continue;
        };
        let Ok(def) = combat::can_cast(player, ability, now) else {
            continue;
        };

        let (room_id, position, aim) = {
            let player = &world.players[&ready.player_id];
            (player.room_id, player.position, combat::aim_vector(player.aim_direction))
        };

        match ability {
            "dash" | "charge" => {
                let distance = if ability == "charge" { 5.0 } else { 6.0 };
                let neighbors: Vec<CollisionNeighbor> = world
                    .players
                    .values()
                    .filter(|p| p.id != ready.player_id)
                    .map(|p| CollisionNeighbor {
                        position: p.position,
                        combined_radius: balance.player_collision_radius * 2.0,
                    })
                    .collect();
                let (bounds_min, bounds_max) = world.bounds();
                let target = position + aim * distance;
                if let Ok(resolved) = movement::teleport(
                    position,
                    target,
                    balance.teleport_max_distance.min(distance + 0.5),
                    bounds_min,
                    bounds_max,
                    &neighbors,
                ) {
                    if let Some(player) = world.players.get_mut(&ready.player_id) {
                        player.position = resolved;
                        player.mark_dirty();
                    }
                }
            }
            "stealth" => {
                if let Some(player) = world.players.get_mut(&ready.player_id) {
                    player
                        .status
                        .apply(crate::player::StatusEffect::new(
                            crate::player::StatusKind::Stealth,
                            1.0,
                            Duration::from_secs(4),
                        ));
                }
            }
            "shield" => {
                if let Some(player) = world.players.get_mut(&ready.player_id) {
                    player.shield = (player.shield + 30.0).min(player.max_shield);
                }
            }
            "buff" => {
                if let Some(target_id) = nearest_ally(world, ready.player_id, room_id, position) {
                    if let Some(target) = world.players.get_mut(&target_id) {
                        target.status.apply(crate::player::StatusEffect::new(
                            crate::player::StatusKind::StrengthBoost,
                            5.0,
                            Duration::from_secs(8),
                        ));
                    }
                }
            }
            "heal" => {
                if let Some(target_id) = nearest_ally(world, ready.player_id, room_id, position) {
                    if let Some(target) = world.players.get_mut(&target_id) {
                        target.heal(30.0);
                    }
                }
            }
            "arrow" | "piercing_arrow" | "fireball" | "ice_bolt" => {
                let Some(preset) = crate::projectile::ProjectilePreset::by_name(ability) else {
                    continue;
                };
                let team_id = world.players[&ready.player_id].team_id;
                let client_timestamp = ready.input.client_timestamp;
                let id = world.next_projectile_id();
                let mut projectile = crate::projectile::Projectile::from_preset(
                    id,
                    ready.player_id,
                    team_id,
                    position,
                    aim,
                    client_timestamp,
                    preset,
                );
                projectile.status_effect = match ability {
                    "fireball" => Some(crate::player::StatusEffect::new(
                        crate::player::StatusKind::Burn,
                        5.0,
                        Duration::from_secs(4),
                    )),
                    "ice_bolt" => Some(crate::player::StatusEffect::new(
                        crate::player::StatusKind::Slow,
                        0.4,
                        Duration::from_secs(3),
                    )),
                    _ => None,
                };
                world.projectiles.insert(id, projectile);
            }
            _ => continue,
        }

        if let Some(player) = world.players.get_mut(&ready.player_id) {
            player.mana -= def.mana_cost;
            player.set_cooldown(def.name, Duration::from_millis(def.cooldown_ms), now);
        }
    }
}

/// Nearest living teammate in the same room, falling back to the caster.
fn nearest_ally(world: &World, caster_id: u32, room_id: (i32, i32), position: Vector2) -> Option<u32> {
    let caster_team = world.players.get(&caster_id)?.team_id;
    world
        .players
        .values()
        .filter(|p| p.alive && p.room_id == room_id && p.team_id == caster_team)
        .min_by(|a, b| {
            a.position
                .distance(position)
                .total_cmp(&b.position.distance(position))
        })
        .map(|p| p.id)
        .or(Some(caster_id))
}

fn run_projectiles(world: &mut World, dt: f32, _balance: &GameBalance, now: Instant) {
    let positions: Vec<(u32, Vector2)> = world.players.iter().map(|(id, p)| (*id, p.position)).collect();
    for (id, pos) in positions {
        world.position_history.entry(id).or_default().record(pos, now);
    }

    let lag_cap = Duration::from_millis(200);
    let projectile_ids: Vec<u64> = world.projectiles.keys().copied().collect();
    let mut destroyed = Vec::new();

    for pid in projectile_ids {
        let Some(projectile) = world.projectiles.get_mut(&pid) else {
            continue;
        };
        projectile.step(dt);
        if projectile.is_expired() {
            destroyed.push(pid);
            continue;
        }

        let hit_radius = projectile.radius + PLAYER_HITBOX_RADIUS;
        let owner_team = projectile.team_id;
        let latency = now.duration_since(projectile.spawned_at);

        let candidate_ids: Vec<u32> = world
            .player_grid
            .nearby(projectile.position, PROJECTILE_CANDIDATE_QUERY_RADIUS)
            .into_iter()
            .filter(|id| {
                world
                    .players
                    .get(id)
                    .is_some_and(|p| p.alive && p.team_id != owner_team && !projectile.has_hit(*id))
            })
            .collect();

        let mut destroy_this = false;
        let mut died_ids: Vec<u32> = Vec::new();
        for target_id in candidate_ids {
            let rewound = world
                .position_history
                .get(&target_id)
                .and_then(|h| h.rewind(now, latency, lag_cap))
                .or_else(|| world.players.get(&target_id).map(|p| p.position));
            let Some(rewound) = rewound else { continue };

            if rewound.distance(projectile.position) > hit_radius {
                continue;
            }

            let damage = projectile.damage_with_falloff();
            let status_effect = projectile.status_effect.clone();
            let Some(target) = world.players.get_mut(&target_id) else {
                continue;
            };
            let killed = target.apply_damage(damage);
            if let Some(effect) = status_effect {
                target.status.apply(effect);
            }
            let target_position = target.position;

            world.events.push(GameEvent::ProjectileHit {
                projectile_id: pid,
                owner_id: projectile.owner_id,
                hit_player_id: Some(target_id),
                position: projectile.position,
            });
            if killed {
                world.events.push(GameEvent::PlayerDeath {
                    player_id: target_id,
                    killer_id: Some(projectile.owner_id),
                    position: target_position,
                });
                died_ids.push(target_id);
            }

            if projectile.record_hit(target_id) {
                destroy_this = true;
                break;
            }
        }

        for target_id in died_ids {
            drop_inventory_on_death(world, target_id);
        }

        if destroy_this {
            destroyed.push(pid);
        }
    }

    for pid in destroyed {
        world.projectiles.remove(&pid);
    }
}

fn run_status_effects(world: &mut World, dt: f32) {
    let dt = Duration::from_secs_f32(dt);
    for player in world.players.values_mut() {
        if !player.alive {
            continue;
        }
        let result = player.status.tick(dt);
        if result.health_delta > 0.0 {
            player.heal(result.health_delta);
        } else if result.health_delta < 0.0 {
            player.apply_damage(-result.health_delta);
        }
        player.shield = (player.shield + result.shield_gain).min(player.max_shield);
    }
}

fn run_loot(
    world: &mut World,
    world_gen: &WorldGenConfig,
    loot_tables: &LootTables,
    balance: &GameBalance,
    now: Instant,
) {
    if now >= world.next_loot_spawn_at {
        world.next_loot_spawn_at =
            now + Duration::from_secs_f32(world_gen.loot_respawn_interval_secs);

        let eligible: Vec<(i32, i32)> = world
            .rooms
            .values()
            .filter(|room| {
                !room.completed
                    && world
                        .loot
                        .values()
                        .filter(|item| item.room_id == room.id)
                        .count()
                        < world_gen.initial_loot_count.max(balance.max_loot_per_room)
            })
            .map(|room| room.id)
            .collect();

        if !eligible.is_empty() {
            let room_id = eligible[world.rng.gen_range(0..eligible.len())];
            let room_position = world.rooms[&room_id].position;
            if let Some(table) = loot_tables.get("common") {
                let rolls = table.roll(&mut world.rng, 0.0, 1);
                for roll in rolls {
                    let id = world.next_loot_id();
                    let item = loot::materialize(roll, id, room_position, room_id, &mut world.rng, 3.0);
                    world.events.push(GameEvent::LootSpawned {
                        loot_id: item.id,
                        room_id,
                    });
                    world.loot.insert(item.id, item);
                }
            }
        }
    }

    let ttl = Duration::from_secs_f32(balance.loot_expiration_minutes * 60.0);
    let expired: Vec<u64> = world
        .loot
        .values()
        .filter(|item| item.is_expired(ttl))
        .map(|item| item.id)
        .collect();
    for id in expired {
        world.loot.remove(&id);
        world.events.push(GameEvent::LootExpired { loot_id: id });
    }
}

fn run_ai(world: &mut World, dt: f32, now: Instant) {
    let mob_ids: Vec<u64> = world.mobs.keys().copied().collect();
    let tick = world.tick;

    for mob_id in mob_ids {
        let Some(mob) = world.mobs.get(&mob_id) else {
            continue;
        };
        if mob.is_dead() {
            continue;
        }
        let room_id = mob.room_id;
        let mob_position = mob.position;

        let visible: Vec<VisiblePlayer> = world
            .player_grid
            .nearby(mob_position, ROOM_SCALE_QUERY_RADIUS)
            .into_iter()
            .filter_map(|id| world.players.get(&id))
            .filter(|p| p.alive && p.room_id == room_id)
            .map(|p| VisiblePlayer {
                player_id: p.id,
                position: p.position,
                class: match p.class {
                    crate::player::Class::Scout => "Scout",
                    crate::player::Class::Tank => "Tank",
                    crate::player::Class::Support => "Support",
                },
            })
            .collect();

        let nearest_distance = visible
            .iter()
            .map(|p| p.position.distance(mob_position))
            .fold(f32::MAX, f32::min);

        if !mob.should_update_this_tick(tick, nearest_distance) {
            continue;
        }

        let Some(mob) = world.mobs.get_mut(&mob_id) else {
            continue;
        };
        let attack_ready = now >= mob.attack_ready_at;
        let target_player = mob.target_player;
        let state_before_attack = mob.state;

        if let Some(event) = mob::step(mob, &visible, Duration::from_secs_f32(dt)) {
            world.events.push(event);
        }

        if matches!(state_before_attack, mob::MobState::Attacking) && attack_ready {
            if let Some(target_id) = target_player {
                let damage = mob.base_attack_damage();
                mob.attack_ready_at = now + Duration::from_secs(1);
                let mut died = false;
                if let Some(target) = world.players.get_mut(&target_id) {
                    let killed = target.apply_damage(damage);
                    let target_position = target.position;
                    if killed {
                        world.events.push(GameEvent::PlayerDeath {
                            player_id: target_id,
                            killer_id: None,
                            position: target_position,
                        });
                        died = true;
                    }
                }
                if died {
                    drop_inventory_on_death(world, target_id);
                }
            }
        }
    }
}

fn run_progression(world: &mut World, _balance: &GameBalance, dt: f32) {
    let room_ids: Vec<(i32, i32)> = world.rooms.keys().copied().collect();
    for room_id in room_ids {
        let has_hostile_mob = world
            .mobs
            .values()
            .any(|m| m.room_id == room_id && !m.is_dead());
        let has_players = world.players.values().any(|p| p.room_id == room_id && p.alive);

        let room = world.rooms.get_mut(&room_id).unwrap();
        if !room.completed && has_players && !has_hostile_mob {
            room.completed = true;
            let team_id = world
                .players
                .values()
                .find(|p| p.room_id == room_id && p.alive)
                .map(|p| p.team_id)
                .unwrap_or(0);
            world.events.push(GameEvent::RoomCompleted { room_id, team_id });
        }
    }

    run_extraction(world, dt);
}

/// Advances extraction progress for every active point: a team keeps
/// progressing only while at least one of its players stands alive in the
/// extraction's room (spec 3 `ExtractionPoint`, 4.13).
fn run_extraction(world: &mut World, dt: f32) {
    let mut completed: Option<u8> = None;

    for point in &mut world.extraction_points {
        if !point.active {
            continue;
        }
        let Some(team_id) = point.progress_team else {
            continue;
        };
        let team_present = world
            .players
            .values()
            .any(|p| p.alive && p.room_id == point.room_id && p.team_id == team_id);

        if !team_present {
            point.progress_team = None;
            point.elapsed_secs = 0.0;
            continue;
        }

        point.elapsed_secs += dt;
        world.events.push(GameEvent::ExtractionProgress {
            extraction_id: point.id,
            team_id,
            remaining_secs: (point.required_time_secs - point.elapsed_secs).max(0.0),
        });

        if point.elapsed_secs >= point.required_time_secs {
            point.active = false;
            completed = Some(team_id);
        }
    }

    if let Some(team_id) = completed {
        world.complete(team_id);
    }
}

use rand::Rng;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loot::LootTables;
    use crate::mob::{Mob, MobKind};
    use crate::player::Class;

    fn test_world() -> World {
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        World::new(1, &world_gen, &loot_tables, 7)
    }

    fn input(move_input: Vector2, is_attacking: bool) -> PlayerInput {
        PlayerInput {
            sequence_number: 1,
            ack_sequence_number: 0,
            client_timestamp: 0.0,
            move_input,
            is_sprinting: false,
            aim_direction: 0.0,
            is_attacking,
            ability_type: None,
            ability_target: Vector2::ZERO,
        }
    }

    #[test]
    fn melee_kill_drops_up_to_three_inventory_items() {
        use crate::loot::{LootItem, Rarity};

        let mut world = test_world();
        let mut attacker = Player::new(1, "a".into(), 0, Class::Tank, 100.0);
        attacker.aim_direction = 0.0;
        world.players.insert(1, attacker);

        let mut victim = Player::new(2, "b".into(), 1, Class::Scout, 1.0);
        victim.position = Vector2(1.0, 0.0);
        victim.inventory = vec![10, 11, 12, 13, 14];
        world.players.insert(2, victim);

        for id in 10..15 {
            world.item_registry.insert(
                id,
                LootItem {
                    id,
                    name: "Item".into(),
                    item_type: "material".into(),
                    rarity: Rarity::Common,
                    position: Vector2::ZERO,
                    room_id: (0, 0),
                    spawned_at: Instant::now(),
                },
            );
        }

        let loot_before = world.loot.len();
        let balance = GameBalance::default();
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        let ready = vec![ReadyInput {
            player_id: 1,
            input: input(Vector2::ZERO, true),
        }];
        step_world(&mut world, &ready, 1.0 / 60.0, &balance, &world_gen, &loot_tables);

        assert!(!world.players[&2].alive);
        assert_eq!(world.players[&2].inventory.len(), 2);
        assert_eq!(world.loot.len() - loot_before, 3);
        let dropped: Vec<_> = (10..15).filter_map(|id| world.loot.get(&id)).collect();
        assert_eq!(dropped.len(), 3);
        for item in &dropped {
            assert!(item.position.distance(Vector2(1.0, 0.0)) <= 2.0 + f32::EPSILON);
        }
    }

    #[test]
    fn step_world_moves_player_and_advances_tick() {
        let mut world = test_world();
        world
            .players
            .insert(1, Player::new(1, "a".into(), 0, Class::Scout, 100.0));
        let balance = GameBalance::default();
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();

        let ready = vec![ReadyInput {
            player_id: 1,
            input: input(Vector2(1.0, 0.0), false),
        }];
        step_world(&mut world, &ready, 1.0 / 60.0, &balance, &world_gen, &loot_tables);

        assert_eq!(world.tick, 1);
        assert!(world.players[&1].position.0 > 0.0);
    }

    #[test]
    fn melee_attack_input_damages_mob_in_range() {
        let mut world = test_world();
        let mut attacker = Player::new(1, "a".into(), 0, Class::Tank, 100.0);
        attacker.aim_direction = 0.0;
        world.players.insert(1, attacker);

        let mob_id = world.next_mob_id();
        let mut mob = Mob::new(mob_id, MobKind::Grunt, Vector2(1.0, 0.0), (0, 0));
        mob.room_id = (0, 0);
        world.mobs.insert(mob_id, mob);

        let balance = GameBalance::default();
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        let ready = vec![ReadyInput {
            player_id: 1,
            input: input(Vector2::ZERO, true),
        }];
        step_world(&mut world, &ready, 1.0 / 60.0, &balance, &world_gen, &loot_tables);

        assert!(world.mobs[&mob_id].health < world.mobs[&mob_id].max_health);
    }

    fn ability_input(ability: &str) -> PlayerInput {
        PlayerInput {
            sequence_number: 1,
            ack_sequence_number: 0,
            client_timestamp: 0.0,
            move_input: Vector2::ZERO,
            is_sprinting: false,
            aim_direction: 0.0,
            is_attacking: false,
            ability_type: Some(ability.to_string()),
            ability_target: Vector2::ZERO,
        }
    }

    #[test]
    fn dash_ability_moves_player_forward_and_starts_cooldown() {
        let mut world = test_world();
        let mut caster = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        caster.aim_direction = 0.0;
        world.players.insert(1, caster);

        let balance = GameBalance::default();
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        let ready = vec![ReadyInput {
            player_id: 1,
            input: ability_input("dash"),
        }];
        step_world(&mut world, &ready, 1.0 / 60.0, &balance, &world_gen, &loot_tables);

        assert!(world.players[&1].position.0 > 0.0);
        assert!(!world.players[&1].is_ability_ready("dash", Instant::now()));
    }

    #[test]
    fn fireball_ability_spawns_a_projectile_with_burn() {
        let mut world = test_world();
        let mut caster = Player::new(1, "a".into(), 0, Class::Support, 100.0);
        caster.aim_direction = 0.0;
        world.players.insert(1, caster);

        let balance = GameBalance::default();
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        let ready = vec![ReadyInput {
            player_id: 1,
            input: ability_input("fireball"),
        }];
        step_world(&mut world, &ready, 1.0 / 60.0, &balance, &world_gen, &loot_tables);

        assert_eq!(world.projectiles.len(), 1);
        let projectile = world.projectiles.values().next().unwrap();
        assert!(projectile.status_effect.is_some());
    }

    #[test]
    fn unowned_ability_is_ignored_without_mutating_player() {
        let mut world = test_world();
        let scout = Player::new(1, "a".into(), 0, Class::Scout, 100.0);
        world.players.insert(1, scout);

        let balance = GameBalance::default();
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        let ready = vec![ReadyInput {
            player_id: 1,
            input: ability_input("charge"),
        }];
        step_world(&mut world, &ready, 1.0 / 60.0, &balance, &world_gen, &loot_tables);

        assert_eq!(world.players[&1].position, Vector2::ZERO);
        assert_eq!(world.players[&1].mana, 50.0);
    }

    #[test]
    fn extraction_completes_world_after_required_time_with_team_present() {
        let mut world = test_world();
        world.mobs.clear();
        let mut player = Player::new(1, "a".into(), 2, Class::Tank, 100.0);
        let extraction = world.extraction_points[0];
        player.room_id = extraction.room_id;
        player.position = extraction.position;
        world.players.insert(1, player);

        world.handle_extraction_action(extraction.id, 2, "start");

        let balance = GameBalance::default();
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        for _ in 0..extraction.required_time_secs.ceil() as u32 {
            step_world(&mut world, &[], 1.0, &balance, &world_gen, &loot_tables);
        }

        assert!(world.completed);
        assert_eq!(world.winning_team, Some(2));
    }

    #[test]
    fn extraction_resets_when_team_leaves_the_room() {
        let mut world = test_world();
        let extraction = world.extraction_points[0];
        world.handle_extraction_action(extraction.id, 1, "start");

        let balance = GameBalance::default();
        let world_gen = WorldGenConfig::default();
        let loot_tables = LootTables::defaults();
        step_world(&mut world, &[], 1.0, &balance, &world_gen, &loot_tables);

        assert_eq!(world.extraction_points[0].progress_team, None);
        assert_eq!(world.extraction_points[0].elapsed_secs, 0.0);
    }
}
