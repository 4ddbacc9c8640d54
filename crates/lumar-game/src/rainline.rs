//! Rainline simulation: weather fronts that sweep across lunagrees.
//!
//! Each world owns one [`RainlineManager`]. Rainlines are ECS entities in a
//! private bevy `World`; tick systems take `&mut World` and push
//! [`RainlineEvent`]s that the sync layer drains after every tick.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};

use bevy_ecs::prelude::*;
use lumar_world::seed::hash_cell;
use lumar_world::{LunagreeGenerator, LunagreeLocation, SporeType};
use serde::Deserialize;
use tracing::debug;

use crate::components::*;

const HEADING_SALT: u64 = 0x4845_4144_494e_4721;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Rainline tuning, read from the `[rainline]` config section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RainlineConfig {
    /// Ticks between spawn passes.
    pub spawn_interval: u64,
    /// Ticks between position broadcasts for each rainline.
    pub move_broadcast_interval: u32,
    pub lifetime_ticks: u32,
    /// Length of the path from first appearance to disappearance.
    pub span_blocks: f64,
    /// Despawn once this far from the spawn point.
    pub max_travel_distance: f64,
    /// A player activates every lunagree within this distance.
    pub activation_distance: f64,
    /// A lunagree spawns at most one rainline per window.
    pub window_ticks: u64,
    pub max_rainlines: usize,
    pub influence_radius: f32,
}

impl Default for RainlineConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 20,
            move_broadcast_interval: 10,
            lifetime_ticks: 2400,
            span_blocks: 384.0,
            max_travel_distance: 512.0,
            activation_distance: 320.0,
            window_ticks: 12_000,
            max_rainlines: 32,
            influence_radius: 48.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Rainline events queued by the tick systems for the sync layer.
#[derive(Resource, Default)]
pub struct OutgoingEvents {
    pub events: Vec<RainlineEvent>,
}

/// Ticks since the manager was created.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Runtime id allocator for rainlines.
#[derive(Resource)]
pub struct RuntimeIdAllocator {
    next: AtomicU64,
}

impl RuntimeIdAllocator {
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    pub fn allocate(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Which lunagrees currently own a rainline, and the last window each spawned in.
#[derive(Resource, Default)]
pub struct ClaimIndex {
    pub claims: HashMap<(i32, i32), Entity>,
    pub last_window: HashMap<(i32, i32), u64>,
}

#[derive(Resource)]
struct Tuning(RainlineConfig);

// ---------------------------------------------------------------------------
// Events and snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RainlineEvent {
    Spawned {
        runtime_id: u64,
        x: f64,
        z: f64,
        spore: SporeType,
        radius: f32,
    },
    Moved {
        runtime_id: u64,
        x: f64,
        z: f64,
    },
    Removed {
        runtime_id: u64,
    },
}

/// Live rainline state, used to catch up joining clients.
#[derive(Debug, Clone, PartialEq)]
pub struct RainlineSnapshot {
    pub runtime_id: u64,
    pub x: f64,
    pub z: f64,
    pub spore: SporeType,
    pub radius: f32,
    pub lunagree: (i32, i32),
    pub age: u32,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

pub struct RainlineManager {
    world: World,
}

impl RainlineManager {
    pub fn new(config: RainlineConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(OutgoingEvents::default());
        world.insert_resource(TickCounter::default());
        world.insert_resource(RuntimeIdAllocator::new(1));
        world.insert_resource(ClaimIndex::default());
        world.insert_resource(Tuning(config));
        Self { world }
    }

    pub fn config(&self) -> &RainlineConfig {
        &self.world.resource::<Tuning>().0
    }

    pub fn current_tick(&self) -> u64 {
        self.world.resource::<TickCounter>().0
    }

    /// Run one tick: move, despawn, then spawn near players. Without a
    /// generator (world unloading or not a Lumar world) spawning is skipped.
    pub fn tick(&mut self, generator: Option<&mut LunagreeGenerator>, players: &[(f64, f64)]) {
        self.world.resource_mut::<TickCounter>().0 += 1;
        system_advance(&mut self.world);
        system_despawn_finished(&mut self.world);
        if let Some(generator) = generator {
            system_spawn_near_players(&mut self.world, generator, players);
        }
    }

    pub fn drain_events(&mut self) -> Vec<RainlineEvent> {
        std::mem::take(&mut self.world.resource_mut::<OutgoingEvents>().events)
    }

    pub fn live_count(&mut self) -> usize {
        let mut q = self.world.query::<&RainlineId>();
        q.iter(&self.world).count()
    }

    pub fn snapshots(&mut self) -> Vec<RainlineSnapshot> {
        let mut q = self.world.query::<(
            &RainlineId,
            &Position,
            &SporeKind,
            &InfluenceRadius,
            &SourceLunagree,
            &Age,
        )>();
        let mut result: Vec<RainlineSnapshot> = q
            .iter(&self.world)
            .map(|(id, pos, spore, radius, source, age)| RainlineSnapshot {
                runtime_id: id.runtime_id,
                x: pos.x,
                z: pos.z,
                spore: spore.0,
                radius: radius.0,
                lunagree: source.key,
                age: age.0,
            })
            .collect();
        result.sort_by_key(|s| s.runtime_id);
        result
    }

    /// Spore type dropped at `(x, z)` by the closest rainline covering it.
    pub fn influence_at(&mut self, x: f64, z: f64) -> Option<SporeType> {
        let mut q = self
            .world
            .query::<(&Position, &SporeKind, &InfluenceRadius)>();
        q.iter(&self.world)
            .filter_map(|(pos, spore, radius)| {
                let d = pos.distance_sq(x, z);
                let r = radius.0 as f64;
                (d <= r * r).then_some((d, spore.0))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, spore)| spore)
    }

    /// Remove every rainline, emitting `Removed` for each.
    pub fn clear(&mut self) {
        let mut q = self.world.query::<(Entity, &RainlineId)>();
        let all: Vec<(Entity, u64)> = q
            .iter(&self.world)
            .map(|(e, id)| (e, id.runtime_id))
            .collect();
        for (entity, runtime_id) in all {
            self.world
                .resource_mut::<OutgoingEvents>()
                .events
                .push(RainlineEvent::Removed { runtime_id });
            self.world.despawn(entity);
        }
        self.world.resource_mut::<ClaimIndex>().claims.clear();
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn system_advance(world: &mut World) {
    let interval = world.resource::<Tuning>().0.move_broadcast_interval.max(1);
    let mut moved = Vec::new();
    {
        let mut q = world.query::<(&RainlineId, &RainlinePath, &mut Age, &mut Position)>();
        for (id, path, mut age, mut pos) in q.iter_mut(world) {
            age.0 = age.0.saturating_add(1);
            *pos = path.position_at(age.0);
            if age.0 % interval == 0 {
                moved.push(RainlineEvent::Moved {
                    runtime_id: id.runtime_id,
                    x: pos.x,
                    z: pos.z,
                });
            }
        }
    }
    world.resource_mut::<OutgoingEvents>().events.extend(moved);
}

fn system_despawn_finished(world: &mut World) {
    let max_travel = world.resource::<Tuning>().0.max_travel_distance;
    let max_travel_sq = max_travel * max_travel;

    let mut finished: Vec<(Entity, u64, (i32, i32))> = Vec::new();
    {
        let mut q = world.query::<(Entity, &RainlineId, &RainlinePath, &Age, &Position, &SourceLunagree)>();
        for (entity, id, path, age, pos, source) in q.iter(world) {
            let origin = path.origin();
            if age.0 >= path.lifetime || pos.distance_sq(origin.x, origin.z) > max_travel_sq {
                finished.push((entity, id.runtime_id, source.key));
            }
        }
    }

    for (entity, runtime_id, key) in finished {
        world.resource_mut::<ClaimIndex>().claims.remove(&key);
        world
            .resource_mut::<OutgoingEvents>()
            .events
            .push(RainlineEvent::Removed { runtime_id });
        world.despawn(entity);
        debug!(runtime_id, lunagree = ?key, "Rainline despawned");
    }
}

fn system_spawn_near_players(
    world: &mut World,
    generator: &mut LunagreeGenerator,
    players: &[(f64, f64)],
) {
    let tick = world.resource::<TickCounter>().0;
    let config = world.resource::<Tuning>().0.clone();
    if tick % config.spawn_interval.max(1) != 0 || players.is_empty() {
        return;
    }
    let window = tick / config.window_ticks.max(1);
    world
        .resource_mut::<ClaimIndex>()
        .last_window
        .retain(|_, w| *w >= window);

    let activation_sq = config.activation_distance * config.activation_distance;
    let area_radius = config.activation_distance.max(0.0).ceil() as i32 + 1;
    let mut live = {
        let mut q = world.query::<&RainlineId>();
        q.iter(world).count()
    };

    'players: for &(px, pz) in players {
        let nearby = generator.lunagrees_in_area(px.floor() as i32, pz.floor() as i32, area_radius);
        for lunagree in nearby {
            if live >= config.max_rainlines {
                break 'players;
            }
            let dx = lunagree.block_x as f64 - px;
            let dz = lunagree.block_z as f64 - pz;
            if dx * dx + dz * dz > activation_sq {
                continue;
            }
            let key = lunagree.key();
            {
                let claims = world.resource::<ClaimIndex>();
                if claims.claims.contains_key(&key) || claims.last_window.get(&key) == Some(&window) {
                    continue;
                }
            }
            let Some(spore) = lunagree.spore() else {
                continue;
            };
            spawn_rainline(world, generator.seed(), &lunagree, spore, window, &config);
            live += 1;
        }
    }
}

fn spawn_rainline(
    world: &mut World,
    seed: i64,
    lunagree: &LunagreeLocation,
    spore: SporeType,
    window: u64,
    config: &RainlineConfig,
) {
    let (heading_x, heading_z) = heading_for(seed, lunagree.key(), window);
    let path = RainlinePath {
        target_x: lunagree.block_x as f64 + 0.5,
        target_z: lunagree.block_z as f64 + 0.5,
        heading_x,
        heading_z,
        span: config.span_blocks,
        lifetime: config.lifetime_ticks,
    };
    let pos = path.origin();
    let runtime_id = world.resource::<RuntimeIdAllocator>().allocate();
    let key = lunagree.key();

    let entity = world
        .spawn((
            RainlineId { runtime_id },
            pos,
            SporeKind(spore),
            path,
            Age(0),
            InfluenceRadius(config.influence_radius),
            SourceLunagree { key, window },
        ))
        .id();

    {
        let mut claims = world.resource_mut::<ClaimIndex>();
        claims.claims.insert(key, entity);
        claims.last_window.insert(key, window);
    }
    world
        .resource_mut::<OutgoingEvents>()
        .events
        .push(RainlineEvent::Spawned {
            runtime_id,
            x: pos.x,
            z: pos.z,
            spore,
            radius: config.influence_radius,
        });
    debug!(runtime_id, lunagree = ?key, window, spore = spore.name(), "Rainline spawned");
}

/// Unit heading for a lunagree's rainline in a given window.
pub fn heading_for(seed: i64, key: (i32, i32), window: u64) -> (f64, f64) {
    let h = hash_cell(
        seed ^ (window as i64).wrapping_mul(0x2545_F491_4F6C_DD1D),
        HEADING_SALT,
        key.0,
        key.1,
    );
    let angle = (h >> 11) as f64 / (1u64 << 53) as f64 * TAU;
    (angle.cos(), angle.sin())
}
