//! Watchpost Simulation Core
//!
//! Headless NPC behavior engine на Bevy 0.16: охранники и зомби
//! (Patrol / Zombie controllers) поверх sub-behaviors.
//!
//! Архитектура:
//! - world: контракты NavMesh / SpatialQuery (+ headless реализации)
//! - perception: FOV, hearing scheduler, damage detector
//! - behaviors: wander, follow path/point, attack
//! - hazard: опасные зоны, фоновый merge, escape override
//! - ai: controllers + per-tick driver
//! - physics: Locomotion (потребитель AgentIntent)

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod behaviors;
pub mod components;
pub mod config;
pub mod hazard;
pub mod logger;
pub mod navigation;
pub mod perception;
pub mod physics;
pub mod shared;
pub mod world;

// Re-export базовых типов для удобства
pub use ai::{
    spawn_agent, spawn_obstacle, spawn_target, tick_agents, AgentController, PatrolConfig, PatrolController,
    PatrolState, Senses, ZombieConfig, ZombieController, ZombieState,
};
pub use components::*;
pub use config::{AgentProfile, ConfigError, ControllerProfile};
pub use hazard::{
    EscapeBehavior, EscapeConfig, EscapeState, HazardDirectory, HazardId, HazardPlugin, HazardPolicy, HazardRegion,
};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level, set_logger,
    set_logger_if_needed, LogLevel, LogPrinter,
};
pub use navigation::{NavigationSettings, Navigator};
pub use perception::{
    DamageTaken, FieldOfView, FieldOfViewConfig, HearingScheduler, HearingSensor, PerceptionPlugin, SoundPosted,
};
pub use physics::{apply_intent_kinematic, AttackPose, Locomotion};
pub use world::{GridNavMesh, NavMesh, NavMeshService, SpatialQuery, SpatialWorld, WorldPlugin};

/// Шаг симуляции (60Hz)
pub const SIMULATION_STEP: Duration = Duration::from_nanos(16_666_667);

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_duration(SIMULATION_STEP))
            // Детерминистичный RNG (seed 42, если host не вставил свой)
            .init_resource::<DeterministicRng>()
            .add_plugins((WorldPlugin, PerceptionPlugin, HazardPlugin))
            .add_systems(
                FixedUpdate,
                (
                    // Фаза 1: ECS → SpatialWorld
                    world::sync_spatial_world,
                    // Фаза 2: hearing scheduler membership
                    (perception::register_hearing_sensors, perception::unregister_hearing_sensors).chain(),
                    // Фаза 3: события сенсоров
                    (
                        perception::collect_posted_sounds,
                        perception::dispatch_hearing,
                        perception::record_damage,
                    )
                        .chain(),
                    // Фаза 4: hazard directory → escape behaviors
                    (hazard::register_escape_agents, hazard::broadcast_hazard_changes).chain(),
                    // Фаза 5: controllers (общий RNG - строгий порядок)
                    (tick_agents::<PatrolController>, tick_agents::<ZombieController>).chain(),
                    // Фаза 6: AgentIntent → Transform
                    apply_intent_kinematic,
                )
                    .chain(),
            );
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время шагает вручную: каждый `app.update()` = ровно один FixedUpdate
/// (кроме самого первого, у которого delta = 0).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_duration(SIMULATION_STEP))
        .insert_resource(TimeUpdateStrategy::ManualDuration(SIMULATION_STEP));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
