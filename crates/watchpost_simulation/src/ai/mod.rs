//! AI decision-making module
//!
//! Top-level controllers (Patrol, Zombie) - конечные автоматы поверх
//! sub-behaviors. Каждый тик:
//! 1. `decide(senses)` - transitions (только controller решает, какой
//!    sub-behavior активен)
//! 2. `dispatch(ctx)` - ровно один sub-behavior пишет AgentIntent
//! 3. overrides (damage detector, escape) - в системе `tick_agents`

use bevy::prelude::*;

use crate::behaviors::AgentContext;
use crate::components::{AgentIntent, BehaviorKind};
use crate::perception::HeardSound;

pub mod components;
pub mod spawn;
pub mod systems;

// Re-export основных типов
pub use components::*;
pub use spawn::{spawn_agent, spawn_obstacle, spawn_target};
pub use systems::*;

/// Что агент знает о мире в этом тике (собирает система из сенсоров)
#[derive(Debug, Clone, Default)]
pub struct Senses {
    pub position: Vec3,
    /// Ближайшая видимая цель (FOV)
    pub visible_target: Option<Entity>,
    /// Tracked цель controller'а проходит is_on_view
    pub target_in_view: bool,
    /// Tracked цель существует и жива
    pub target_alive: bool,
    /// Центр tracked цели, если она на виду
    pub target_position: Option<Vec3>,
    /// Центр ближайшей видимой цели
    pub visible_position: Option<Vec3>,
    pub heard: Option<HeardSound>,
    /// Источник попадания (DamageDetector с alert_on_damage)
    pub damage_alert: Option<Vec3>,
}

/// Общий контракт top-level controller'а
pub trait AgentController: Send + Sync + 'static {
    /// State transitions (до dispatch)
    fn decide(&mut self, senses: &Senses, dt: f32);

    /// Тик активного sub-behavior
    fn dispatch(&mut self, ctx: &mut AgentContext) -> AgentIntent;

    fn state_name(&self) -> &'static str;

    fn active_kind(&self) -> Option<BehaviorKind>;

    /// Damage detector не перебивает взгляд в бою
    fn is_attacking(&self) -> bool;

    fn target(&self) -> Option<Entity>;
}
