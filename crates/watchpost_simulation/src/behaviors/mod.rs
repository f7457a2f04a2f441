//! Sub-behaviors - примитивы, из которых controller собирает поведение
//!
//! Каждый sub-behavior за тик пишет полный AgentIntent через общий контракт
//! `SubBehavior::tick(ctx)`. Какой из них активен - решает только controller.
//!
//! - wander: случайные точки вокруг origin
//! - follow_path: обход маршрута (PatrolRoute)
//! - wander_area: случайные точки внутри AreaBounds
//! - follow_point: дойти до точки (последняя известная позиция цели, звук)
//! - attack: ranged (flank / hold / approach) или melee

use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::components::{AgentIntent, BehaviorKind, WeaponClass};
use crate::navigation::Navigator;
use crate::shared::{center, ground_distance, half_size};
use crate::world::{NavMesh, SpatialQuery};

pub mod attack;
pub mod follow_path;
pub mod follow_point;
pub mod wander;
pub mod wander_area;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod attack_tests;

pub use attack::{AttackBehavior, AttackConfig, FirePoseMode, RangedPolicy, RangedState};
pub use follow_path::{FollowPathBehavior, PatrolRoute};
pub use follow_point::{FollowPointBehavior, FollowPointConfig};
pub use wander::{WanderBehavior, WanderConfig};
pub use wander_area::{WanderAreaBehavior, WanderAreaConfig};

/// Всё, что sub-behavior знает об агенте и мире в этом тике
pub struct AgentContext<'a> {
    pub entity: Entity,
    pub dt: f32,
    /// Позиция ног (Transform.translation)
    pub position: Vec3,
    /// AABB тела в мире
    pub bounds: Aabb3d,
    /// Forward тела
    pub forward: Vec3,
    /// Look direction прошлого тика
    pub look: Vec3,
    pub weapon: WeaponClass,
    pub navigator: &'a mut Navigator,
    pub nav_mesh: &'a dyn NavMesh,
    pub spatial: &'a dyn SpatialQuery,
    pub rng: &'a mut ChaCha8Rng,
    /// Следующий `move_to` пересчитает путь без throttling
    pub force_path_update: bool,
}

impl AgentContext<'_> {
    pub fn center(&self) -> Vec3 {
        center(&self.bounds)
    }

    /// Радиус тела в XZ
    pub fn radius(&self) -> f32 {
        let half = half_size(&self.bounds);
        half.x.max(half.z)
    }

    /// Куда агент смотрит (look, fallback на forward тела)
    pub fn view_forward(&self) -> Vec3 {
        if self.look.length_squared() > 1e-6 {
            self.look
        } else {
            self.forward
        }
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        ground_distance(self.position, point)
    }

    pub fn is_mesh_constrained(&self) -> bool {
        self.navigator.settings.is_mesh_constrained()
    }

    /// Snap на mesh (mesh-constrained), иначе точка как есть
    pub fn snap(&self, point: Vec3) -> Option<Vec3> {
        if self.is_mesh_constrained() {
            self.nav_mesh.sample_position(point, self.navigator.settings.snap_distance)
        } else {
            Some(point)
        }
    }

    /// Направление движения к destination через Navigator
    pub fn move_to(&mut self, destination: Vec3) -> Vec3 {
        let force = std::mem::take(&mut self.force_path_update);
        self.navigator
            .advance(self.nav_mesh, self.position, destination, force, self.dt)
    }

    pub fn stopped(&self) -> AgentIntent {
        AgentIntent::stopped(self.view_forward())
    }
}

/// Общий контракт sub-behavior
pub trait SubBehavior {
    fn kind(&self) -> BehaviorKind;

    fn tick(&mut self, ctx: &mut AgentContext) -> AgentIntent;

    /// Вызывается при активации (controller сменил state)
    fn reset(&mut self) {}
}
