//! World services - контракты внешнего мира для AI
//!
//! AI не знает про конкретный движок физики или навигации. Всё, что нужно
//! агенту от мира, идёт через два trait'а:
//! - `NavMesh` - walkable surface (snap точки, путь, "дыры")
//! - `SpatialQuery` - overlap sphere + line-of-sight по слоям
//!
//! Headless реализации (GridNavMesh, SpatialWorld) используются тестами и demo.

use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;

use crate::shared::LayerMask;

pub mod navmesh;
pub mod spatial;

pub use navmesh::GridNavMesh;
pub use spatial::{sync_spatial_world, SpatialWorld};

/// Navigation mesh service (walkable surface graph)
pub trait NavMesh: Send + Sync {
    /// Ближайшая точка на mesh в пределах `max_distance` (None - mesh далеко)
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3>;

    /// Упорядоченный список углов пути (пусто - путь не найден)
    fn compute_path(&self, start: Vec3, end: Vec3) -> Vec<Vec3>;

    /// Пересекает ли отрезок непроходимую область (новое препятствие на mesh)
    fn raycast_blocked(&self, from: Vec3, to: Vec3) -> bool;
}

/// Бесконечная плоскость без препятствий
///
/// Используется когда в мире нет NavMeshService: mesh-constrained агенты
/// идут по прямой.
pub struct FlatNavMesh;

impl NavMesh for FlatNavMesh {
    fn sample_position(&self, point: Vec3, _max_distance: f32) -> Option<Vec3> {
        Some(point)
    }

    fn compute_path(&self, start: Vec3, end: Vec3) -> Vec<Vec3> {
        vec![start, end]
    }

    fn raycast_blocked(&self, _from: Vec3, _to: Vec3) -> bool {
        false
    }
}

/// Resource-обёртка над navigation mesh
#[derive(Resource)]
pub struct NavMeshService(pub Box<dyn NavMesh>);

impl NavMeshService {
    pub fn new(nav_mesh: impl NavMesh + 'static) -> Self {
        Self(Box::new(nav_mesh))
    }

    /// `&dyn NavMesh` из опционального resource (fallback - FlatNavMesh)
    pub fn resolve(service: Option<&NavMeshService>) -> &dyn NavMesh {
        match service {
            Some(service) => service.0.as_ref(),
            None => &FlatNavMesh,
        }
    }
}

/// Тело, которое видит spatial query
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialBody {
    pub entity: Entity,
    pub bounds: Aabb3d,
    pub layer: LayerMask,
    pub tag: Option<String>,
    pub alive: bool,
}

impl SpatialBody {
    pub fn center(&self) -> Vec3 {
        crate::shared::center(&self.bounds)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }
}

/// Первое попадание line-of-sight probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec3,
    pub distance: f32,
}

/// Spatial query service (overlap + line-of-sight)
pub trait SpatialQuery: Send + Sync {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<SpatialBody>;

    /// Первое тело на отрезке `from → to` (по слоям `mask`)
    fn line_of_sight(&self, from: Vec3, to: Vec3, mask: LayerMask) -> Option<RayHit>;

    fn body(&self, entity: Entity) -> Option<SpatialBody>;
}

/// World Plugin
///
/// Регистрирует SpatialWorld. NavMeshService вставляет host (опционально).
pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpatialWorld>();
    }
}
