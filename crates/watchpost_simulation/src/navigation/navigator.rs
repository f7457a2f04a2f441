//! Navigator - route к destination (direct vector или mesh path)
//!
//! Recompute:
//! - синхронно: force_update или destination сдвинулся > DESTINATION_JUMP_THRESHOLD
//! - throttled: refresh_interval истёк, пути ещё нет (или прошлый запрос
//!   вернул пустой путь), последний угол пути не совпадает с текущим
//!   destination (после snap на mesh), направление на текущий waypoint
//!   повернулось (dot < FACING_COS_THRESHOLD), или на текущем отрезке
//!   появилась "дыра" (raycast_blocked)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::path::{step_waypoint, EndPathMode, PathCursor, PathState};
use crate::shared::{ground_direction_or, ground_distance};
use crate::world::NavMesh;

/// Сдвиг destination, после которого путь пересчитывается немедленно
pub const DESTINATION_JUMP_THRESHOLD: f32 = 1.0;

/// cos(~26°): порог поворота направления на waypoint
pub const FACING_COS_THRESHOLD: f32 = 0.9;

/// Допуск совпадения последнего угла с mesh destination
const CORNER_MATCH_TOLERANCE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum NavigationMode {
    /// Прямой вектор к destination
    #[default]
    Direct,
    /// Путь по navigation mesh
    MeshConstrained,
}

/// Настройки навигации агента (читаются всеми sub-behaviors)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct NavigationSettings {
    pub mode: NavigationMode,
    /// Период throttled recompute (секунды)
    pub refresh_interval: f32,
    /// Waypoint считается достигнутым в этом радиусе (метры)
    pub jump_distance: f32,
    /// Максимальная дистанция snap destination на mesh
    pub snap_distance: f32,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            mode: NavigationMode::Direct,
            refresh_interval: 0.5,
            jump_distance: 1.0,
            snap_distance: 2.0,
        }
    }
}

impl NavigationSettings {
    pub fn mesh_constrained() -> Self {
        Self {
            mode: NavigationMode::MeshConstrained,
            ..Default::default()
        }
    }

    pub fn is_mesh_constrained(&self) -> bool {
        self.mode == NavigationMode::MeshConstrained
    }
}

/// Navigation primitive агента
#[derive(Component, Debug, Clone, Default)]
pub struct Navigator {
    pub settings: NavigationSettings,
    pub path: PathState,
    refresh_timer: f32,
    /// Направление на waypoint на прошлой проверке
    last_leg_direction: Option<Vec3>,
    /// Сколько раз путь пересчитывался (debug / тесты)
    pub recompute_count: u32,
}

impl Navigator {
    pub fn new(settings: NavigationSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Направление движения к destination (ground plane, unit или ZERO)
    pub fn advance(
        &mut self,
        nav_mesh: &dyn NavMesh,
        position: Vec3,
        destination: Vec3,
        force_update: bool,
        dt: f32,
    ) -> Vec3 {
        match self.settings.mode {
            NavigationMode::Direct => self.advance_direct(position, destination),
            NavigationMode::MeshConstrained => self.advance_mesh(nav_mesh, position, destination, force_update, dt),
        }
    }

    fn advance_direct(&mut self, position: Vec3, destination: Vec3) -> Vec3 {
        self.path.raw_destination = Some(destination);
        self.path.mesh_destination = Some(destination);
        self.path.computed = true;

        if ground_distance(position, destination) <= self.settings.jump_distance {
            return Vec3::ZERO;
        }
        ground_direction_or(destination - position, Vec3::ZERO)
    }

    fn advance_mesh(
        &mut self,
        nav_mesh: &dyn NavMesh,
        position: Vec3,
        destination: Vec3,
        force_update: bool,
        dt: f32,
    ) -> Vec3 {
        self.refresh_timer += dt;

        let destination_jumped = self
            .path
            .raw_destination
            .map_or(true, |previous| previous.distance(destination) > DESTINATION_JUMP_THRESHOLD);

        if force_update || destination_jumped || self.needs_refresh(nav_mesh, position, destination) {
            self.recompute(nav_mesh, position, destination);
        }

        self.follow(position)
    }

    fn needs_refresh(&self, nav_mesh: &dyn NavMesh, position: Vec3, destination: Vec3) -> bool {
        if self.refresh_timer >= self.settings.refresh_interval || !self.has_path(position) {
            return true;
        }

        // Последний угол не совпадает с текущим destination (частичный путь или дрейф цели)
        if let Some(last) = self.path.waypoints.last() {
            let target = nav_mesh.sample_position(destination, self.settings.snap_distance);
            if target.map_or(true, |target| last.distance(target) > CORNER_MATCH_TOLERANCE) {
                return true;
            }
        }

        if let (Some(waypoint), Some(previous)) = (self.path.current_waypoint(), self.last_leg_direction) {
            let facing = ground_direction_or(waypoint - position, previous);
            if facing.dot(previous) < FACING_COS_THRESHOLD {
                return true;
            }
        }

        // Новое препятствие на текущем отрезке
        match self.path.current_leg() {
            Some((from, to)) => nav_mesh.raycast_blocked(from, to),
            None => false,
        }
    }

    /// Пустой путь считается отсутствующим, если агент ещё не у mesh destination
    fn has_path(&self, position: Vec3) -> bool {
        if !self.path.computed {
            return false;
        }
        if !self.path.waypoints.is_empty() {
            return true;
        }
        self.path
            .mesh_destination
            .is_some_and(|target| ground_distance(position, target) <= self.settings.jump_distance)
    }

    fn recompute(&mut self, nav_mesh: &dyn NavMesh, position: Vec3, destination: Vec3) {
        self.refresh_timer = 0.0;
        self.recompute_count += 1;
        self.last_leg_direction = None;
        self.path.computed = true;
        self.path.raw_destination = Some(destination);
        self.path.clear();

        let Some(target) = nav_mesh.sample_position(destination, self.settings.snap_distance) else {
            self.path.mesh_destination = None;
            return;
        };
        self.path.mesh_destination = Some(target);

        // Путь к собственной позиции - no-op
        if ground_distance(position, target) < 1e-3 {
            return;
        }

        let corners = nav_mesh.compute_path(position, target);
        if corners.len() < 2 {
            return;
        }
        self.path.waypoints = corners;
        self.path.cursor = PathCursor::starting_at(1);
    }

    fn follow(&mut self, position: Vec3) -> Vec3 {
        if self.path.waypoints.len() < 2 {
            return Vec3::ZERO;
        }

        let Some(waypoint) = step_waypoint(
            position,
            &self.path.waypoints,
            &mut self.path.cursor,
            self.settings.jump_distance,
            EndPathMode::Stop,
        ) else {
            return Vec3::ZERO;
        };

        if self.path.cursor.finished && ground_distance(position, waypoint) <= self.settings.jump_distance {
            return Vec3::ZERO;
        }

        let direction = ground_direction_or(waypoint - position, Vec3::ZERO);
        if direction != Vec3::ZERO {
            self.last_leg_direction = Some(direction);
        }
        direction
    }

    /// Сброс пути (смена behavior)
    pub fn reset(&mut self) {
        self.path = PathState::default();
        self.refresh_timer = 0.0;
        self.last_leg_direction = None;
    }

    pub fn is_arrived(&self) -> bool {
        self.path.computed && self.path.is_arrived()
    }
}
