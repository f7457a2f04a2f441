//! Field of View - периодический поиск ближайшей видимой цели
//!
//! Filter chain (порядок важен):
//! 1. не сам агент
//! 2. угол от forward ≤ half-angle
//! 3. tag allowlist (если задан)
//! 4. line-of-sight по obstacle слоям (первое попадание - сама цель или ничего)
//! 5. живые
//!
//! Выбор: ближайший по дистанции center → center (tie → меньший Entity).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::{angle_degrees, LayerMask};
use crate::world::{SpatialBody, SpatialQuery};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct FieldOfViewConfig {
    /// Дальность зрения (метры)
    pub distance: f32,
    /// Половина угла конуса (градусы)
    pub angle: f32,
    /// Период опроса (секунды)
    pub refresh_interval: f32,
    pub target_mask: LayerMask,
    pub obstacle_mask: LayerMask,
    /// Allowlist тегов (пусто - любые)
    pub tags: Vec<String>,
}

impl Default for FieldOfViewConfig {
    fn default() -> Self {
        Self {
            distance: 20.0,
            angle: 60.0,
            refresh_interval: 0.2,
            target_mask: LayerMask::ACTORS,
            obstacle_mask: LayerMask::ENVIRONMENT,
            tags: Vec::new(),
        }
    }
}

/// Откуда и куда смотрит сенсор
#[derive(Debug, Clone, Copy)]
pub struct ViewPivot {
    pub entity: Entity,
    pub center: Vec3,
    pub forward: Vec3,
}

impl ViewPivot {
    /// forward = look direction, fallback на forward тела если look ≈ 0
    pub fn new(entity: Entity, center: Vec3, look: Vec3, body_forward: Vec3) -> Self {
        let forward = if look.length_squared() > 1e-6 { look } else { body_forward };
        Self { entity, center, forward }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOfViewReading {
    pub nearest: Option<Entity>,
    /// Где ближайшая цель была видна в последний раз (переживает потерю)
    pub last_seen_position: Option<Vec3>,
    /// Все прошедшие фильтры, отсортированы по дистанции
    pub candidates: Vec<Entity>,
}

#[derive(Component, Debug, Clone, Default)]
pub struct FieldOfView {
    pub config: FieldOfViewConfig,
    timer: f32,
    has_scanned: bool,
    pub reading: FieldOfViewReading,
}

impl FieldOfView {
    pub fn new(config: FieldOfViewConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Вызывается каждый тик; реальный query только раз в refresh_interval
    pub fn scan(&mut self, spatial: &dyn SpatialQuery, pivot: &ViewPivot, dt: f32) -> Option<Entity> {
        self.timer += dt;
        if !self.has_scanned || self.timer >= self.config.refresh_interval {
            self.timer = 0.0;
            self.has_scanned = true;

            let candidates = self.query(spatial, pivot);
            self.reading.nearest = candidates.first().map(|body| body.entity);
            if let Some(nearest) = candidates.first() {
                self.reading.last_seen_position = Some(nearest.center());
            }
            self.reading.candidates = candidates.into_iter().map(|body| body.entity).collect();
        }
        self.reading.nearest
    }

    pub fn nearest(&self) -> Option<Entity> {
        self.reading.nearest
    }

    /// Stateless query: все цели, прошедшие filter chain, ближайшая первой
    pub fn query(&self, spatial: &dyn SpatialQuery, pivot: &ViewPivot) -> Vec<SpatialBody> {
        let config = &self.config;
        let mut candidates: Vec<(f32, SpatialBody)> = spatial
            .overlap_sphere(pivot.center, config.distance, config.target_mask)
            .into_iter()
            .filter(|body| body.entity != pivot.entity)
            .filter(|body| angle_degrees(pivot.forward, body.center() - pivot.center) <= config.angle)
            .filter(|body| {
                config.tags.is_empty() || config.tags.iter().any(|tag| body.has_tag(tag))
            })
            .filter(|body| self.is_unobstructed(spatial, pivot.center, body))
            .filter(|body| body.alive)
            .map(|body| (pivot.center.distance(body.center()), body))
            .collect();

        candidates.sort_by(|(da, a), (db, b)| da.total_cmp(db).then_with(|| a.entity.cmp(&b.entity)));
        candidates.into_iter().map(|(_, body)| body).collect()
    }

    /// Точка в конусе и ничем не закрыта
    pub fn is_point_on_view(&self, spatial: &dyn SpatialQuery, pivot: &ViewPivot, point: Vec3) -> bool {
        self.in_cone(pivot, point)
            && spatial
                .line_of_sight(pivot.center, point, self.config.obstacle_mask)
                .is_none()
    }

    /// Тело в конусе и line-of-sight упирается в него самого (или ни во что)
    pub fn is_body_on_view(&self, spatial: &dyn SpatialQuery, pivot: &ViewPivot, body: &SpatialBody) -> bool {
        self.in_cone(pivot, body.center()) && self.is_unobstructed(spatial, pivot.center, body)
    }

    fn in_cone(&self, pivot: &ViewPivot, point: Vec3) -> bool {
        pivot.center.distance(point) <= self.config.distance
            && angle_degrees(pivot.forward, point - pivot.center) <= self.config.angle
    }

    fn is_unobstructed(&self, spatial: &dyn SpatialQuery, from: Vec3, body: &SpatialBody) -> bool {
        match spatial.line_of_sight(from, body.center(), self.config.obstacle_mask) {
            Some(hit) => hit.entity == body.entity,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::aabb;
    use crate::world::SpatialWorld;

    fn actor(index: u32, center: Vec3) -> SpatialBody {
        SpatialBody {
            entity: Entity::from_raw(index),
            bounds: aabb(center, Vec3::new(0.4, 0.9, 0.4)),
            layer: LayerMask::ACTORS,
            tag: Some("player".to_string()),
            alive: true,
        }
    }

    fn pivot() -> ViewPivot {
        ViewPivot::new(Entity::from_raw(0), Vec3::ZERO, Vec3::Z, Vec3::Z)
    }

    /// Точка на ground plane под углом `degrees` от +Z
    fn at_angle(degrees: f32, distance: f32) -> Vec3 {
        let radians = degrees.to_radians();
        Vec3::new(radians.sin() * distance, 0.0, radians.cos() * distance)
    }

    fn fov(angle: f32) -> FieldOfView {
        FieldOfView::new(FieldOfViewConfig {
            angle,
            ..Default::default()
        })
    }

    #[test]
    fn test_target_outside_angle_is_ignored() {
        let mut world = SpatialWorld::default();
        world.insert(actor(1, at_angle(95.0, 10.0)));

        let mut fov = fov(90.0);
        assert_eq!(fov.scan(&world, &pivot(), 0.0), None);
    }

    #[test]
    fn test_target_inside_angle_is_selected() {
        let mut world = SpatialWorld::default();
        world.insert(actor(1, at_angle(45.0, 10.0)));

        let mut fov = fov(90.0);
        assert_eq!(fov.scan(&world, &pivot(), 0.0), Some(Entity::from_raw(1)));
        assert!(fov.reading.last_seen_position.is_some());
    }

    #[test]
    fn test_occluded_target_is_ignored() {
        let mut world = SpatialWorld::default();
        world.insert(actor(1, Vec3::new(0.0, 0.0, 10.0)));
        world.insert(SpatialBody {
            entity: Entity::from_raw(2),
            bounds: aabb(Vec3::new(0.0, 0.0, 5.0), Vec3::new(2.0, 2.0, 0.2)),
            layer: LayerMask::ENVIRONMENT,
            tag: None,
            alive: true,
        });

        let mut fov = fov(60.0);
        assert_eq!(fov.scan(&world, &pivot(), 0.0), None);
        assert!(!fov.is_point_on_view(&world, &pivot(), Vec3::new(0.0, 0.0, 10.0)));
    }

    #[test]
    fn test_filters_self_dead_and_tags() {
        let mut world = SpatialWorld::default();
        // Сам агент
        world.insert(actor(0, Vec3::ZERO));
        // Мёртвый
        let mut dead = actor(1, Vec3::new(0.0, 0.0, 3.0));
        dead.alive = false;
        world.insert(dead);
        // Чужой тег
        let mut guard = actor(2, Vec3::new(0.0, 0.0, 4.0));
        guard.tag = Some("guard".to_string());
        world.insert(guard);
        world.insert(actor(3, Vec3::new(0.0, 0.0, 8.0)));

        let mut fov = FieldOfView::new(FieldOfViewConfig {
            tags: vec!["player".to_string()],
            ..Default::default()
        });
        assert_eq!(fov.scan(&world, &pivot(), 0.0), Some(Entity::from_raw(3)));
        assert_eq!(fov.reading.candidates, vec![Entity::from_raw(3)]);
    }

    #[test]
    fn test_scan_respects_refresh_interval() {
        let mut world = SpatialWorld::default();
        let mut fov = fov(60.0);
        assert_eq!(fov.scan(&world, &pivot(), 0.0), None);

        // Цель появилась, но интервал не истёк
        world.insert(actor(1, Vec3::new(0.0, 0.0, 5.0)));
        assert_eq!(fov.scan(&world, &pivot(), 0.1), None);
        assert_eq!(fov.scan(&world, &pivot(), 0.1), Some(Entity::from_raw(1)));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let mut world = SpatialWorld::default();
        world.insert(actor(5, Vec3::new(-2.0, 0.0, 6.0)));
        world.insert(actor(3, Vec3::new(2.0, 0.0, 6.0)));
        world.insert(actor(9, Vec3::new(0.0, 0.0, 12.0)));

        let fov = fov(60.0);
        let first: Vec<_> = fov.query(&world, &pivot()).iter().map(|b| b.entity).collect();
        let second: Vec<_> = fov.query(&world, &pivot()).iter().map(|b| b.entity).collect();

        assert_eq!(first, second);
        // Равная дистанция → меньший Entity
        assert_eq!(first[0], Entity::from_raw(3));
    }
}
