//! SpatialWorld - headless SpatialQuery поверх AABB тел
//!
//! Пересобирается каждый тик из (Transform, PhysicalBody, Health).
//! Тела хранятся отсортированными по Entity - overlap/raycast детерминированы.

use bevy::math::bounding::{BoundingSphere, IntersectsVolume};
use bevy::prelude::*;

use super::{RayHit, SpatialBody, SpatialQuery};
use crate::components::{Health, PhysicalBody};
use crate::shared::{contains_point, ray_intersection, LayerMask};

#[derive(Resource, Debug, Default, Clone)]
pub struct SpatialWorld {
    bodies: Vec<SpatialBody>,
}

impl SpatialWorld {
    pub fn insert(&mut self, body: SpatialBody) {
        let index = self.bodies.partition_point(|b| b.entity < body.entity);
        if self.bodies.get(index).is_some_and(|b| b.entity == body.entity) {
            self.bodies[index] = body;
        } else {
            self.bodies.insert(index, body);
        }
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    pub fn bodies(&self) -> &[SpatialBody] {
        &self.bodies
    }
}

impl SpatialQuery for SpatialWorld {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<SpatialBody> {
        let sphere = BoundingSphere::new(center, radius);
        self.bodies
            .iter()
            .filter(|body| body.layer.intersects(mask) && sphere.intersects(&body.bounds))
            .cloned()
            .collect()
    }

    fn line_of_sight(&self, from: Vec3, to: Vec3, mask: LayerMask) -> Option<RayHit> {
        let delta = to - from;
        let length = delta.length();
        if length < 1e-6 {
            return None;
        }
        let direction = delta / length;

        let mut best: Option<RayHit> = None;
        for body in &self.bodies {
            if !body.layer.intersects(mask) || contains_point(&body.bounds, from) {
                continue;
            }
            let Some(distance) = ray_intersection(&body.bounds, from, direction, length) else {
                continue;
            };
            // Строгое сравнение: при равной дистанции побеждает меньший Entity
            if best.map_or(true, |hit| distance < hit.distance) {
                best = Some(RayHit {
                    entity: body.entity,
                    point: from + direction * distance,
                    distance,
                });
            }
        }
        best
    }

    fn body(&self, entity: Entity) -> Option<SpatialBody> {
        self.bodies
            .binary_search_by(|b| b.entity.cmp(&entity))
            .ok()
            .map(|index| self.bodies[index].clone())
    }
}

/// Система: пересборка SpatialWorld из ECS (первая фаза тика)
pub fn sync_spatial_world(
    mut world: ResMut<SpatialWorld>,
    bodies: Query<(Entity, &Transform, &PhysicalBody, Option<&Health>)>,
) {
    world.clear();
    for (entity, transform, body, health) in bodies.iter() {
        world.insert(SpatialBody {
            entity,
            bounds: body.bounds_at(transform.translation),
            layer: body.layer,
            tag: body.tag.clone(),
            alive: health.map_or(true, Health::is_alive),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::aabb;

    fn body(index: u32, center: Vec3, half: Vec3, layer: LayerMask) -> SpatialBody {
        SpatialBody {
            entity: Entity::from_raw(index),
            bounds: aabb(center, half),
            layer,
            tag: None,
            alive: true,
        }
    }

    #[test]
    fn test_overlap_filters_by_layer_and_radius() {
        let mut world = SpatialWorld::default();
        world.insert(body(1, Vec3::new(3.0, 0.0, 0.0), Vec3::splat(0.5), LayerMask::ACTORS));
        world.insert(body(2, Vec3::new(3.0, 0.0, 0.0), Vec3::splat(0.5), LayerMask::ENVIRONMENT));
        world.insert(body(3, Vec3::new(30.0, 0.0, 0.0), Vec3::splat(0.5), LayerMask::ACTORS));

        let found = world.overlap_sphere(Vec3::ZERO, 5.0, LayerMask::ACTORS);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entity, Entity::from_raw(1));
    }

    #[test]
    fn test_line_of_sight_returns_first_hit() {
        let mut world = SpatialWorld::default();
        world.insert(body(1, Vec3::new(8.0, 0.0, 0.0), Vec3::splat(0.5), LayerMask::ENVIRONMENT));
        world.insert(body(2, Vec3::new(4.0, 0.0, 0.0), Vec3::splat(0.5), LayerMask::ENVIRONMENT));

        let hit = world
            .line_of_sight(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), LayerMask::ENVIRONMENT)
            .unwrap();
        assert_eq!(hit.entity, Entity::from_raw(2));
        assert!((hit.distance - 3.5).abs() < 1e-5);

        // Другой слой - промах
        assert!(world
            .line_of_sight(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), LayerMask::ACTORS)
            .is_none());
    }

    #[test]
    fn test_line_of_sight_ignores_body_containing_origin() {
        let mut world = SpatialWorld::default();
        world.insert(body(1, Vec3::ZERO, Vec3::splat(1.0), LayerMask::ACTORS));

        assert!(world
            .line_of_sight(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), LayerMask::ACTORS)
            .is_none());
        assert!(world.body(Entity::from_raw(1)).is_some());
        assert!(world.body(Entity::from_raw(7)).is_none());
    }
}
