//! Bounding volume helpers поверх `bevy::math::bounding::Aabb3d`
//!
//! Aabb3d хранит Vec3A - здесь конверсии в Vec3 и point queries,
//! которых нет в BoundingVolume trait.

use bevy::math::bounding::{Aabb3d, BoundingVolume};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub fn aabb(center: Vec3, half_size: Vec3) -> Aabb3d {
    Aabb3d::new(center, half_size.abs())
}

pub fn center(bounds: &Aabb3d) -> Vec3 {
    Vec3::from(bounds.center())
}

pub fn half_size(bounds: &Aabb3d) -> Vec3 {
    Vec3::from(bounds.half_size())
}

pub fn contains_point(bounds: &Aabb3d, point: Vec3) -> bool {
    let min = Vec3::from(bounds.min);
    let max = Vec3::from(bounds.max);
    point.cmpge(min).all() && point.cmple(max).all()
}

/// Containment только в XZ плоскости (высота игнорируется)
pub fn contains_point_xz(bounds: &Aabb3d, point: Vec3) -> bool {
    point.x >= bounds.min.x
        && point.x <= bounds.max.x
        && point.z >= bounds.min.z
        && point.z <= bounds.max.z
}

pub fn closest_point(bounds: &Aabb3d, point: Vec3) -> Vec3 {
    point.clamp(Vec3::from(bounds.min), Vec3::from(bounds.max))
}

/// Горизонтальный "радиус" объёма (половина диагонали в XZ)
pub fn horizontal_extent(bounds: &Aabb3d) -> f32 {
    let half = half_size(bounds);
    Vec2::new(half.x, half.z).length()
}

pub fn is_degenerate(bounds: &Aabb3d) -> bool {
    let half = half_size(bounds);
    half.x <= 0.0 || half.y <= 0.0 || half.z <= 0.0
}

/// Slab test: расстояние вдоль луча до входа в объём (None - промах)
///
/// `direction` должен быть нормализован, `max_distance` - длина сегмента.
pub fn ray_intersection(bounds: &Aabb3d, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
    let min = Vec3::from(bounds.min);
    let max = Vec3::from(bounds.max);

    let mut t_enter = 0.0_f32;
    let mut t_exit = max_distance;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-8 {
            // Луч параллелен slab - промах если origin вне
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}

/// Authoring-формат объёма (center + half_size) - Aabb3d не serde
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct AreaBounds {
    pub center: Vec3,
    pub half_size: Vec3,
}

impl AreaBounds {
    pub fn new(center: Vec3, half_size: Vec3) -> Self {
        debug_assert!(
            half_size.x > 0.0 && half_size.z > 0.0,
            "AreaBounds: empty bounds {:?}",
            half_size
        );
        Self { center, half_size }
    }

    pub fn to_aabb(&self) -> Aabb3d {
        aabb(self.center, self.half_size)
    }
}
