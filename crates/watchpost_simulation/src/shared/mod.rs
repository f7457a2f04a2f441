//! Shared domain - cross-cutting утилиты
//!
//! - layers: LayerMask (collision groups для spatial queries)
//! - bounds: Aabb3d helpers + AreaBounds (authoring формат)
//! - ground projection helpers (все AI решения в XZ плоскости)

pub mod bounds;
pub mod layers;

pub use bounds::*;
pub use layers::*;

use bevy::prelude::*;

/// Проекция на ground plane (Y = 0)
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Горизонтальная дистанция между точками
pub fn ground_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length()
}

/// Угол между векторами в градусах (0 если один из них нулевой)
pub fn angle_degrees(a: Vec3, b: Vec3) -> f32 {
    if a.length_squared() < 1e-8 || b.length_squared() < 1e-8 {
        return 0.0;
    }
    a.angle_between(b).to_degrees()
}

/// Нормализованное направление в XZ или fallback
pub fn ground_direction_or(v: Vec3, fallback: Vec3) -> Vec3 {
    let flat = flatten(v);
    if flat.length_squared() > 1e-8 {
        flat.normalize()
    } else {
        fallback
    }
}
