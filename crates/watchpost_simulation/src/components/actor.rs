//! Базовые компоненты агентов: Agent, Health, PhysicalBody, WeaponClass, MoveSpeed

use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{ActiveBehavior, AgentDebugLabel, AgentIntent};
use crate::shared::{aabb, LayerMask};

/// Агент (NPC под управлением controller'а)
///
/// Автоматически добавляет Health, AgentIntent, ActiveBehavior, AgentDebugLabel через Required Components.
/// `enabled = false` - агент заморожен: controller не тикает, hearing не доставляется.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(Health, AgentIntent, ActiveBehavior, AgentDebugLabel)]
pub struct Agent {
    pub enabled: bool,
}

impl Default for Agent {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Здоровье (только для фильтра "dead" в vision)
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }
}

/// Физическое тело для spatial queries (AABB вокруг Transform)
///
/// Не rigidbody - только то, что видят overlap/line-of-sight queries.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct PhysicalBody {
    /// Половина размеров AABB
    pub half_size: Vec3,
    /// Смещение центра от Transform.translation (обычно вверх на половину роста)
    pub center_offset: Vec3,
    /// На каком слое находится тело
    pub layer: LayerMask,
    /// Tag для vision allowlist / hazard policies ("player", "guard", ...)
    pub tag: Option<String>,
}

impl Default for PhysicalBody {
    fn default() -> Self {
        Self::actor(None)
    }
}

impl PhysicalBody {
    /// Гуманоид ~1.8м ростом на слое Actors
    pub fn actor(tag: Option<&str>) -> Self {
        Self {
            half_size: Vec3::new(0.4, 0.9, 0.4),
            center_offset: Vec3::new(0.0, 0.9, 0.0),
            layer: LayerMask::ACTORS,
            tag: tag.map(str::to_string),
        }
    }

    /// Статическое препятствие (стена, укрытие) на слое Environment
    pub fn obstacle(half_size: Vec3) -> Self {
        Self {
            half_size,
            center_offset: Vec3::ZERO,
            layer: LayerMask::ENVIRONMENT,
            tag: None,
        }
    }

    pub fn bounds_at(&self, translation: Vec3) -> Aabb3d {
        aabb(translation + self.center_offset, self.half_size)
    }

    /// Радиус тела в XZ (для pre-emptive hazard probe)
    pub fn radius(&self) -> f32 {
        self.half_size.x.max(self.half_size.z)
    }
}

/// Класс оружия в руках - выбирает ranged или melee ветку Attack behavior
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
#[reflect(Component)]
pub enum WeaponClass {
    /// Руки / клинок / зубы (zombie)
    #[default]
    Melee,
    /// Любое огнестрельное (gun-class item)
    Ranged,
}

impl WeaponClass {
    pub fn is_ranged(self) -> bool {
        matches!(self, WeaponClass::Ranged)
    }
}

/// Скорость движения (м/с) для headless locomotion
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[reflect(Component)]
pub struct MoveSpeed {
    pub walk: f32,
    pub run: f32,
}

impl Default for MoveSpeed {
    fn default() -> Self {
        Self { walk: 2.0, run: 5.0 }
    }
}
