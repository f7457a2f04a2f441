//! Intent - per-tick выход AI для locomotion engine
//!
//! Архитектура:
//! - Ровно один sub-behavior пишет AgentIntent за тик
//! - Overrides (damage detector, escape) могут перезаписать отдельные поля
//! - Locomotion (внешний collaborator) читает и применяет

use bevy::prelude::*;

use crate::shared::flatten;

/// Per-tick intent агента
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct AgentIntent {
    /// Направление движения (ground-projected, normalized или ZERO)
    pub move_direction: Vec3,
    /// Направление взгляда (world space)
    pub look_direction: Vec3,
    pub running: bool,
    /// Прицеливание (ranged aim pose)
    pub attack_pose: bool,
    pub attacking: bool,
}

impl AgentIntent {
    /// "Stopped" intent: стоим, смотрим вперёд, без атаки
    pub fn stopped(forward: Vec3) -> Self {
        Self {
            look_direction: forward,
            ..Default::default()
        }
    }

    /// Движение с взглядом по ходу (или forward если стоим)
    pub fn moving(direction: Vec3, forward: Vec3) -> Self {
        let move_direction = flatten(direction);
        let look_direction = if move_direction.length_squared() > 1e-6 {
            move_direction
        } else {
            forward
        };
        Self {
            move_direction,
            look_direction,
            ..Default::default()
        }
    }

    pub fn with_running(mut self, running: bool) -> Self {
        self.running = running;
        self
    }

    pub fn clear_attack(&mut self) {
        self.attack_pose = false;
        self.attacking = false;
    }

    pub fn is_moving(&self) -> bool {
        self.move_direction.length_squared() > 1e-6
    }
}

/// Тип действия атаки (для locomotion set_attacking)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum AttackKind {
    Melee,
    Ranged,
}

/// Какой sub-behavior писал intent в этом тике
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum BehaviorKind {
    Wander,
    FollowPath,
    WanderArea,
    FollowPoint,
    Attack,
    Escape,
}

impl BehaviorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorKind::Wander => "wander",
            BehaviorKind::FollowPath => "follow_path",
            BehaviorKind::WanderArea => "wander_area",
            BehaviorKind::FollowPoint => "follow_point",
            BehaviorKind::Attack => "attack",
            BehaviorKind::Escape => "escape",
        }
    }
}

/// Debug/gizmo hook: активный sub-behavior + имя state controller'а
#[derive(Component, Debug, Clone, Default)]
pub struct ActiveBehavior {
    pub kind: Option<BehaviorKind>,
    pub state: &'static str,
}

impl ActiveBehavior {
    /// Label для debug overlay ("Patrol/follow_path")
    pub fn label(&self) -> String {
        match self.kind {
            Some(kind) => format!("{}/{}", self.state, kind.as_str()),
            None => self.state.to_string(),
        }
    }
}

/// Текст для debug overlay над агентом (обновляется каждый тик)
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentDebugLabel(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_intent_looks_along_movement() {
        let intent = AgentIntent::moving(Vec3::new(1.0, 3.0, 0.0), Vec3::Z);
        assert_eq!(intent.move_direction, Vec3::X);
        assert_eq!(intent.look_direction, Vec3::X);
        assert!(intent.is_moving());

        let idle = AgentIntent::moving(Vec3::ZERO, Vec3::Z);
        assert_eq!(idle.look_direction, Vec3::Z);
        assert!(!idle.is_moving());
    }

    #[test]
    fn test_active_behavior_label() {
        let active = ActiveBehavior {
            kind: Some(BehaviorKind::FollowPath),
            state: "Patrol",
        };
        assert_eq!(active.label(), "Patrol/follow_path");
        assert_eq!(ActiveBehavior::default().label(), "");
    }
}
