//! Attack sub-behavior - ranged (distance bands) или melee
//!
//! Ranged: каждый тик выбирается sub-state по дистанции до цели:
//! - distance < min_distance → closest_policy (StayStill | FlankTarget)
//! - distance > max_distance → MoveToTarget
//! - иначе → in_area_policy
//!
//! Melee: идём к ближайшей точке bounds цели, атакуем в melee_attack_distance.
//! Класс оружия (WeaponClass) выбирает режим.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{AgentContext, SubBehavior};
use crate::components::{AgentIntent, BehaviorKind};
use crate::shared::{angle_degrees, closest_point, ground_direction_or, LayerMask};
use crate::world::SpatialBody;

/// Policy для дистанционной полосы (closest / in-area)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Reflect)]
pub enum RangedPolicy {
    StayStill,
    FlankTarget,
}

/// Текущий ranged sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum RangedState {
    StayStill,
    FlankTarget,
    MoveToTarget,
}

impl From<RangedPolicy> for RangedState {
    fn from(policy: RangedPolicy) -> Self {
        match policy {
            RangedPolicy::StayStill => RangedState::StayStill,
            RangedPolicy::FlankTarget => RangedState::FlankTarget,
        }
    }
}

/// Когда включать aim pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum FirePoseMode {
    Always,
    #[default]
    WithinShotDistance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct AttackConfig {
    pub min_distance: f32,
    pub max_distance: f32,
    pub closest_policy: RangedPolicy,
    pub in_area_policy: RangedPolicy,
    /// Период смены flank точки (секунды)
    pub flank_interval: f32,
    pub start_run_distance: f32,
    pub stop_distance: f32,
    pub max_shot_distance: f32,
    /// Допуск angle(°) × distance(m) для валидного выстрела
    pub precision: f32,
    pub fire_pose: FirePoseMode,
    pub obstacle_mask: LayerMask,
    pub melee_attack_distance: f32,
    pub melee_run_distance: f32,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            min_distance: 4.0,
            max_distance: 12.0,
            closest_policy: RangedPolicy::FlankTarget,
            in_area_policy: RangedPolicy::StayStill,
            flank_interval: 3.0,
            start_run_distance: 6.0,
            stop_distance: 0.5,
            max_shot_distance: 25.0,
            precision: 10.0,
            fire_pose: FirePoseMode::WithinShotDistance,
            obstacle_mask: LayerMask::ENVIRONMENT,
            melee_attack_distance: 1.5,
            melee_run_distance: 6.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttackBehavior {
    pub config: AttackConfig,
    target: Option<Entity>,
    /// None - ещё не выбран (следующий выбор считается переходом)
    state: Option<RangedState>,
    /// Countdown до следующего flank roll
    flank_timer: f32,
    flank_point: Option<Vec3>,
}

impl AttackBehavior {
    pub fn new(config: AttackConfig) -> Self {
        debug_assert!(
            config.min_distance <= config.max_distance,
            "AttackConfig: min_distance > max_distance"
        );
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn set_target(&mut self, target: Option<Entity>) {
        if self.target != target {
            self.target = target;
            self.state = None;
            self.flank_point = None;
        }
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn state(&self) -> Option<RangedState> {
        self.state
    }

    pub fn flank_point(&self) -> Option<Vec3> {
        self.flank_point
    }

    /// Ranged sub-state для дистанции до цели
    pub fn select_state(&self, distance: f32) -> RangedState {
        if distance < self.config.min_distance {
            self.config.closest_policy.into()
        } else if distance > self.config.max_distance {
            RangedState::MoveToTarget
        } else {
            self.config.in_area_policy.into()
        }
    }

    /// Можно ли стрелять: дистанция, точность прицела, line-of-sight
    pub fn target_is_on_shot_view(&self, ctx: &AgentContext, target: &SpatialBody) -> bool {
        let origin = ctx.center();
        let to_target = target.center() - origin;
        let distance = to_target.length();

        if distance > self.config.max_shot_distance {
            return false;
        }
        if angle_degrees(ctx.view_forward(), to_target) * distance > self.config.precision {
            return false;
        }

        match ctx
            .spatial
            .line_of_sight(origin, target.center(), self.config.obstacle_mask)
        {
            Some(hit) => hit.entity == target.entity,
            None => true,
        }
    }

    fn ranged_tick(&mut self, ctx: &mut AgentContext, target: &SpatialBody) -> AgentIntent {
        let target_center = target.center();
        let distance = ctx.distance_to(target_center);

        // ===== Sub-state selection =====
        let next = self.select_state(distance);
        if self.state != Some(next) {
            self.state = Some(next);
            ctx.force_path_update = true;
            if next == RangedState::FlankTarget {
                self.flank_timer = 0.0;
                self.flank_point = None;
            }
        }

        let destination = match next {
            RangedState::StayStill => None,
            RangedState::MoveToTarget => Some(Vec3::new(target_center.x, ctx.position.y, target_center.z)),
            RangedState::FlankTarget => {
                self.flank_timer -= ctx.dt;
                if self.flank_timer <= 0.0 {
                    self.roll_flank_point(ctx, target_center);
                }
                self.flank_point
            }
        };

        // ===== Movement =====
        let mut intent = match destination {
            Some(point) => {
                let remaining = ctx.distance_to(point);
                if remaining <= self.config.stop_distance {
                    AgentIntent::default()
                } else {
                    let direction = ctx.move_to(point);
                    AgentIntent::moving(direction, ctx.view_forward())
                        .with_running(remaining > self.config.start_run_distance)
                }
            }
            None => AgentIntent::default(),
        };

        // ===== Aim =====
        intent.look_direction = (target_center - ctx.center()).normalize_or(ctx.view_forward());
        intent.attack_pose = match self.config.fire_pose {
            FirePoseMode::Always => true,
            FirePoseMode::WithinShotDistance => {
                ctx.center().distance(target_center) <= self.config.max_shot_distance
            }
        };
        intent.attacking = intent.attack_pose && self.target_is_on_shot_view(ctx, target);
        intent
    }

    /// Новая flank точка; при неудачном snap - повтор в следующем тике
    fn roll_flank_point(&mut self, ctx: &mut AgentContext, target_center: Vec3) {
        let candidate = flank_point(
            &mut *ctx.rng,
            ctx.position,
            target_center,
            self.config.min_distance,
            self.config.max_distance,
        );
        if let Some(point) = ctx.snap(candidate) {
            self.flank_point = Some(point);
            self.flank_timer = self.config.flank_interval;
            ctx.force_path_update = true;
        }
    }

    fn melee_tick(&mut self, ctx: &mut AgentContext, target: &SpatialBody) -> AgentIntent {
        let closest = closest_point(&target.bounds, ctx.center());
        let destination = Vec3::new(closest.x, ctx.position.y, closest.z);
        let distance = ctx.distance_to(destination);
        let look = ground_direction_or(target.center() - ctx.position, ctx.view_forward());

        if distance <= self.config.melee_attack_distance {
            return AgentIntent {
                look_direction: look,
                attacking: true,
                ..Default::default()
            };
        }

        let direction = ctx.move_to(destination);
        let mut intent = AgentIntent::moving(direction, ctx.view_forward())
            .with_running(distance > self.config.melee_run_distance);
        intent.look_direction = look;
        intent
    }
}

/// Случайная flank точка: слева или справа от цели (перпендикуляр к линии
/// цель → агент), на расстоянии [min, max] от цели в XZ
pub fn flank_point(rng: &mut impl Rng, position: Vec3, target_center: Vec3, min: f32, max: f32) -> Vec3 {
    let away = ground_direction_or(position - target_center, Vec3::Z);
    let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    let radius = if max > min { rng.gen_range(min..=max) } else { min };
    let perpendicular = Vec3::Y.cross(away) * side;
    Vec3::new(target_center.x, position.y, target_center.z) + perpendicular * radius
}

impl SubBehavior for AttackBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Attack
    }

    fn tick(&mut self, ctx: &mut AgentContext) -> AgentIntent {
        let Some(target) = self.target.and_then(|entity| ctx.spatial.body(entity)) else {
            return ctx.stopped();
        };
        if !target.alive {
            return ctx.stopped();
        }

        if ctx.weapon.is_ranged() {
            self.ranged_tick(ctx, &target)
        } else {
            self.melee_tick(ctx, &target)
        }
    }

    fn reset(&mut self) {
        self.state = None;
        self.flank_timer = 0.0;
        self.flank_point = None;
    }
}
