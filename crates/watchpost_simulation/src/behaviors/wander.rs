//! Wander - бродим между случайными точками вокруг origin
//!
//! Цикл: выбрать точку → дойти → постоять wait_time → новая точка.
//! В mesh-constrained режиме точка принимается только если snap на mesh удался.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{AgentContext, SubBehavior};
use crate::components::{AgentIntent, BehaviorKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct WanderConfig {
    /// Радиус вокруг origin (метры)
    pub radius: f32,
    /// Пауза в точке (секунды)
    pub wait_time: f32,
    pub point_reached_distance: f32,
    pub run: bool,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            wait_time: 2.0,
            point_reached_distance: 1.5,
            run: false,
        }
    }
}

/// Общая механика "дойти до случайной точки и постоять"
#[derive(Debug, Clone, Default)]
pub(crate) struct Roam {
    pub point: Option<Vec3>,
    pub wait_timer: f32,
}

impl Roam {
    /// `pick` генерирует кандидата (None - попробовать в следующем тике)
    pub fn tick(
        &mut self,
        ctx: &mut AgentContext,
        wait_time: f32,
        reached_distance: f32,
        run: bool,
        pick: impl FnOnce(&mut AgentContext) -> Option<Vec3>,
    ) -> AgentIntent {
        if self.wait_timer > 0.0 {
            self.wait_timer -= ctx.dt;
            return ctx.stopped();
        }

        let point = match self.point {
            Some(point) => point,
            None => {
                let Some(point) = pick(ctx).and_then(|candidate| ctx.snap(candidate)) else {
                    return ctx.stopped();
                };
                ctx.force_path_update = true;
                self.point = Some(point);
                point
            }
        };

        if ctx.distance_to(point) <= reached_distance {
            self.point = None;
            self.wait_timer = wait_time;
            return ctx.stopped();
        }

        let direction = ctx.move_to(point);
        AgentIntent::moving(direction, ctx.view_forward()).with_running(run)
    }

    pub fn reset(&mut self) {
        self.point = None;
        self.wait_timer = 0.0;
    }
}

/// Случайная точка в круге радиуса `radius` вокруг `origin` (ground plane)
pub fn random_point_in_circle(rng: &mut impl Rng, origin: Vec3, radius: f32) -> Vec3 {
    let angle = rng.gen_range(0.0..TAU);
    // sqrt - равномерно по площади
    let distance = radius * rng.gen::<f32>().sqrt();
    origin + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance)
}

#[derive(Debug, Clone, Default)]
pub struct WanderBehavior {
    pub config: WanderConfig,
    /// Центр блуждания (spawn или последняя известная позиция цели)
    pub origin: Vec3,
    roam: Roam,
}

impl WanderBehavior {
    pub fn new(config: WanderConfig, origin: Vec3) -> Self {
        Self {
            config,
            origin,
            roam: Roam::default(),
        }
    }

    pub fn set_origin(&mut self, origin: Vec3) {
        self.origin = origin;
        self.roam.reset();
    }

    pub fn current_point(&self) -> Option<Vec3> {
        self.roam.point
    }
}

impl SubBehavior for WanderBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Wander
    }

    fn tick(&mut self, ctx: &mut AgentContext) -> AgentIntent {
        let (origin, radius) = (self.origin, self.config.radius);
        self.roam.tick(
            ctx,
            self.config.wait_time,
            self.config.point_reached_distance,
            self.config.run,
            |ctx| Some(random_point_in_circle(&mut *ctx.rng, Vec3::new(origin.x, ctx.position.y, origin.z), radius)),
        )
    }

    fn reset(&mut self) {
        self.roam.reset();
    }
}
