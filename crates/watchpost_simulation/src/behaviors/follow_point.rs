//! FollowPoint - дойти до конкретной точки (звук, последняя позиция цели)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{AgentContext, SubBehavior};
use crate::components::{AgentIntent, BehaviorKind};
use crate::shared::ground_distance;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct FollowPointConfig {
    /// Точка достигнута в этом радиусе
    pub stop_distance: f32,
    /// Дальше этого - бежим
    pub start_run_distance: f32,
}

impl Default for FollowPointConfig {
    fn default() -> Self {
        Self {
            stop_distance: 1.5,
            start_run_distance: 8.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FollowPointBehavior {
    pub config: FollowPointConfig,
    point: Option<Vec3>,
}

impl FollowPointBehavior {
    pub fn new(config: FollowPointConfig) -> Self {
        Self { config, point: None }
    }

    pub fn set_point(&mut self, point: Option<Vec3>) {
        self.point = point;
    }

    pub fn point(&self) -> Option<Vec3> {
        self.point
    }

    /// Нет точки - считаем что пришли
    pub fn is_reached(&self, position: Vec3) -> bool {
        self.point
            .map_or(true, |point| ground_distance(position, point) <= self.config.stop_distance)
    }
}

impl SubBehavior for FollowPointBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::FollowPoint
    }

    fn tick(&mut self, ctx: &mut AgentContext) -> AgentIntent {
        let Some(point) = self.point else {
            return ctx.stopped();
        };

        let distance = ctx.distance_to(point);
        if distance <= self.config.stop_distance {
            return ctx.stopped();
        }

        let direction = ctx.move_to(point);
        AgentIntent::moving(direction, ctx.view_forward()).with_running(distance > self.config.start_run_distance)
    }

    fn reset(&mut self) {
        self.point = None;
    }
}
