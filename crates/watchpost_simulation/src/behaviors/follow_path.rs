//! FollowPath - обход фиксированного маршрута патруля
//!
//! Маршрут - raw waypoint list; шаг по waypoint'ам тот же, что у mesh пути
//! (`step_waypoint`), между waypoint'ами движение идёт через Navigator.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{AgentContext, SubBehavior};
use crate::components::{AgentIntent, BehaviorKind};
use crate::navigation::{step_waypoint, EndPathMode, PathCursor};
use crate::shared::ground_distance;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct PatrolRoute {
    pub waypoints: Vec<Vec3>,
    pub end_mode: EndPathMode,
    /// Waypoint достигнут в этом радиусе (не меньше jump distance навигатора)
    pub jump_distance: f32,
    pub run: bool,
}

impl Default for PatrolRoute {
    fn default() -> Self {
        Self {
            waypoints: Vec::new(),
            end_mode: EndPathMode::InvertPath,
            jump_distance: 1.0,
            run: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FollowPathBehavior {
    pub route: PatrolRoute,
    cursor: PathCursor,
    started: bool,
}

impl FollowPathBehavior {
    pub fn new(route: PatrolRoute) -> Self {
        Self {
            route,
            cursor: PathCursor::default(),
            started: false,
        }
    }

    pub fn cursor(&self) -> PathCursor {
        self.cursor
    }

    /// Ближайший waypoint - точка входа в маршрут
    fn nearest_index(&self, position: Vec3) -> usize {
        self.route
            .waypoints
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| ground_distance(position, **a).total_cmp(&ground_distance(position, **b)))
            .map_or(0, |(index, _)| index)
    }
}

impl SubBehavior for FollowPathBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::FollowPath
    }

    fn tick(&mut self, ctx: &mut AgentContext) -> AgentIntent {
        if self.route.waypoints.is_empty() {
            return ctx.stopped();
        }

        if !self.started {
            self.started = true;
            self.cursor = PathCursor::starting_at(self.nearest_index(ctx.position));
            ctx.force_path_update = true;
        }

        let jump_distance = self.route.jump_distance.max(ctx.navigator.settings.jump_distance);
        let before = self.cursor.index;
        let Some(waypoint) = step_waypoint(
            ctx.position,
            &self.route.waypoints,
            &mut self.cursor,
            jump_distance,
            self.route.end_mode,
        ) else {
            return ctx.stopped();
        };
        if self.cursor.index != before {
            ctx.force_path_update = true;
        }

        if self.cursor.finished && ctx.distance_to(waypoint) <= jump_distance {
            return ctx.stopped();
        }

        let direction = ctx.move_to(waypoint);
        AgentIntent::moving(direction, ctx.view_forward()).with_running(self.route.run)
    }

    fn reset(&mut self) {
        // Возврат на маршрут - снова с ближайшего waypoint
        self.started = false;
        self.cursor = PathCursor::default();
    }
}
