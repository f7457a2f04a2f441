//! WanderArea - случайные точки внутри заданного объёма (XZ)

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::wander::Roam;
use super::{AgentContext, SubBehavior};
use crate::components::{AgentIntent, BehaviorKind};
use crate::shared::AreaBounds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct WanderAreaConfig {
    pub area: AreaBounds,
    pub wait_time: f32,
    pub point_reached_distance: f32,
    pub run: bool,
}

impl Default for WanderAreaConfig {
    fn default() -> Self {
        Self {
            area: AreaBounds {
                center: Vec3::ZERO,
                half_size: Vec3::new(5.0, 2.0, 5.0),
            },
            wait_time: 2.0,
            point_reached_distance: 1.5,
            run: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WanderAreaBehavior {
    pub config: WanderAreaConfig,
    roam: Roam,
}

impl WanderAreaBehavior {
    pub fn new(config: WanderAreaConfig) -> Self {
        debug_assert!(
            config.area.half_size.x > 0.0 && config.area.half_size.z > 0.0,
            "WanderArea: empty area"
        );
        Self {
            config,
            roam: Roam::default(),
        }
    }

    pub fn current_point(&self) -> Option<Vec3> {
        self.roam.point
    }
}

/// Случайная точка внутри AreaBounds (XZ), высота агента
pub fn random_point_in_area(rng: &mut impl Rng, area: &AreaBounds, height: f32) -> Vec3 {
    let half = area.half_size.abs();
    let x = if half.x > 0.0 { rng.gen_range(-half.x..=half.x) } else { 0.0 };
    let z = if half.z > 0.0 { rng.gen_range(-half.z..=half.z) } else { 0.0 };
    Vec3::new(area.center.x + x, height, area.center.z + z)
}

impl SubBehavior for WanderAreaBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::WanderArea
    }

    fn tick(&mut self, ctx: &mut AgentContext) -> AgentIntent {
        let area = self.config.area;
        self.roam.tick(
            ctx,
            self.config.wait_time,
            self.config.point_reached_distance,
            self.config.run,
            |ctx| Some(random_point_in_area(&mut *ctx.rng, &area, ctx.position.y)),
        )
    }

    fn reset(&mut self) {
        self.roam.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::test_support::TestAgent;
    use crate::shared::contains_point_xz;

    #[test]
    fn test_points_stay_inside_area() {
        let area = AreaBounds::new(Vec3::new(20.0, 0.0, -4.0), Vec3::new(3.0, 1.0, 2.0));
        let mut agent = TestAgent::new(Vec3::ZERO);

        for _ in 0..100 {
            let point = random_point_in_area(&mut agent.rng, &area, 0.0);
            assert!(contains_point_xz(&area.to_aabb(), point));
        }
    }

    #[test]
    fn test_agent_walks_into_area() {
        let area = AreaBounds::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 2.0));
        let mut agent = TestAgent::new(Vec3::ZERO);
        let mut behavior = WanderAreaBehavior::new(WanderAreaConfig {
            area,
            ..Default::default()
        });

        let dt = 0.1;
        for _ in 0..100 {
            let intent = behavior.tick(&mut agent.ctx(dt));
            agent.step(&intent, 4.0, dt);
        }

        // Агент внутри области (с запасом на point_reached_distance)
        let grown = AreaBounds::new(area.center, area.half_size + Vec3::splat(1.5));
        assert!(contains_point_xz(&grown.to_aabb(), agent.position), "agent at {:?}", agent.position);
    }
}
