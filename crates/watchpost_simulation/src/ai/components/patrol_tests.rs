//! Tests for the patrol controller.

#[cfg(test)]
mod tests {
    use super::super::patrol::{PatrolConfig, PatrolController, PatrolState};
    use crate::ai::{AgentController, Senses};
    use crate::behaviors::test_support::TestAgent;
    use crate::behaviors::{PatrolRoute, WanderAreaConfig};
    use crate::components::BehaviorKind;
    use crate::perception::HeardSound;
    use crate::shared::AreaBounds;
    use bevy::prelude::*;

    const DT: f32 = 0.5;

    fn target() -> Entity {
        Entity::from_raw(7)
    }

    fn seeing(position: Vec3) -> Senses {
        Senses {
            visible_target: Some(target()),
            visible_position: Some(position),
            target_in_view: true,
            target_alive: true,
            target_position: Some(position),
            ..Default::default()
        }
    }

    fn hearing(at: Vec3, position: Vec3) -> Senses {
        Senses {
            position,
            heard: Some(HeardSound { position: at, owner: None }),
            ..Default::default()
        }
    }

    fn attacking_patrol(target_position: Vec3) -> PatrolController {
        let mut patrol = PatrolController::new(PatrolConfig::default(), Vec3::ZERO);
        patrol.decide(&seeing(target_position), DT);
        assert_eq!(patrol.state(), PatrolState::Attacking);
        patrol
    }

    #[test]
    fn test_lose_target_after_delay() {
        // lose_target_delay = 10s, dt = 0.5 → 20 тиков вне обзора
        let last_seen = Vec3::new(8.0, 0.9, 3.0);
        let mut patrol = attacking_patrol(last_seen);
        let lost = Senses {
            target_alive: true,
            ..Default::default()
        };

        for _ in 0..19 {
            patrol.decide(&lost, DT);
        }
        assert_eq!(patrol.state(), PatrolState::Attacking);
        assert_eq!(patrol.target(), Some(target()));

        patrol.decide(&lost, DT);
        assert_eq!(patrol.state(), PatrolState::MovingToPossibleTargetPosition);
        assert_eq!(patrol.target(), None);
        assert_eq!(patrol.last_known_position(), Some(last_seen));
    }

    #[test]
    fn test_target_back_in_view_resets_lose_timer() {
        let mut patrol = attacking_patrol(Vec3::X);
        let lost = Senses {
            target_alive: true,
            ..Default::default()
        };

        for _ in 0..15 {
            patrol.decide(&lost, DT);
        }
        patrol.decide(&seeing(Vec3::X), DT);
        for _ in 0..15 {
            patrol.decide(&lost, DT);
        }
        assert_eq!(patrol.state(), PatrolState::Attacking);
    }

    #[test]
    fn test_dead_target_dropped_immediately() {
        let mut patrol = attacking_patrol(Vec3::new(4.0, 0.9, 0.0));

        patrol.decide(&Senses::default(), DT);

        assert_eq!(patrol.state(), PatrolState::MovingToPossibleTargetPosition);
        assert_eq!(patrol.target(), None);
        assert_eq!(patrol.attack().target(), None);
    }

    #[test]
    fn test_sound_investigation_then_search_then_patrol() {
        let mut patrol = PatrolController::new(PatrolConfig::default(), Vec3::ZERO);
        let noise = Vec3::new(10.0, 0.0, 0.0);

        patrol.decide(&hearing(noise, Vec3::ZERO), DT);
        assert_eq!(patrol.state(), PatrolState::MovingToPossibleTargetPosition);
        assert_eq!(patrol.active_kind(), Some(BehaviorKind::FollowPoint));

        // Дошли - тревога ещё активна → поиск
        let arrived = Senses {
            position: noise,
            ..Default::default()
        };
        patrol.decide(&arrived, DT);
        assert_eq!(patrol.state(), PatrolState::SearchingForLostTarget);

        // Звуки во время поиска игнорируются
        patrol.decide(&hearing(Vec3::new(-30.0, 0.0, 0.0), noise), DT);
        assert_eq!(patrol.state(), PatrolState::SearchingForLostTarget);

        // max_search_duration = 20s
        for _ in 0..38 {
            patrol.decide(&arrived, DT);
        }
        assert_eq!(patrol.state(), PatrolState::SearchingForLostTarget);
        patrol.decide(&arrived, DT);
        assert_eq!(patrol.state(), PatrolState::Patrol);
    }

    #[test]
    fn test_no_alert_returns_to_patrol() {
        let mut patrol = PatrolController::new(
            PatrolConfig {
                alert_duration: 0.0,
                ..Default::default()
            },
            Vec3::ZERO,
        );
        let noise = Vec3::new(3.0, 0.0, 0.0);

        patrol.decide(&hearing(noise, Vec3::ZERO), DT);
        patrol.decide(
            &Senses {
                position: noise,
                ..Default::default()
            },
            DT,
        );

        assert_eq!(patrol.state(), PatrolState::Patrol);
    }

    #[test]
    fn test_damage_alert_counts_as_sound() {
        let mut patrol = PatrolController::new(PatrolConfig::default(), Vec3::ZERO);

        patrol.decide(
            &Senses {
                damage_alert: Some(Vec3::new(0.0, 0.0, -12.0)),
                ..Default::default()
            },
            DT,
        );

        assert_eq!(patrol.state(), PatrolState::MovingToPossibleTargetPosition);
        assert_eq!(patrol.last_known_position(), Some(Vec3::new(0.0, 0.0, -12.0)));
    }

    #[test]
    fn test_vision_beats_sound() {
        let mut patrol = PatrolController::new(PatrolConfig::default(), Vec3::ZERO);
        let mut senses = seeing(Vec3::new(5.0, 0.9, 0.0));
        senses.heard = Some(HeardSound {
            position: Vec3::new(-20.0, 0.0, 0.0),
            owner: None,
        });

        patrol.decide(&senses, DT);
        assert_eq!(patrol.state(), PatrolState::Attacking);
        assert!(patrol.is_attacking());
    }

    #[test]
    fn test_patrol_behavior_priority() {
        let route = PatrolRoute {
            waypoints: vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)],
            ..Default::default()
        };
        let area = WanderAreaConfig {
            area: AreaBounds::new(Vec3::new(20.0, 0.0, 0.0), Vec3::splat(3.0)),
            ..Default::default()
        };

        let with_route = PatrolController::new(
            PatrolConfig {
                route: Some(route),
                area: Some(area.clone()),
                ..Default::default()
            },
            Vec3::ZERO,
        );
        assert_eq!(with_route.active_kind(), Some(BehaviorKind::FollowPath));

        let with_area = PatrolController::new(
            PatrolConfig {
                area: Some(area),
                ..Default::default()
            },
            Vec3::ZERO,
        );
        assert_eq!(with_area.active_kind(), Some(BehaviorKind::WanderArea));

        let free = PatrolController::new(PatrolConfig::default(), Vec3::ZERO);
        assert_eq!(free.active_kind(), Some(BehaviorKind::Wander));

        let idle = PatrolController::new(
            PatrolConfig {
                wander_enabled: false,
                ..Default::default()
            },
            Vec3::ZERO,
        );
        assert_eq!(idle.active_kind(), None);
    }

    #[test]
    fn test_dispatch_moves_toward_investigation_point() {
        let mut agent = TestAgent::new(Vec3::ZERO);
        let mut patrol = PatrolController::new(PatrolConfig::default(), Vec3::ZERO);

        patrol.decide(&hearing(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO), DT);
        let intent = patrol.dispatch(&mut agent.ctx(DT));

        assert!(intent.is_moving());
        assert!(intent.move_direction.z > 0.99);
        // 20m > start_run_distance
        assert!(intent.running);
    }
}
