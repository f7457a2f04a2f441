//! Tests for the attack sub-behavior.

#[cfg(test)]
mod tests {
    use super::super::attack::{flank_point, AttackBehavior, AttackConfig, FirePoseMode, RangedPolicy, RangedState};
    use super::super::test_support::TestAgent;
    use super::super::SubBehavior;
    use crate::components::{PhysicalBody, WeaponClass};
    use crate::shared::{aabb, ground_distance, LayerMask};
    use crate::world::SpatialBody;
    use bevy::prelude::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const TARGET: u32 = 1;

    fn target_entity() -> Entity {
        Entity::from_raw(TARGET)
    }

    fn place_target(agent: &mut TestAgent, position: Vec3, alive: bool) {
        agent.spatial.insert(SpatialBody {
            entity: target_entity(),
            bounds: PhysicalBody::actor(None).bounds_at(position),
            layer: LayerMask::ACTORS,
            tag: Some("player".to_string()),
            alive,
        });
    }

    fn attack_with(config: AttackConfig) -> AttackBehavior {
        let mut attack = AttackBehavior::new(config);
        attack.set_target(Some(target_entity()));
        attack
    }

    #[test]
    fn test_too_close_uses_closest_policy() {
        // distance = 3, min_distance = 4
        for policy in [RangedPolicy::FlankTarget, RangedPolicy::StayStill] {
            let mut agent = TestAgent::new(Vec3::ZERO);
            place_target(&mut agent, Vec3::new(3.0, 0.0, 0.0), true);
            let mut attack = attack_with(AttackConfig {
                closest_policy: policy,
                ..Default::default()
            });

            attack.tick(&mut agent.ctx(0.1));

            assert_eq!(attack.state(), Some(RangedState::from(policy)));
            assert_ne!(attack.state(), Some(RangedState::MoveToTarget));
        }
    }

    #[test]
    fn test_entering_flank_rolls_point_immediately() {
        let mut agent = TestAgent::new(Vec3::ZERO);
        let target_position = Vec3::new(3.0, 0.0, 0.0);
        place_target(&mut agent, target_position, true);
        let mut attack = attack_with(AttackConfig::default());

        let intent = attack.tick(&mut agent.ctx(0.1));

        let point = attack.flank_point().expect("flank point rolled on entry");
        let distance = ground_distance(point, target_position);
        assert!((4.0..=12.0).contains(&distance), "flank distance {}", distance);
        assert!(intent.is_moving());
    }

    #[test]
    fn test_far_target_moves_and_runs() {
        let mut agent = TestAgent::new(Vec3::ZERO);
        place_target(&mut agent, Vec3::new(30.0, 0.0, 0.0), true);
        let mut attack = attack_with(AttackConfig::default());

        let intent = attack.tick(&mut agent.ctx(0.1));

        assert_eq!(attack.state(), Some(RangedState::MoveToTarget));
        assert!((intent.move_direction - Vec3::X).length() < 1e-5);
        assert!(intent.running);
        // 30m > max_shot_distance (25)
        assert!(!intent.attack_pose);
        assert!(!intent.attacking);
    }

    #[test]
    fn test_in_area_holds_and_shoots_once_aimed() {
        let mut agent = TestAgent::new(Vec3::ZERO);
        place_target(&mut agent, Vec3::new(8.0, 0.0, 0.0), true);
        let mut attack = attack_with(AttackConfig::default());

        // Тик 1: смотрим в +Z, цель в +X - прицел ещё не наведён
        let intent = attack.tick(&mut agent.ctx(0.1));
        assert_eq!(attack.state(), Some(RangedState::StayStill));
        assert!(!intent.is_moving());
        assert!(intent.attack_pose);
        assert!(!intent.attacking);
        assert!((intent.look_direction - Vec3::X).length() < 1e-5);

        agent.step(&intent, 0.0, 0.1);

        // Тик 2: взгляд на цели
        let intent = attack.tick(&mut agent.ctx(0.1));
        assert!(intent.attacking);
    }

    #[test]
    fn test_wall_blocks_shot() {
        let mut agent = TestAgent::new(Vec3::ZERO);
        agent.look = Vec3::X;
        place_target(&mut agent, Vec3::new(8.0, 0.0, 0.0), true);
        agent.spatial.insert(SpatialBody {
            entity: Entity::from_raw(50),
            bounds: aabb(Vec3::new(4.0, 1.0, 0.0), Vec3::new(0.2, 2.0, 3.0)),
            layer: LayerMask::ENVIRONMENT,
            tag: None,
            alive: true,
        });
        let attack = attack_with(AttackConfig::default());

        let target = agent.spatial.bodies()[0].clone();
        assert_eq!(target.entity, target_entity());
        assert!(!attack.target_is_on_shot_view(&agent.ctx(0.1), &target));
    }

    #[test]
    fn test_shot_precision_scales_with_distance() {
        let mut agent = TestAgent::new(Vec3::ZERO);
        // ~5.7° off target
        agent.look = Vec3::new(1.0, 0.0, 0.1).normalize();
        let attack = attack_with(AttackConfig::default());

        // 1m: 5.7 × 1 < 10 → ok
        place_target(&mut agent, Vec3::new(1.0, 0.0, 0.0), true);
        let near = agent.spatial.bodies()[0].clone();
        assert!(attack.target_is_on_shot_view(&agent.ctx(0.1), &near));

        // 10m: 5.7 × 10 > 10 → промах
        place_target(&mut agent, Vec3::new(10.0, 0.0, 0.0), true);
        let far = agent.spatial.bodies()[0].clone();
        assert!(!attack.target_is_on_shot_view(&agent.ctx(0.1), &far));
    }

    #[test]
    fn test_fire_pose_always() {
        let mut agent = TestAgent::new(Vec3::ZERO);
        place_target(&mut agent, Vec3::new(40.0, 0.0, 0.0), true);
        let mut attack = attack_with(AttackConfig {
            fire_pose: FirePoseMode::Always,
            ..Default::default()
        });

        let intent = attack.tick(&mut agent.ctx(0.1));
        assert!(intent.attack_pose);
        assert!(!intent.attacking);
    }

    #[test]
    fn test_melee_closes_then_attacks() {
        let mut agent = TestAgent::new(Vec3::ZERO);
        agent.weapon = WeaponClass::Melee;
        place_target(&mut agent, Vec3::new(10.0, 0.0, 0.0), true);
        let mut attack = attack_with(AttackConfig::default());

        let intent = attack.tick(&mut agent.ctx(0.1));
        assert!(intent.is_moving());
        assert!(intent.running);
        assert!(!intent.attacking);

        // Ближайшая точка bounds цели на x = 1.1
        place_target(&mut agent, Vec3::new(1.5, 0.0, 0.0), true);
        let intent = attack.tick(&mut agent.ctx(0.1));
        assert!(intent.attacking);
        assert!(!intent.is_moving());
        assert!((intent.look_direction - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_missing_or_dead_target_stops() {
        let mut agent = TestAgent::new(Vec3::ZERO);
        let mut attack = attack_with(AttackConfig::default());

        let intent = attack.tick(&mut agent.ctx(0.1));
        assert!(!intent.is_moving() && !intent.attacking);

        place_target(&mut agent, Vec3::new(3.0, 0.0, 0.0), false);
        let intent = attack.tick(&mut agent.ctx(0.1));
        assert!(!intent.is_moving() && !intent.attacking);
    }

    proptest! {
        #[test]
        fn prop_flank_point_within_band(
            seed in any::<u64>(),
            px in -50.0f32..50.0,
            pz in -50.0f32..50.0,
            tx in -50.0f32..50.0,
            tz in -50.0f32..50.0,
            min in 0.5f32..10.0,
            extra in 0.0f32..10.0,
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let target = Vec3::new(tx, 0.9, tz);
            let max = min + extra;

            let point = flank_point(&mut rng, Vec3::new(px, 0.0, pz), target, min, max);
            let distance = ground_distance(point, target);

            prop_assert!(distance >= min - 1e-3 && distance <= max + 1e-3, "distance {} not in [{}, {}]", distance, min, max);
        }
    }
}
