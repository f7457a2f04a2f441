//! Per-tick driver: сенсоры → decide → dispatch → overrides → intent
//!
//! Один generic system на тип controller'а (Patrol, Zombie). Порядок внутри
//! тика фиксирован:
//! 1. FOV scan + tracked target check, hearing, damage alert
//! 2. controller.decide (transitions)
//! 3. controller.dispatch (ровно один sub-behavior пишет intent)
//! 4. DamageDetector override (вне Attacking)
//! 5. Escape override (всегда последним)

use bevy::ecs::component::Mutable;
use bevy::prelude::*;

use crate::ai::{AgentController, Senses};
use crate::behaviors::AgentContext;
use crate::components::{ActiveBehavior, Agent, AgentDebugLabel, AgentIntent, BehaviorKind, Health, PhysicalBody, WeaponClass};
use crate::hazard::EscapeBehavior;
use crate::navigation::Navigator;
use crate::perception::{DamageDetector, FieldOfView, HearingSensor, ViewPivot};
use crate::shared::{center, ground_direction_or};
use crate::world::{NavMeshService, SpatialQuery, SpatialWorld};
use crate::DeterministicRng;

/// Система: тик всех агентов с controller'ом `C`
pub fn tick_agents<C>(
    time: Res<Time>,
    spatial_world: Res<SpatialWorld>,
    nav_service: Option<Res<NavMeshService>>,
    mut random: ResMut<DeterministicRng>,
    mut agents: Query<(
        Entity,
        &Agent,
        &Health,
        &Transform,
        &PhysicalBody,
        Option<&WeaponClass>,
        &mut Navigator,
        &mut FieldOfView,
        Option<&mut HearingSensor>,
        Option<&mut DamageDetector>,
        Option<&mut EscapeBehavior>,
        (&mut AgentIntent, &mut ActiveBehavior, &mut AgentDebugLabel),
        &mut C,
    )>,
) where
    C: AgentController + Component<Mutability = Mutable>,
{
    let dt = time.delta_secs();
    let spatial: &dyn SpatialQuery = &*spatial_world;
    let nav_mesh = NavMeshService::resolve(nav_service.as_deref());

    for (
        entity,
        agent,
        health,
        transform,
        body,
        weapon,
        mut navigator,
        mut fov,
        hearing,
        mut detector,
        escape,
        (mut intent, mut active, mut label),
        mut controller,
    ) in agents.iter_mut()
    {
        // Замороженный или мёртвый агент стоит на месте
        if !agent.enabled || !health.is_alive() {
            if intent.is_moving() || intent.attacking {
                *intent = AgentIntent::stopped(intent.look_direction);
            }
            continue;
        }

        let position = transform.translation;
        let bounds = body.bounds_at(position);
        let forward = ground_direction_or(transform.forward().as_vec3(), Vec3::Z);
        let look = intent.look_direction;
        let pivot = ViewPivot::new(entity, center(&bounds), look, forward);

        // ===== Сенсоры =====
        // Reading между опросами может устареть (цель умерла / исчезла)
        let visible = fov
            .scan(spatial, &pivot, dt)
            .and_then(|target| spatial.body(target))
            .filter(|target| target.alive);
        let visible_target = visible.as_ref().map(|target| target.entity);
        let visible_position = visible.map(|target| target.center());

        let tracked = controller.target().and_then(|target| spatial.body(target));
        let target_alive = tracked.as_ref().is_some_and(|target| target.alive);
        let target_in_view = tracked
            .as_ref()
            .is_some_and(|target| target.alive && fov.is_body_on_view(spatial, &pivot, target));

        let senses = Senses {
            position,
            visible_target,
            target_in_view,
            target_alive,
            target_position: tracked.filter(|_| target_in_view).map(|target| target.center()),
            visible_position,
            heard: hearing.and_then(|mut sensor| sensor.take_heard()),
            damage_alert: detector.as_deref_mut().and_then(DamageDetector::take_alert),
        };

        // ===== Transitions =====
        let previous = controller.state_name();
        controller.decide(&senses, dt);
        let state = controller.state_name();
        if previous != state {
            crate::log(&format!("🧠 {:?}: {} → {}", entity, previous, state));
        }

        // ===== Dispatch =====
        let mut ctx = AgentContext {
            entity,
            dt,
            position,
            bounds,
            forward,
            look,
            weapon: weapon.copied().unwrap_or_default(),
            navigator: &mut *navigator,
            nav_mesh,
            spatial,
            rng: &mut random.rng,
            force_path_update: false,
        };
        let mut next = controller.dispatch(&mut ctx);

        // ===== Overrides =====
        if let Some(detector) = detector.as_deref_mut() {
            if controller.is_attacking() {
                detector.tick(dt);
            } else {
                detector.apply(&mut next, dt);
            }
        }

        let mut kind = controller.active_kind();
        if let Some(mut escape) = escape {
            if escape.update(&ctx, &mut next) && escape.is_escaping() {
                kind = Some(BehaviorKind::Escape);
            }
        }

        // ===== Output =====
        *intent = next;
        active.kind = kind;
        active.state = state;
        let text = active.label();
        if label.0 != text {
            label.0 = text;
        }
    }
}
