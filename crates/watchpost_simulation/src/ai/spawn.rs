//! Spawn helpers для агентов из AgentProfile

use bevy::prelude::*;

use crate::ai::{PatrolController, ZombieController};
use crate::components::{Agent, Health, PhysicalBody};
use crate::config::{AgentProfile, ControllerProfile};
use crate::hazard::EscapeBehavior;
use crate::navigation::Navigator;
use crate::perception::{DamageDetector, FieldOfView, HearingSensor};
use crate::physics::AttackPose;

/// Spawn агента с полным набором компонентов
///
/// - Transform + PhysicalBody (для spatial queries)
/// - Navigator, FieldOfView, HearingSensor, DamageDetector
/// - EscapeBehavior (если в профиле есть escape)
/// - controller по `profile.controller`
pub fn spawn_agent(commands: &mut Commands, profile: &AgentProfile, position: Vec3) -> Entity {
    let mut agent = commands.spawn((
        Name::new(profile.name.clone()),
        Agent::default(),
        Health::new(profile.health),
        Transform::from_translation(position),
        PhysicalBody::actor(profile.tag.as_deref()),
        profile.weapon,
        profile.speed,
        AttackPose::default(),
        Navigator::new(profile.navigation),
        FieldOfView::new(profile.vision.clone()),
        HearingSensor::new(profile.hearing.clone()),
        DamageDetector::new(profile.damage.clone()),
    ));

    if let Some(escape) = &profile.escape {
        agent.insert(EscapeBehavior::new(escape.clone(), profile.navigation));
    }

    match &profile.controller {
        ControllerProfile::Patrol(config) => {
            agent.insert(PatrolController::new(config.clone(), position));
        }
        ControllerProfile::Zombie(config) => {
            agent.insert(ZombieController::new(config.clone(), position));
        }
    }

    let entity = agent.id();
    crate::log(&format!(
        "🧍 Spawned {} '{}' {:?} at {:?}",
        profile.controller.kind_name(),
        profile.name,
        entity,
        position
    ));
    entity
}

/// Неподвижная цель (игрок / манекен) для тестов и demo
pub fn spawn_target(commands: &mut Commands, position: Vec3, tag: &str) -> Entity {
    commands
        .spawn((
            Name::new(tag.to_string()),
            Health::default(),
            Transform::from_translation(position),
            PhysicalBody::actor(Some(tag)),
        ))
        .id()
}

/// Статическое препятствие (стена) на слое Environment
pub fn spawn_obstacle(commands: &mut Commands, center: Vec3, half_size: Vec3) -> Entity {
    commands
        .spawn((Transform::from_translation(center), PhysicalBody::obstacle(half_size)))
        .id()
}
