//! Locomotion - потребитель AgentIntent
//!
//! Внешний движок анимации/физики реализует `Locomotion`; `forward_intent`
//! переводит world-space intent в локальные оси тела. `KinematicLocomotion` -
//! headless реализация: интегрирует движение прямо в Transform.

use bevy::prelude::*;

use crate::components::{AgentIntent, AttackKind, MoveSpeed, WeaponClass};
use crate::shared::flatten;

/// Контракт locomotion engine
pub trait Locomotion {
    /// `horizontal` - strafe (+ вправо), `vertical` - вперёд (+) / назад (-)
    fn apply_input(&mut self, horizontal: f32, vertical: f32, running: bool);

    fn set_look_at(&mut self, direction: Vec3);

    fn set_attack_pose(&mut self, enabled: bool);

    fn set_attacking(&mut self, kind: AttackKind, attacking: bool);
}

/// Intent → вызовы Locomotion (оси относительно текущего Transform)
pub fn forward_intent(locomotion: &mut dyn Locomotion, transform: &Transform, intent: &AgentIntent, weapon: WeaponClass) {
    let local = transform.rotation.inverse() * intent.move_direction;
    // Forward в Bevy = -Z
    locomotion.apply_input(local.x, -local.z, intent.running);

    if flatten(intent.look_direction).length_squared() > 1e-6 {
        locomotion.set_look_at(intent.look_direction);
    }

    locomotion.set_attack_pose(intent.attack_pose);
    let kind = if weapon.is_ranged() {
        AttackKind::Ranged
    } else {
        AttackKind::Melee
    };
    locomotion.set_attacking(kind, intent.attacking);
}

/// Состояние атаки, выставленное locomotion (читают тесты / debug)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AttackPose {
    pub aiming: bool,
    pub attacking: Option<AttackKind>,
}

/// Headless locomotion: translation += direction × speed × dt
pub struct KinematicLocomotion<'a> {
    pub transform: &'a mut Transform,
    pub pose: &'a mut AttackPose,
    pub speed: MoveSpeed,
    pub dt: f32,
}

impl Locomotion for KinematicLocomotion<'_> {
    fn apply_input(&mut self, horizontal: f32, vertical: f32, running: bool) {
        let local = Vec3::new(horizontal, 0.0, -vertical);
        let world = flatten(self.transform.rotation * local).clamp_length_max(1.0);
        let speed = if running { self.speed.run } else { self.speed.walk };
        self.transform.translation += world * speed * self.dt;
    }

    fn set_look_at(&mut self, direction: Vec3) {
        let flat = flatten(direction);
        if flat.length_squared() > 1e-6 {
            self.transform.look_to(flat, Vec3::Y);
        }
    }

    fn set_attack_pose(&mut self, enabled: bool) {
        self.pose.aiming = enabled;
    }

    fn set_attacking(&mut self, kind: AttackKind, attacking: bool) {
        self.pose.attacking = attacking.then_some(kind);
    }
}

/// Система: AgentIntent → Transform (headless режим)
pub fn apply_intent_kinematic(
    time: Res<Time>,
    mut bodies: Query<(&AgentIntent, &MoveSpeed, Option<&WeaponClass>, &mut Transform, &mut AttackPose)>,
) {
    let dt = time.delta_secs();

    for (intent, speed, weapon, mut transform, mut pose) in bodies.iter_mut() {
        let current = *transform;
        let mut locomotion = KinematicLocomotion {
            transform: &mut transform,
            pose: &mut pose,
            speed: *speed,
            dt,
        };
        forward_intent(&mut locomotion, &current, intent, weapon.copied().unwrap_or_default());
    }
}
