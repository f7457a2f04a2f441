//! Damage Detector - "откуда прилетело"
//!
//! После попадания агент какое-то время смотрит в сторону источника
//! (если не в бою). Опционально попадание считается услышанным звуком.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{AgentIntent, Health};
use crate::shared::ground_direction_or;

/// Event: по агенту попали
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageTaken {
    pub target: Entity,
    pub source_position: Vec3,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct DamageDetectorConfig {
    /// Сколько секунд смотрим в сторону попадания
    pub look_duration: f32,
    /// Patrol реагирует на попадание как на звук
    pub alert_on_damage: bool,
}

impl Default for DamageDetectorConfig {
    fn default() -> Self {
        Self {
            look_duration: 2.0,
            alert_on_damage: true,
        }
    }
}

#[derive(Component, Debug, Clone, Default)]
pub struct DamageDetector {
    pub config: DamageDetectorConfig,
    look_timer: f32,
    last_hit_direction: Option<Vec3>,
    pending_alert: Option<Vec3>,
}

impl DamageDetector {
    pub fn new(config: DamageDetectorConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn record_hit(&mut self, position: Vec3, source_position: Vec3) {
        let direction = ground_direction_or(source_position - position, Vec3::ZERO);
        if direction != Vec3::ZERO {
            self.last_hit_direction = Some(direction);
            self.look_timer = self.config.look_duration;
        }
        if self.config.alert_on_damage {
            self.pending_alert = Some(source_position);
        }
    }

    /// Направление взгляда, пока окно открыто
    pub fn look_direction(&self) -> Option<Vec3> {
        if self.look_timer > 0.0 {
            self.last_hit_direction
        } else {
            None
        }
    }

    /// Override: перезаписываем look direction и тикаем окно
    pub fn apply(&mut self, intent: &mut AgentIntent, dt: f32) {
        if let Some(direction) = self.look_direction() {
            intent.look_direction = direction;
        }
        self.tick(dt);
    }

    pub fn tick(&mut self, dt: f32) {
        self.look_timer = (self.look_timer - dt).max(0.0);
    }

    /// Позиция источника попадания (один раз)
    pub fn take_alert(&mut self) -> Option<Vec3> {
        self.pending_alert.take()
    }
}

/// Система: DamageTaken → Health + DamageDetector
pub fn record_damage(
    mut events: EventReader<DamageTaken>,
    mut targets: Query<(&Transform, Option<&mut Health>, Option<&mut DamageDetector>)>,
) {
    for event in events.read() {
        let Ok((transform, health, detector)) = targets.get_mut(event.target) else {
            continue;
        };

        if let Some(mut health) = health {
            health.take_damage(event.amount);
        }
        if let Some(mut detector) = detector {
            detector.record_hit(transform.translation, event.source_position);
            crate::log(&format!(
                "💥 {:?} hit from {:?} (look window {:.1}s)",
                event.target, event.source_position, detector.config.look_duration
            ));
        }
    }
}
