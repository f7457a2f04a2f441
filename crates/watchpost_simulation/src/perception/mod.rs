//! Perception domain - как агент узнаёт о мире
//!
//! - vision: Field of View (конус + line-of-sight)
//! - hearing: round-robin HearingScheduler + HearingSensor
//! - damage: DamageDetector (look-toward окно после попадания)

use bevy::prelude::*;

pub mod damage;
pub mod hearing;
pub mod vision;

pub use damage::{record_damage, DamageDetector, DamageDetectorConfig, DamageTaken};
pub use hearing::{
    collect_posted_sounds, dispatch_hearing, register_hearing_sensors, unregister_hearing_sensors, HearingConfig,
    HearingScheduler, HearingSensor, HeardSound, SoundEvent, SoundPosted, DEFAULT_GROUP_CAPACITY,
};
pub use vision::{FieldOfView, FieldOfViewConfig, FieldOfViewReading, ViewPivot};

/// Perception Plugin
///
/// Регистрирует HearingScheduler и события. Системы выстраивает SimulationPlugin.
pub struct PerceptionPlugin;

impl Plugin for PerceptionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HearingScheduler>()
            .add_event::<SoundPosted>()
            .add_event::<DamageTaken>();
    }
}
