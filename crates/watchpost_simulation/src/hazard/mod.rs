//! Hazard domain - опасные зоны и бегство из них
//!
//! - region: HazardRegion / SimplifiedHazard + merge policy
//! - directory: глобальный HazardDirectory (Resource)
//! - merge: фоновый MergeWorker (AsyncComputeTaskPool)
//! - escape: per-agent EscapeBehavior (override intent)

use bevy::prelude::*;

pub mod directory;
pub mod escape;
pub mod merge;
pub mod region;
pub mod systems;

pub use directory::{HazardChange, HazardDirectory};
pub use escape::{EscapeBehavior, EscapeConfig, EscapeState, TaggedPolicy};
pub use merge::{MergePoll, MergeWorker};
pub use region::{merge_overlapping, HazardId, HazardPolicy, HazardRegion, SimplifiedHazard};
pub use systems::{broadcast_hazard_changes, register_escape_agents};

/// Hazard Plugin
///
/// Регистрирует HazardDirectory. Системы выстраивает SimulationPlugin.
pub struct HazardPlugin;

impl Plugin for HazardPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HazardDirectory>();
    }
}
