//! Physics / locomotion module
//!
//! AI не двигает тела напрямую: AgentIntent уходит в `Locomotion`.
//! Headless режим - KinematicLocomotion (Transform integration).

pub mod locomotion;

// Re-export основных типов
pub use locomotion::{apply_intent_kinematic, forward_intent, AttackPose, KinematicLocomotion, Locomotion};
