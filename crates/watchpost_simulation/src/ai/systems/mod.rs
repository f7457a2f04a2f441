//! AI systems (per-tick driver)

pub mod drive;

// Re-export all systems
pub use drive::*;
