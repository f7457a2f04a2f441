//! AI components (controllers)

pub mod patrol;
pub mod zombie;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod patrol_tests;

// Re-export all components
pub use patrol::*;
pub use zombie::*;
