//! ECS Components для агентов
//!
//! Организация по доменам:
//! - actor: базовые характеристики (Agent, Health, PhysicalBody, WeaponClass, MoveSpeed)
//! - intent: per-tick выход AI (AgentIntent, ActiveBehavior)
//!
//! Component-state подсистем живёт рядом с логикой (navigation, perception, hazard, ai).

pub mod actor;
pub mod intent;

// Re-exports для удобного импорта
pub use actor::*;
pub use intent::*;
