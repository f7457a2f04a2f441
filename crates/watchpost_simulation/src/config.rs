//! Agent profiles (JSON authoring)
//!
//! Один профиль = одна "заготовка" NPC: сенсоры, навигация, escape,
//! оружие и controller. Все поля опциональны (`#[serde(default)]`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{PatrolConfig, ZombieConfig};
use crate::components::{MoveSpeed, WeaponClass};
use crate::hazard::EscapeConfig;
use crate::navigation::NavigationSettings;
use crate::perception::{DamageDetectorConfig, FieldOfViewConfig, HearingConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid agent profile: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Какой controller получит агент
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ControllerProfile {
    Patrol(PatrolConfig),
    Zombie(ZombieConfig),
}

impl ControllerProfile {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ControllerProfile::Patrol(_) => "patrol",
            ControllerProfile::Zombie(_) => "zombie",
        }
    }
}

impl Default for ControllerProfile {
    fn default() -> Self {
        ControllerProfile::Patrol(PatrolConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    pub name: String,
    /// Gameplay tag тела (например "player" для целей)
    pub tag: Option<String>,
    pub health: u32,
    pub navigation: NavigationSettings,
    pub vision: FieldOfViewConfig,
    pub hearing: HearingConfig,
    pub damage: DamageDetectorConfig,
    /// None - агент игнорирует опасные зоны
    pub escape: Option<EscapeConfig>,
    pub weapon: WeaponClass,
    pub speed: MoveSpeed,
    pub controller: ControllerProfile,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: "agent".to_string(),
            tag: None,
            health: 100,
            navigation: NavigationSettings::default(),
            vision: FieldOfViewConfig::default(),
            hearing: HearingConfig::default(),
            damage: DamageDetectorConfig::default(),
            escape: Some(EscapeConfig::default()),
            weapon: WeaponClass::default(),
            speed: MoveSpeed::default(),
            controller: ControllerProfile::default(),
        }
    }
}

impl AgentProfile {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source)
    }
}
