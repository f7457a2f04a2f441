//! Collision Layers - centralised constants для spatial queries
//!
//! ## Архитектура:
//! - **Layer (битовая маска):** на каком слое находится body
//! - **Mask (битовая маска):** какие слои видит query (overlap / line-of-sight)
//!
//! Биты совпадают с Rapier `Group` (GROUP_1..GROUP_32), чтобы host с физикой
//! мог переиспользовать те же маски в `CollisionGroups`.
//!
//! ## Layers:
//! - Layer 1 (0b1 = 1): Reserved
//! - Layer 2 (0b10 = 2): Actors (агенты, игрок)
//! - Layer 3 (0b100 = 4): Environment (стены, укрытия)
//! - Layer 4 (0b1000 = 8): Projectiles

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;
use serde::{Deserialize, Serialize};

/// Битовая маска слоёв (serde-friendly обёртка над Rapier `Group`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Reflect)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// Layer 2: Actors (агенты, игрок, любые цели для vision)
    pub const ACTORS: LayerMask = LayerMask(0b10);

    /// Layer 3: Environment (static obstacles - блокируют line-of-sight)
    pub const ENVIRONMENT: LayerMask = LayerMask(0b100);

    /// Layer 4: Projectiles (не участвуют в AI queries)
    pub const PROJECTILES: LayerMask = LayerMask(0b1000);

    pub fn groups(self) -> Group {
        Group::from_bits_truncate(self.0)
    }

    pub fn intersects(self, other: LayerMask) -> bool {
        self.groups().intersects(other.groups())
    }

    pub fn union(self, other: LayerMask) -> LayerMask {
        LayerMask((self.groups() | other.groups()).bits())
    }

    pub fn is_empty(self) -> bool {
        self.groups().is_empty()
    }
}

impl From<Group> for LayerMask {
    fn from(group: Group) -> Self {
        LayerMask(group.bits())
    }
}

/// Получить название слоя для debug логов
pub fn layer_name(layer: LayerMask) -> &'static str {
    match layer {
        LayerMask::ACTORS => "Actors",
        LayerMask::ENVIRONMENT => "Environment",
        LayerMask::PROJECTILES => "Projectiles",
        _ => "Mixed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_match_rapier_groups() {
        assert_eq!(LayerMask::ACTORS.groups(), Group::GROUP_2);
        assert_eq!(LayerMask::ENVIRONMENT.groups(), Group::GROUP_3);
        assert_eq!(LayerMask::from(Group::GROUP_4), LayerMask::PROJECTILES);
    }

    #[test]
    fn test_union_and_intersects() {
        let los = LayerMask::ACTORS.union(LayerMask::ENVIRONMENT);
        assert!(los.intersects(LayerMask::ACTORS));
        assert!(los.intersects(LayerMask::ENVIRONMENT));
        assert!(!los.intersects(LayerMask::PROJECTILES));
        assert!(LayerMask::NONE.is_empty());
        assert_eq!(layer_name(LayerMask::ENVIRONMENT), "Environment");
    }
}
