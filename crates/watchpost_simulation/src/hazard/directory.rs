//! HazardDirectory - глобальный реестр hazard регионов (Resource)
//!
//! Все изменения копятся в `changes` и раз в тик рассылаются живым агентам
//! (broadcast_hazard_changes). Операции с неизвестным id - тихий no-op.

use std::collections::BTreeMap;

use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;

use super::region::{HazardId, HazardRegion};
use crate::shared::{contains_point, is_degenerate};

/// Изменение реестра (для broadcast)
#[derive(Debug, Clone, PartialEq)]
pub enum HazardChange {
    Added(HazardId, HazardRegion),
    Updated(HazardId, HazardRegion),
    Removed(HazardId),
}

#[derive(Resource, Debug, Default)]
pub struct HazardDirectory {
    regions: BTreeMap<HazardId, HazardRegion>,
    next_id: u64,
    changes: Vec<HazardChange>,
}

impl HazardDirectory {
    pub fn add_hazard(&mut self, bounds: Aabb3d, tag: impl Into<String>) -> HazardId {
        let tag = tag.into();
        debug_assert!(!tag.is_empty(), "HazardDirectory: hazard without tag");
        debug_assert!(!is_degenerate(&bounds), "HazardDirectory: empty hazard bounds");

        self.next_id += 1;
        let id = HazardId(self.next_id);
        let region = HazardRegion { bounds, tag };

        crate::log(&format!("☢️ Hazard {:?} added ({})", id, region.tag));
        self.regions.insert(id, region.clone());
        self.changes.push(HazardChange::Added(id, region));
        id
    }

    pub fn update_hazard(&mut self, bounds: Aabb3d, id: HazardId) {
        let Some(region) = self.regions.get_mut(&id) else {
            return;
        };
        region.bounds = bounds;
        self.changes.push(HazardChange::Updated(id, region.clone()));
    }

    pub fn remove_hazard(&mut self, id: HazardId) {
        if self.regions.remove(&id).is_some() {
            crate::log(&format!("☢️ Hazard {:?} removed", id));
            self.changes.push(HazardChange::Removed(id));
        }
    }

    pub fn region(&self, id: HazardId) -> Option<&HazardRegion> {
        self.regions.get(&id)
    }

    pub fn contains(&self, id: HazardId) -> bool {
        self.regions.contains_key(&id)
    }

    /// Лежит ли точка в регионе `id` (false для неизвестного id)
    pub fn is_point_inside(&self, id: HazardId, point: Vec3) -> bool {
        self.regions
            .get(&id)
            .is_some_and(|region| contains_point(&region.bounds, point))
    }

    /// Первый (по id) регион, содержащий точку
    pub fn region_at(&self, point: Vec3) -> Option<HazardId> {
        self.regions
            .iter()
            .find(|(_, region)| contains_point(&region.bounds, point))
            .map(|(id, _)| *id)
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.region_at(point).is_some()
    }

    pub fn regions(&self) -> impl Iterator<Item = (HazardId, &HazardRegion)> {
        self.regions.iter().map(|(id, region)| (*id, region))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn take_changes(&mut self) -> Vec<HazardChange> {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::aabb;

    #[test]
    fn test_add_update_remove() {
        let mut directory = HazardDirectory::default();
        let fire = directory.add_hazard(aabb(Vec3::ZERO, Vec3::splat(2.0)), "fire");
        let gas = directory.add_hazard(aabb(Vec3::new(10.0, 0.0, 0.0), Vec3::splat(2.0)), "gas");
        assert_ne!(fire, gas);

        assert_eq!(directory.region_at(Vec3::new(1.0, 0.0, 1.0)), Some(fire));
        assert!(directory.is_point_inside(gas, Vec3::new(10.0, 0.0, 0.0)));
        assert!(!directory.is_point_inside(gas, Vec3::ZERO));

        directory.update_hazard(aabb(Vec3::new(20.0, 0.0, 0.0), Vec3::splat(2.0)), gas);
        assert!(directory.is_point_inside(gas, Vec3::new(20.0, 0.0, 0.0)));

        directory.remove_hazard(fire);
        assert!(!directory.contains(fire));
        assert!(!directory.contains_point(Vec3::ZERO));

        let changes = directory.take_changes();
        assert_eq!(changes.len(), 4);
        assert!(matches!(changes[3], HazardChange::Removed(id) if id == fire));
        assert!(directory.take_changes().is_empty());
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut directory = HazardDirectory::default();
        let id = directory.add_hazard(aabb(Vec3::ZERO, Vec3::ONE), "fire");
        directory.remove_hazard(id);
        directory.take_changes();

        // Double remove + update удалённого
        directory.remove_hazard(id);
        directory.update_hazard(aabb(Vec3::ZERO, Vec3::ONE), id);
        directory.remove_hazard(HazardId(999));

        assert!(directory.take_changes().is_empty());
        assert!(directory.is_empty());
    }
}
