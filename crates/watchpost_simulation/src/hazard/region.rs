//! Hazard regions: raw (из directory) и simplified (после merge)
//!
//! Merge policy - most-restrictive-wins:
//! - view_required: только если ВСЕ требуют
//! - block_ranged_weapons, run: если ХОТЯ БЫ ОДИН
//! - view_angle: max
//! - obstacle_mask: union

use std::sync::atomic::{AtomicBool, Ordering};

use bevy::math::bounding::{Aabb3d, BoundingVolume, IntersectsVolume};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::LayerMask;

/// Уникальный id региона в HazardDirectory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Reflect)]
pub struct HazardId(pub u64);

/// Raw регион: объём + тег (тег выбирает policy у агента)
#[derive(Debug, Clone, PartialEq)]
pub struct HazardRegion {
    pub bounds: Aabb3d,
    pub tag: String,
}

/// Как агент реагирует на регион с данным тегом
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct HazardPolicy {
    /// Убегаем только если видим регион
    pub view_required: bool,
    /// Угол обзора для view_required (градусы от forward)
    pub view_angle: f32,
    /// Что закрывает регион от взгляда
    pub obstacle_mask: LayerMask,
    /// Запрет стрельбы во время бегства
    pub block_ranged_weapons: bool,
    pub run: bool,
}

impl Default for HazardPolicy {
    fn default() -> Self {
        Self {
            view_required: false,
            view_angle: 90.0,
            obstacle_mask: LayerMask::ENVIRONMENT,
            block_ranged_weapons: true,
            run: true,
        }
    }
}

impl HazardPolicy {
    pub fn merge(&self, other: &HazardPolicy) -> HazardPolicy {
        HazardPolicy {
            view_required: self.view_required && other.view_required,
            view_angle: self.view_angle.max(other.view_angle),
            obstacle_mask: self.obstacle_mask.union(other.obstacle_mask),
            block_ranged_weapons: self.block_ranged_weapons || other.block_ranged_weapons,
            run: self.run || other.run,
        }
    }
}

/// Регион после merge: union bounds + merged policy
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifiedHazard {
    pub bounds: Aabb3d,
    pub policy: HazardPolicy,
}

impl SimplifiedHazard {
    pub fn intersects(&self, other: &SimplifiedHazard) -> bool {
        self.bounds.intersects(&other.bounds)
    }

    pub fn merge(&self, other: &SimplifiedHazard) -> SimplifiedHazard {
        SimplifiedHazard {
            bounds: self.bounds.merge(&other.bounds),
            policy: self.policy.merge(&other.policy),
        }
    }
}

/// Pairwise merge до неподвижной точки
///
/// Нашли пересечение → заменяем пару одним регионом и начинаем скан заново.
/// `None` - merge отменён (cancel flag).
pub fn merge_overlapping(mut regions: Vec<SimplifiedHazard>, cancel: &AtomicBool) -> Option<Vec<SimplifiedHazard>> {
    'scan: loop {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }

        for i in 0..regions.len() {
            for j in (i + 1)..regions.len() {
                if regions[i].intersects(&regions[j]) {
                    let merged = regions[i].merge(&regions[j]);
                    // j > i: сначала j, чтобы i остался валидным
                    regions.swap_remove(j);
                    regions.swap_remove(i);
                    regions.push(merged);
                    continue 'scan;
                }
            }
        }

        return Some(regions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{aabb, contains_point};
    use proptest::prelude::*;

    fn hazard(center: Vec3, half: Vec3, policy: HazardPolicy) -> SimplifiedHazard {
        SimplifiedHazard {
            bounds: aabb(center, half),
            policy,
        }
    }

    fn encloses(outer: &Aabb3d, inner: &Aabb3d) -> bool {
        contains_point(outer, Vec3::from(inner.min)) && contains_point(outer, Vec3::from(inner.max))
    }

    #[test]
    fn test_two_overlapping_cubes_merge_into_one() {
        let a = hazard(Vec3::ZERO, Vec3::splat(5.0), HazardPolicy::default());
        let b = hazard(Vec3::new(5.0, 0.0, 0.0), Vec3::splat(5.0), HazardPolicy::default());

        let merged = merge_overlapping(vec![a.clone(), b.clone()], &AtomicBool::new(false)).unwrap();

        assert_eq!(merged.len(), 1);
        assert!(encloses(&merged[0].bounds, &a.bounds));
        assert!(encloses(&merged[0].bounds, &b.bounds));
    }

    #[test]
    fn test_disjoint_regions_stay_separate() {
        let a = hazard(Vec3::ZERO, Vec3::splat(1.0), HazardPolicy::default());
        let b = hazard(Vec3::new(10.0, 0.0, 0.0), Vec3::splat(1.0), HazardPolicy::default());

        let merged = merge_overlapping(vec![a, b], &AtomicBool::new(false)).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_chain_merge_restarts_scan() {
        // A ∩ B = ∅, но C пересекает обоих → один регион
        let regions = vec![
            hazard(Vec3::ZERO, Vec3::splat(1.0), HazardPolicy::default()),
            hazard(Vec3::new(8.0, 0.0, 0.0), Vec3::splat(1.0), HazardPolicy::default()),
            hazard(Vec3::new(4.0, 0.0, 0.0), Vec3::new(3.5, 1.0, 1.0), HazardPolicy::default()),
        ];

        let merged = merge_overlapping(regions, &AtomicBool::new(false)).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_cancelled_merge_returns_none() {
        let regions = vec![hazard(Vec3::ZERO, Vec3::ONE, HazardPolicy::default())];
        assert!(merge_overlapping(regions, &AtomicBool::new(true)).is_none());
    }

    #[test]
    fn test_policy_most_restrictive_wins() {
        let a = HazardPolicy {
            view_required: true,
            view_angle: 45.0,
            obstacle_mask: LayerMask::ENVIRONMENT,
            block_ranged_weapons: false,
            run: false,
        };
        let b = HazardPolicy {
            view_required: false,
            view_angle: 120.0,
            obstacle_mask: LayerMask::ACTORS,
            block_ranged_weapons: true,
            run: false,
        };

        let merged = a.merge(&b);
        assert!(!merged.view_required);
        assert_eq!(merged.view_angle, 120.0);
        assert!(merged.obstacle_mask.intersects(LayerMask::ACTORS));
        assert!(merged.obstacle_mask.intersects(LayerMask::ENVIRONMENT));
        assert!(merged.block_ranged_weapons);
        assert!(!merged.run);
    }

    fn arb_policy() -> impl Strategy<Value = HazardPolicy> {
        (any::<bool>(), 0.0f32..180.0, any::<bool>(), any::<bool>()).prop_map(|(view, angle, block, run)| {
            HazardPolicy {
                view_required: view,
                view_angle: angle,
                obstacle_mask: LayerMask::ENVIRONMENT,
                block_ranged_weapons: block,
                run,
            }
        })
    }

    proptest! {
        /// Merged bounds ⊇ A ∪ B; block = OR; view_required = AND
        #[test]
        fn prop_merge_is_superset(
            ax in -20.0f32..20.0, az in -20.0f32..20.0, ah in 0.5f32..6.0,
            fx in -0.99f32..0.99, fz in -0.99f32..0.99, bh in 0.5f32..6.0,
            pa in arb_policy(), pb in arb_policy(),
        ) {
            // Смещение B меньше суммы half size → объёмы пересекаются
            let reach = ah + bh;
            let a = hazard(Vec3::new(ax, 0.0, az), Vec3::splat(ah), pa);
            let b = hazard(Vec3::new(ax + fx * reach, 0.0, az + fz * reach), Vec3::splat(bh), pb);
            prop_assert!(a.intersects(&b));

            let merged = merge_overlapping(vec![a.clone(), b.clone()], &AtomicBool::new(false)).unwrap();
            prop_assert_eq!(merged.len(), 1);
            prop_assert!(encloses(&merged[0].bounds, &a.bounds));
            prop_assert!(encloses(&merged[0].bounds, &b.bounds));
            prop_assert_eq!(merged[0].policy.block_ranged_weapons, pa.block_ranged_weapons || pb.block_ranged_weapons);
            prop_assert_eq!(merged[0].policy.view_required, pa.view_required && pb.view_required);
        }
    }
}
