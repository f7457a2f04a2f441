//! EscapeBehavior - per-agent hazard avoidance
//!
//! Агент держит private копию raw регионов (sync из HazardDirectory) и
//! snapshot simplified регионов. Snapshot подменяется целиком, только когда
//! фоновый merge завершён; пока merge идёт, escape логика читает последний
//! опубликованный snapshot.
//!
//! Per-tick override применяется ПОСЛЕ sub-behavior и damage detector.

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::directory::{HazardChange, HazardDirectory};
use super::merge::{MergePoll, MergeWorker};
use super::region::{HazardId, HazardPolicy, HazardRegion, SimplifiedHazard};
use crate::behaviors::AgentContext;
use crate::components::AgentIntent;
use crate::navigation::{NavigationSettings, Navigator};
use crate::shared::{
    angle_degrees, center, contains_point, contains_point_xz, flatten, ground_direction_or, horizontal_extent,
};

/// Policy для конкретного тега hazard региона
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
pub struct TaggedPolicy {
    pub tag: String,
    pub policy: HazardPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct EscapeConfig {
    pub policies: Vec<TaggedPolicy>,
    /// Для тегов без явной policy (None - такие регионы игнорируются)
    pub default_policy: Option<HazardPolicy>,
}

impl Default for EscapeConfig {
    fn default() -> Self {
        Self {
            policies: Vec::new(),
            default_policy: Some(HazardPolicy::default()),
        }
    }
}

impl EscapeConfig {
    pub fn policy_for(&self, tag: &str) -> Option<HazardPolicy> {
        self.policies
            .iter()
            .find(|tagged| tagged.tag == tag)
            .map(|tagged| tagged.policy)
            .or(self.default_policy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum EscapeState {
    #[default]
    NotInHazard,
    /// Внутри, но регион не требует бегства (не виден)
    InHazardNotEscaping,
    InHazardEscaping,
}

#[derive(Component, Debug)]
pub struct EscapeBehavior {
    pub config: EscapeConfig,
    raw: BTreeMap<HazardId, HazardRegion>,
    simplified: Arc<[SimplifiedHazard]>,
    worker: MergeWorker,
    merge_requested: bool,
    state: EscapeState,
    /// Индекс текущего региона в snapshot + его bounds (детект изменения)
    current: Option<(usize, Aabb3d)>,
    is_trying_escape: bool,
    escape_point: Option<Vec3>,
    /// Отдельный навигатор: путь бегства не сбивает путь sub-behavior
    navigator: Navigator,
}

impl Default for EscapeBehavior {
    fn default() -> Self {
        Self::new(EscapeConfig::default(), NavigationSettings::default())
    }
}

impl EscapeBehavior {
    pub fn new(config: EscapeConfig, settings: NavigationSettings) -> Self {
        Self {
            config,
            raw: BTreeMap::new(),
            simplified: Arc::from(Vec::new()),
            worker: MergeWorker::default(),
            merge_requested: false,
            state: EscapeState::NotInHazard,
            current: None,
            is_trying_escape: false,
            escape_point: None,
            navigator: Navigator::new(settings),
        }
    }

    // ============================================================================
    // Directory sync
    // ============================================================================

    /// Полная копия реестра (при spawn агента)
    pub fn register(&mut self, directory: &HazardDirectory) {
        self.raw = directory
            .regions()
            .map(|(id, region)| (id, region.clone()))
            .collect();
        self.request_merge();
    }

    pub fn apply_change(&mut self, change: &HazardChange) {
        match change {
            HazardChange::Added(id, region) | HazardChange::Updated(id, region) => {
                self.raw.insert(*id, region.clone());
            }
            HazardChange::Removed(id) => {
                self.raw.remove(id);
            }
        }
        self.request_merge();
    }

    /// Устаревший merge отменяется сразу; новый стартует в следующем update
    /// (фильтр must-escape нужен контекст агента). Уже готовый результат
    /// публикуется до abort.
    fn request_merge(&mut self) {
        self.poll_merge();
        self.worker.abort();
        self.merge_requested = true;
    }

    // ============================================================================
    // Merge
    // ============================================================================

    /// Фильтр must-escape (синхронно) → фоновый merge
    pub fn start_merge(&mut self, ctx: &AgentContext) {
        self.merge_requested = false;

        let seeds: Vec<SimplifiedHazard> = self
            .raw
            .values()
            .filter_map(|region| {
                let policy = self.config.policy_for(&region.tag);
                debug_assert!(policy.is_some(), "EscapeConfig: no policy for hazard tag '{}'", region.tag);
                policy.map(|policy| SimplifiedHazard {
                    bounds: region.bounds,
                    policy,
                })
            })
            .filter(|hazard| self.must_escape(ctx, hazard))
            .collect();

        if seeds.len() < 2 {
            // Сливать нечего
            self.worker.abort();
            self.publish(seeds);
        } else {
            self.worker.start(seeds);
        }
    }

    /// Блокирующее ожидание активного merge
    pub fn wait_for_merge(&mut self) {
        if let MergePoll::Finished(regions) = self.worker.wait() {
            self.publish(regions);
        }
    }

    /// Non-blocking: готовый результат → новый snapshot
    fn poll_merge(&mut self) {
        if let MergePoll::Finished(regions) = self.worker.poll() {
            self.publish(regions);
        }
    }

    fn publish(&mut self, regions: Vec<SimplifiedHazard>) {
        self.simplified = Arc::from(regions);
        // Индексы старого snapshot больше не валидны
        self.current = self
            .current
            .and_then(|(_, bounds)| self.simplified.iter().position(|h| h.bounds == bounds).map(|i| (i, bounds)));
    }

    // ============================================================================
    // Per-tick update
    // ============================================================================

    /// Применяет escape override к intent. Возвращает true если intent изменён.
    pub fn update(&mut self, ctx: &AgentContext, intent: &mut AgentIntent) -> bool {
        self.poll_merge();
        if self.merge_requested {
            self.start_merge(ctx);
        }

        self.navigator.settings = ctx.navigator.settings;

        let Some(index) = self.containing_region(ctx.position) else {
            self.leave_hazard(ctx);
            return self.block_entry(ctx, intent);
        };
        let region = self.simplified[index].clone();

        if self.current != Some((index, region.bounds)) {
            self.enter_region(ctx, index, &region);
        }
        if !self.is_trying_escape {
            return false;
        }

        let fresh = self.escape_point.is_none();
        if fresh {
            self.escape_point = self.compute_escape_point(ctx, &region.bounds);
        }
        let Some(point) = self.escape_point else {
            // Snap не удался - повтор в следующем тике
            return false;
        };

        intent.move_direction = self
            .navigator
            .advance(ctx.nav_mesh, ctx.position, point, fresh, ctx.dt);
        if ctx.distance_to(point) <= self.navigator.settings.jump_distance {
            // Дошли, но всё ещё внутри (регион вырос) - новая точка
            self.escape_point = None;
        }
        intent.running = region.policy.run;

        let keep_attack = ctx.weapon.is_ranged() && intent.attack_pose && !region.policy.block_ranged_weapons;
        if !keep_attack {
            intent.clear_attack();
            intent.look_direction = ground_direction_or(ctx.position - center(&region.bounds), ctx.view_forward());
        }
        true
    }

    /// Текущий регион (cached index пока агент внутри)
    fn containing_region(&self, position: Vec3) -> Option<usize> {
        if let Some((index, _)) = self.current {
            if self
                .simplified
                .get(index)
                .is_some_and(|hazard| contains_point(&hazard.bounds, position))
            {
                return Some(index);
            }
        }
        self.simplified
            .iter()
            .position(|hazard| contains_point(&hazard.bounds, position))
    }

    fn enter_region(&mut self, ctx: &AgentContext, index: usize, region: &SimplifiedHazard) {
        self.current = Some((index, region.bounds));
        self.is_trying_escape = self.must_escape(ctx, region);
        self.escape_point = None;
        self.navigator.reset();

        let state = if self.is_trying_escape {
            EscapeState::InHazardEscaping
        } else {
            EscapeState::InHazardNotEscaping
        };
        if state != self.state {
            crate::log(&format!("🔥 {:?} hazard: {:?} → {:?}", ctx.entity, self.state, state));
            self.state = state;
        }
    }

    fn leave_hazard(&mut self, ctx: &AgentContext) {
        if self.state == EscapeState::NotInHazard {
            return;
        }
        crate::log(&format!("🔥 {:?} left hazard", ctx.entity));
        self.state = EscapeState::NotInHazard;
        self.current = None;
        self.is_trying_escape = false;
        self.escape_point = None;
        // Регионы, отфильтрованные по видимости, могли стать актуальны
        self.merge_requested = true;
    }

    /// Снаружи: не шагать внутрь региона
    fn block_entry(&self, ctx: &AgentContext, intent: &mut AgentIntent) -> bool {
        if !intent.is_moving() {
            return false;
        }
        let probe = ctx.position + flatten(intent.move_direction).normalize_or_zero() * ctx.radius();
        if self
            .simplified
            .iter()
            .any(|hazard| contains_point(&hazard.bounds, probe))
        {
            intent.move_direction = Vec3::ZERO;
            return true;
        }
        false
    }

    /// Надо ли убегать из региона (видимость по policy)
    pub fn must_escape(&self, ctx: &AgentContext, hazard: &SimplifiedHazard) -> bool {
        let policy = &hazard.policy;
        if !policy.view_required {
            return true;
        }

        let hazard_center = center(&hazard.bounds);
        let to_hazard = flatten(hazard_center - ctx.position);
        if angle_degrees(flatten(ctx.view_forward()), to_hazard) > policy.view_angle {
            return false;
        }

        ctx.spatial
            .line_of_sight(ctx.center(), hazard_center, policy.obstacle_mask)
            .is_none()
    }

    /// Точка выхода: от центра региона через агента, за горизонтальный extent
    fn compute_escape_point(&self, ctx: &AgentContext, bounds: &Aabb3d) -> Option<Vec3> {
        let mesh = ctx.is_mesh_constrained();
        let snap_distance = ctx.navigator.settings.snap_distance;

        let mut agent = ctx.position;
        let mut hazard_center = center(bounds);
        if mesh {
            agent = ctx.nav_mesh.sample_position(agent, snap_distance).unwrap_or(agent);
            hazard_center = ctx
                .nav_mesh
                .sample_position(hazard_center, snap_distance)
                .unwrap_or(hazard_center);
        }

        let away = ground_direction_or(agent - hazard_center, ground_direction_or(-ctx.view_forward(), Vec3::X));
        let distance = horizontal_extent(bounds) + ctx.radius();
        let candidate = Vec3::new(hazard_center.x, agent.y, hazard_center.z) + away * distance;

        if !mesh {
            return Some(candidate);
        }
        let snapped = ctx.nav_mesh.sample_position(candidate, snap_distance)?;
        if contains_point_xz(bounds, snapped) {
            return None;
        }
        Some(snapped)
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn state(&self) -> EscapeState {
        self.state
    }

    pub fn is_escaping(&self) -> bool {
        self.state == EscapeState::InHazardEscaping
    }

    pub fn is_merging(&self) -> bool {
        self.worker.is_running()
    }

    /// Текущий опубликованный snapshot
    pub fn simplified(&self) -> &Arc<[SimplifiedHazard]> {
        &self.simplified
    }

    pub fn raw_len(&self) -> usize {
        self.raw.len()
    }

    pub fn escape_point(&self) -> Option<Vec3> {
        self.escape_point
    }
}
