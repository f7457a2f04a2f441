//! Hearing - round-robin dispatcher звуков по группам сенсоров
//!
//! Архитектура:
//! - Сенсоры регистрируются в группы фиксированной ёмкости (по умолчанию 10)
//! - За тик обрабатывается ровно одна группа
//! - После последней группы цикла pending buffer очищается
//!
//! Fairness: при G группах сенсор из группы g обрабатывается на тиках t ≡ g (mod G).

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::Agent;

pub const DEFAULT_GROUP_CAPACITY: usize = 10;

/// Transient звук (живёт до конца текущего цикла dispatch)
#[derive(Debug, Clone, PartialEq)]
pub struct SoundEvent {
    pub position: Vec3,
    /// Максимальный радиус слышимости
    pub radius: f32,
    pub owner: Option<Entity>,
    pub tag: Option<String>,
}

/// Что сенсор услышал
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeardSound {
    pub position: Vec3,
    pub owner: Option<Entity>,
}

/// Event: кто-то пошумел (выстрел, шаги, разбитое стекло)
#[derive(Event, Debug, Clone)]
pub struct SoundPosted {
    pub position: Vec3,
    pub radius: f32,
    pub owner: Option<Entity>,
    pub tag: Option<String>,
}

/// Process-wide scheduler (Resource, живёт вместе с App)
#[derive(Resource, Debug)]
pub struct HearingScheduler {
    group_capacity: usize,
    /// Слоты групп (None - освобождённый слот, пустые группы удаляются)
    groups: Vec<Vec<Option<Entity>>>,
    locations: HashMap<Entity, (usize, usize)>,
    current_group: usize,
    pending: Vec<SoundEvent>,
}

impl Default for HearingScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP_CAPACITY)
    }
}

impl HearingScheduler {
    pub fn new(group_capacity: usize) -> Self {
        debug_assert!(group_capacity > 0, "HearingScheduler: group capacity must be positive");
        Self {
            group_capacity: group_capacity.max(1),
            groups: Vec::new(),
            locations: HashMap::new(),
            current_group: 0,
            pending: Vec::new(),
        }
    }

    /// Регистрирует сенсор, возвращает индекс группы
    ///
    /// Первый свободный слот (освобождённый или в неполной группе), иначе новая группа.
    pub fn register(&mut self, sensor: Entity) -> usize {
        if let Some(&(group, _)) = self.locations.get(&sensor) {
            return group;
        }

        let free = self.groups.iter().enumerate().find_map(|(group, slots)| {
            slots
                .iter()
                .position(Option::is_none)
                .or_else(|| (slots.len() < self.group_capacity).then_some(slots.len()))
                .map(|slot| (group, slot))
        });
        let (group, slot) = free.unwrap_or_else(|| {
            self.groups.push(Vec::with_capacity(self.group_capacity));
            (self.groups.len() - 1, 0)
        });

        if slot < self.groups[group].len() {
            self.groups[group][slot] = Some(sensor);
        } else {
            self.groups[group].push(Some(sensor));
        }
        self.locations.insert(sensor, (group, slot));
        group
    }

    /// Пустая группа удаляется, индексы следующих групп сдвигаются
    pub fn unregister(&mut self, sensor: Entity) {
        let Some((group, slot)) = self.locations.remove(&sensor) else {
            return;
        };
        self.groups[group][slot] = None;
        if self.groups[group].iter().any(Option::is_some) {
            return;
        }

        self.groups.remove(group);
        for (location, _) in self.locations.values_mut() {
            if *location > group {
                *location -= 1;
            }
        }

        if group < self.current_group {
            self.current_group -= 1;
        }
        if self.current_group >= self.groups.len() {
            // Удалена последняя необработанная группа - цикл завершён
            self.current_group = 0;
            self.pending.clear();
        }
    }

    /// Пост звука. Радиус 0 - no-op.
    pub fn post(&mut self, position: Vec3, radius: f32, owner: Option<Entity>, tag: Option<String>) {
        if radius <= 0.0 {
            return;
        }
        self.pending.push(SoundEvent {
            position,
            radius,
            owner,
            tag,
        });
    }

    /// Обработать текущую группу и перейти к следующей
    ///
    /// `deliver` вызывается для каждого зарегистрированного сенсора группы
    /// со всеми pending событиями.
    pub fn dispatch(&mut self, mut deliver: impl FnMut(Entity, &[SoundEvent])) {
        if self.groups.is_empty() {
            self.pending.clear();
            return;
        }

        let group = self.current_group;
        for sensor in self.groups[group].iter().flatten() {
            deliver(*sensor, &self.pending);
        }

        self.current_group += 1;
        if self.current_group >= self.groups.len() {
            // Конец цикла
            self.current_group = 0;
            self.pending.clear();
        }
    }

    pub fn group_of(&self, sensor: Entity) -> Option<usize> {
        self.locations.get(&sensor).map(|&(group, _)| group)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn current_group(&self) -> usize {
        self.current_group
    }

    pub fn pending(&self) -> &[SoundEvent] {
        &self.pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct HearingConfig {
    pub enabled: bool,
    /// Теги звуков, которые сенсор игнорирует ("footsteps", ...)
    pub ignore_tags: Vec<String>,
}

impl Default for HearingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ignore_tags: Vec::new(),
        }
    }
}

/// Сенсор слуха агента
#[derive(Component, Debug, Clone, Default)]
pub struct HearingSensor {
    pub config: HearingConfig,
    /// Последний доставленный звук (забирает controller)
    pub heard: Option<HeardSound>,
}

impl HearingSensor {
    pub fn new(config: HearingConfig) -> Self {
        Self { config, heard: None }
    }

    /// Первое подходящее событие побеждает
    pub fn listen(&mut self, agent: Entity, position: Vec3, events: &[SoundEvent]) -> Option<HeardSound> {
        if !self.config.enabled {
            return None;
        }

        let event = events.iter().find(|event| {
            event.owner != Some(agent)
                && position.distance(event.position) <= event.radius
                && !event
                    .tag
                    .as_ref()
                    .is_some_and(|tag| self.config.ignore_tags.contains(tag))
        })?;

        let heard = HeardSound {
            position: event.position,
            owner: event.owner,
        };
        self.heard = Some(heard);
        Some(heard)
    }

    pub fn take_heard(&mut self) -> Option<HeardSound> {
        self.heard.take()
    }
}

// ============================================================================
// Systems
// ============================================================================

/// Система: новые сенсоры → scheduler
pub fn register_hearing_sensors(
    mut scheduler: ResMut<HearingScheduler>,
    sensors: Query<Entity, Added<HearingSensor>>,
) {
    for entity in sensors.iter() {
        let group = scheduler.register(entity);
        crate::log(&format!("👂 Hearing sensor {:?} registered (group {})", entity, group));
    }
}

/// Система: despawn / remove → освобождаем слот
pub fn unregister_hearing_sensors(
    mut scheduler: ResMut<HearingScheduler>,
    mut removed: RemovedComponents<HearingSensor>,
) {
    for entity in removed.read() {
        scheduler.unregister(entity);
    }
}

/// Система: SoundPosted events → pending buffer
pub fn collect_posted_sounds(mut scheduler: ResMut<HearingScheduler>, mut sounds: EventReader<SoundPosted>) {
    for sound in sounds.read() {
        scheduler.post(sound.position, sound.radius, sound.owner, sound.tag.clone());
    }
}

/// Система: одна группа за тик
pub fn dispatch_hearing(
    mut scheduler: ResMut<HearingScheduler>,
    mut sensors: Query<(&Transform, &Agent, &mut HearingSensor)>,
) {
    scheduler.dispatch(|entity, events| {
        let Ok((transform, agent, mut sensor)) = sensors.get_mut(entity) else {
            return;
        };
        if !agent.enabled {
            return;
        }
        if let Some(heard) = sensor.listen(entity, transform.translation, events) {
            crate::log(&format!("👂 {:?} heard sound at {:?}", entity, heard.position));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensors(count: u32) -> Vec<Entity> {
        (0..count).map(Entity::from_raw).collect()
    }

    #[test]
    fn test_groups_fill_to_capacity() {
        let mut scheduler = HearingScheduler::new(10);
        for sensor in sensors(25) {
            scheduler.register(sensor);
        }

        assert_eq!(scheduler.group_count(), 3);
        assert_eq!(scheduler.group_of(Entity::from_raw(9)), Some(0));
        assert_eq!(scheduler.group_of(Entity::from_raw(10)), Some(1));
        assert_eq!(scheduler.group_of(Entity::from_raw(24)), Some(2));
    }

    #[test]
    fn test_one_group_per_tick_round_robin() {
        let mut scheduler = HearingScheduler::new(2);
        for sensor in sensors(6) {
            scheduler.register(sensor);
        }

        let mut evaluated = Vec::new();
        for tick in 0..6 {
            scheduler.dispatch(|sensor, _| evaluated.push((tick, sensor.index())));
        }

        // Sensor в группе g обрабатывается на тиках t ≡ g (mod 3)
        for (tick, index) in evaluated {
            assert_eq!(tick % 3, index as usize / 2);
        }
    }

    #[test]
    fn test_zero_radius_sound_is_noop() {
        let mut scheduler = HearingScheduler::default();
        scheduler.register(Entity::from_raw(1));
        scheduler.post(Vec3::ZERO, 0.0, None, None);

        assert!(scheduler.pending().is_empty());

        let mut delivered = 0;
        scheduler.dispatch(|_, events| delivered += events.len());
        assert_eq!(delivered, 0);
    }

    #[test]
    fn test_buffer_cleared_after_full_cycle() {
        let mut scheduler = HearingScheduler::new(1);
        scheduler.register(Entity::from_raw(1));
        scheduler.register(Entity::from_raw(2));
        scheduler.post(Vec3::ZERO, 10.0, None, None);

        scheduler.dispatch(|_, events| assert_eq!(events.len(), 1));
        assert_eq!(scheduler.pending().len(), 1);
        scheduler.dispatch(|_, events| assert_eq!(events.len(), 1));
        assert!(scheduler.pending().is_empty());
    }

    #[test]
    fn test_unregister_frees_slot_keeps_groups() {
        let mut scheduler = HearingScheduler::new(2);
        for sensor in sensors(4) {
            scheduler.register(sensor);
        }
        scheduler.unregister(Entity::from_raw(0));
        scheduler.unregister(Entity::from_raw(42)); // Неизвестный - no-op

        assert_eq!(scheduler.group_count(), 2);
        assert_eq!(scheduler.group_of(Entity::from_raw(0)), None);
        assert_eq!(scheduler.group_of(Entity::from_raw(3)), Some(1));

        let mut seen = Vec::new();
        scheduler.dispatch(|sensor, _| seen.push(sensor));
        assert_eq!(seen, vec![Entity::from_raw(1)]);
    }

    #[test]
    fn test_churn_reuses_slots() {
        let mut scheduler = HearingScheduler::new(10);
        for sensor in sensors(10) {
            scheduler.register(sensor);
        }
        scheduler.unregister(Entity::from_raw(3));

        for cycle in 0..100 {
            let transient = Entity::from_raw(100 + cycle);
            assert_eq!(scheduler.register(transient), 0);
            scheduler.unregister(transient);
        }

        assert_eq!(scheduler.locations.len(), 9);
        assert_eq!(scheduler.group_count(), 1);
    }

    #[test]
    fn test_empty_group_removed_and_indices_shift() {
        let mut scheduler = HearingScheduler::new(2);
        for sensor in sensors(6) {
            scheduler.register(sensor);
        }
        // Тик группы 0, дальше очередь группы 1
        scheduler.dispatch(|_, _| {});
        assert_eq!(scheduler.current_group(), 1);

        scheduler.unregister(Entity::from_raw(0));
        scheduler.unregister(Entity::from_raw(1));

        assert_eq!(scheduler.group_count(), 2);
        assert_eq!(scheduler.group_of(Entity::from_raw(2)), Some(0));
        assert_eq!(scheduler.group_of(Entity::from_raw(5)), Some(1));
        // Необработанная группа (бывшая 1) всё ещё следующая
        assert_eq!(scheduler.current_group(), 0);

        let mut seen = Vec::new();
        scheduler.dispatch(|sensor, _| seen.push(sensor.index()));
        assert_eq!(seen, vec![2, 3]);
    }

    #[test]
    fn test_removing_last_pending_group_ends_cycle() {
        let mut scheduler = HearingScheduler::new(1);
        scheduler.register(Entity::from_raw(1));
        scheduler.register(Entity::from_raw(2));
        scheduler.post(Vec3::ZERO, 10.0, None, None);
        scheduler.dispatch(|_, _| {});

        scheduler.unregister(Entity::from_raw(2));

        assert_eq!(scheduler.group_count(), 1);
        assert_eq!(scheduler.current_group(), 0);
        assert!(scheduler.pending().is_empty());
    }

    #[test]
    fn test_listen_filters_owner_distance_and_tags() {
        let agent = Entity::from_raw(1);
        let mut sensor = HearingSensor::new(HearingConfig {
            enabled: true,
            ignore_tags: vec!["footsteps".to_string()],
        });

        let events = vec![
            // Свой звук
            SoundEvent { position: Vec3::ZERO, radius: 50.0, owner: Some(agent), tag: None },
            // Слишком далеко
            SoundEvent { position: Vec3::new(30.0, 0.0, 0.0), radius: 10.0, owner: None, tag: None },
            // Игнорируемый тег
            SoundEvent { position: Vec3::ZERO, radius: 50.0, owner: None, tag: Some("footsteps".to_string()) },
            SoundEvent { position: Vec3::new(3.0, 0.0, 0.0), radius: 5.0, owner: Some(Entity::from_raw(7)), tag: Some("gunshot".to_string()) },
            SoundEvent { position: Vec3::new(1.0, 0.0, 0.0), radius: 5.0, owner: None, tag: None },
        ];

        let heard = sensor.listen(agent, Vec3::ZERO, &events).unwrap();
        // Первое подходящее, не ближайшее
        assert_eq!(heard.position, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(heard.owner, Some(Entity::from_raw(7)));
        assert_eq!(sensor.take_heard(), Some(heard));
        assert_eq!(sensor.take_heard(), None);

        sensor.config.enabled = false;
        assert!(sensor.listen(agent, Vec3::ZERO, &events).is_none());
    }
}
