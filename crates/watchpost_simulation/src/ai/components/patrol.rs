//! Patrol controller - охранник
//!
//! Patrol → Attacking (цель в FOV)
//! Attacking → MovingToPossibleTargetPosition (цель вне обзора lose_target_delay секунд)
//! Patrol/MovingTo → MovingToPossibleTargetPosition (звук, попадание)
//! MovingTo → SearchingForLostTarget (дошли, alert ещё активен) | Patrol
//! SearchingForLostTarget → Patrol (max_search_duration)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::{AgentController, Senses};
use crate::behaviors::{
    AgentContext, AttackBehavior, AttackConfig, FollowPathBehavior, FollowPointBehavior, FollowPointConfig,
    PatrolRoute, SubBehavior, WanderAreaBehavior, WanderAreaConfig, WanderBehavior, WanderConfig,
};
use crate::components::{AgentIntent, BehaviorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum PatrolState {
    #[default]
    Patrol,
    MovingToPossibleTargetPosition,
    SearchingForLostTarget,
    Attacking,
}

impl PatrolState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatrolState::Patrol => "Patrol",
            PatrolState::MovingToPossibleTargetPosition => "MovingToPossibleTargetPosition",
            PatrolState::SearchingForLostTarget => "SearchingForLostTarget",
            PatrolState::Attacking => "Attacking",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct PatrolConfig {
    /// Сколько секунд цель может быть вне обзора до потери (секунды)
    pub lose_target_delay: f32,
    /// Сколько длится тревога после потери контакта (секунды)
    pub alert_duration: f32,
    pub max_search_duration: f32,
    /// Радиус поиска вокруг последней известной позиции
    pub search_radius: f32,
    /// Маршрут патруля (приоритет над area / wander)
    pub route: Option<PatrolRoute>,
    pub area: Option<WanderAreaConfig>,
    /// Свободное блуждание вокруг spawn если нет route / area
    pub wander_enabled: bool,
    pub wander: WanderConfig,
    pub follow_point: FollowPointConfig,
    pub attack: AttackConfig,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            lose_target_delay: 10.0,
            alert_duration: 15.0,
            max_search_duration: 20.0,
            search_radius: 6.0,
            route: None,
            area: None,
            wander_enabled: true,
            wander: WanderConfig::default(),
            follow_point: FollowPointConfig::default(),
            attack: AttackConfig::default(),
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct PatrolController {
    pub config: PatrolConfig,
    state: PatrolState,
    target: Option<Entity>,
    /// Последняя известная позиция цели / источника звука
    last_known_position: Option<Vec3>,
    /// Сколько секунд цель вне обзора
    lose_timer: f32,
    /// Остаток тревоги (декремент вне Attacking)
    alert_timer: f32,
    search_timer: f32,
    /// Transition в этом тике - пересчитать путь без throttling
    pending_path_update: bool,

    follow_path: Option<FollowPathBehavior>,
    wander_area: Option<WanderAreaBehavior>,
    wander: WanderBehavior,
    search: WanderBehavior,
    follow_point: FollowPointBehavior,
    attack: AttackBehavior,
}

impl PatrolController {
    pub fn new(config: PatrolConfig, spawn_position: Vec3) -> Self {
        let search = WanderConfig {
            radius: config.search_radius,
            ..config.wander.clone()
        };
        Self {
            follow_path: config.route.clone().map(FollowPathBehavior::new),
            wander_area: config.area.clone().map(WanderAreaBehavior::new),
            wander: WanderBehavior::new(config.wander.clone(), spawn_position),
            search: WanderBehavior::new(search, spawn_position),
            follow_point: FollowPointBehavior::new(config.follow_point.clone()),
            attack: AttackBehavior::new(config.attack.clone()),
            config,
            state: PatrolState::Patrol,
            target: None,
            last_known_position: None,
            lose_timer: 0.0,
            alert_timer: 0.0,
            search_timer: 0.0,
            pending_path_update: false,
        }
    }

    pub fn state(&self) -> PatrolState {
        self.state
    }

    pub fn last_known_position(&self) -> Option<Vec3> {
        self.last_known_position
    }

    pub fn alert_timer(&self) -> f32 {
        self.alert_timer
    }

    pub fn attack(&self) -> &AttackBehavior {
        &self.attack
    }

    fn transition(&mut self, next: PatrolState) {
        if self.state == next {
            return;
        }
        self.state = next;
        self.pending_path_update = true;

        match next {
            PatrolState::Patrol => {
                self.target = None;
                if let Some(follow_path) = self.follow_path.as_mut() {
                    follow_path.reset();
                }
                if let Some(wander_area) = self.wander_area.as_mut() {
                    wander_area.reset();
                }
                self.wander.reset();
            }
            PatrolState::MovingToPossibleTargetPosition => {
                self.follow_point.set_point(self.last_known_position);
            }
            PatrolState::SearchingForLostTarget => {
                self.search_timer = 0.0;
                if let Some(position) = self.last_known_position {
                    self.search.set_origin(position);
                } else {
                    self.search.reset();
                }
            }
            PatrolState::Attacking => {
                self.lose_timer = 0.0;
                self.attack.set_target(self.target);
                self.attack.reset();
            }
        }
    }

    /// Цель потеряна: идём туда, где её видели в последний раз
    fn lose_target(&mut self) {
        self.target = None;
        self.attack.set_target(None);
        self.transition(PatrolState::MovingToPossibleTargetPosition);
    }

    /// Звук или попадание вне боя
    fn investigate(&mut self, position: Vec3) {
        self.last_known_position = Some(position);
        self.alert_timer = self.config.alert_duration;
        if self.state == PatrolState::MovingToPossibleTargetPosition {
            // Уже идём - просто новая точка
            self.follow_point.set_point(Some(position));
            self.pending_path_update = true;
        } else {
            self.transition(PatrolState::MovingToPossibleTargetPosition);
        }
    }
}

impl AgentController for PatrolController {
    fn decide(&mut self, senses: &Senses, dt: f32) {
        if self.state == PatrolState::Attacking {
            if !senses.target_alive {
                self.lose_target();
                return;
            }
            if senses.target_in_view {
                self.lose_timer = 0.0;
                self.alert_timer = self.config.alert_duration;
                if let Some(position) = senses.target_position {
                    self.last_known_position = Some(position);
                }
                return;
            }

            self.lose_timer += dt;
            if self.lose_timer >= self.config.lose_target_delay {
                self.lose_target();
            }
            return;
        }

        self.alert_timer = (self.alert_timer - dt).max(0.0);

        // ===== Зрение - приоритет =====
        if let Some(target) = senses.visible_target {
            self.target = Some(target);
            self.last_known_position = senses.visible_position;
            self.alert_timer = self.config.alert_duration;
            self.transition(PatrolState::Attacking);
            return;
        }

        // ===== Звук / попадание =====
        if self.state != PatrolState::SearchingForLostTarget {
            let alert = senses.heard.as_ref().map(|heard| heard.position).or(senses.damage_alert);
            if let Some(position) = alert {
                self.investigate(position);
                return;
            }
        }

        match self.state {
            PatrolState::MovingToPossibleTargetPosition => {
                if self.follow_point.is_reached(senses.position) {
                    let next = if self.alert_timer > 0.0 {
                        PatrolState::SearchingForLostTarget
                    } else {
                        PatrolState::Patrol
                    };
                    self.transition(next);
                }
            }
            PatrolState::SearchingForLostTarget => {
                self.search_timer += dt;
                if self.search_timer >= self.config.max_search_duration {
                    self.transition(PatrolState::Patrol);
                }
            }
            PatrolState::Patrol | PatrolState::Attacking => {}
        }
    }

    fn dispatch(&mut self, ctx: &mut AgentContext) -> AgentIntent {
        if std::mem::take(&mut self.pending_path_update) {
            ctx.force_path_update = true;
        }

        match self.state {
            PatrolState::Patrol => {
                if let Some(follow_path) = self.follow_path.as_mut() {
                    follow_path.tick(ctx)
                } else if let Some(wander_area) = self.wander_area.as_mut() {
                    wander_area.tick(ctx)
                } else if self.config.wander_enabled {
                    self.wander.tick(ctx)
                } else {
                    ctx.stopped()
                }
            }
            PatrolState::MovingToPossibleTargetPosition => self.follow_point.tick(ctx),
            PatrolState::SearchingForLostTarget => self.search.tick(ctx),
            PatrolState::Attacking => self.attack.tick(ctx),
        }
    }

    fn state_name(&self) -> &'static str {
        self.state.as_str()
    }

    fn active_kind(&self) -> Option<BehaviorKind> {
        match self.state {
            PatrolState::Patrol => {
                if let Some(follow_path) = self.follow_path.as_ref() {
                    Some(follow_path.kind())
                } else if let Some(wander_area) = self.wander_area.as_ref() {
                    Some(wander_area.kind())
                } else if self.config.wander_enabled {
                    Some(self.wander.kind())
                } else {
                    None
                }
            }
            PatrolState::MovingToPossibleTargetPosition => Some(self.follow_point.kind()),
            PatrolState::SearchingForLostTarget => Some(self.search.kind()),
            PatrolState::Attacking => Some(self.attack.kind()),
        }
    }

    fn is_attacking(&self) -> bool {
        self.state == PatrolState::Attacking
    }

    fn target(&self) -> Option<Entity> {
        self.target
    }
}
