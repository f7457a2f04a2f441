//! Zombie controller - melee агент без памяти о маршруте
//!
//! Видимая цель всегда → Attacking. Потеря из вида → идём к последней
//! позиции → ищем вокруг → по таймауту снова бродим.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::{AgentController, Senses};
use crate::behaviors::{
    AgentContext, AttackBehavior, AttackConfig, FollowPointBehavior, FollowPointConfig, SubBehavior, WanderBehavior,
    WanderConfig,
};
use crate::components::{AgentIntent, BehaviorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum ZombieState {
    #[default]
    Patrolling,
    Attacking,
    MoveToLastTargetPosition,
    SearchLastTarget,
}

impl ZombieState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZombieState::Patrolling => "Patrolling",
            ZombieState::Attacking => "Attacking",
            ZombieState::MoveToLastTargetPosition => "MoveToLastTargetPosition",
            ZombieState::SearchLastTarget => "SearchLastTarget",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct ZombieConfig {
    pub max_search_duration: f32,
    pub search_radius: f32,
    pub wander: WanderConfig,
    pub follow_point: FollowPointConfig,
    pub attack: AttackConfig,
}

impl Default for ZombieConfig {
    fn default() -> Self {
        Self {
            max_search_duration: 10.0,
            search_radius: 5.0,
            wander: WanderConfig {
                radius: 8.0,
                wait_time: 4.0,
                ..Default::default()
            },
            follow_point: FollowPointConfig {
                stop_distance: 1.0,
                // Зомби не бегают к звуку
                start_run_distance: f32::MAX,
            },
            attack: AttackConfig::default(),
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct ZombieController {
    pub config: ZombieConfig,
    state: ZombieState,
    target: Option<Entity>,
    last_known_position: Option<Vec3>,
    search_timer: f32,
    pending_path_update: bool,

    wander: WanderBehavior,
    search: WanderBehavior,
    follow_point: FollowPointBehavior,
    attack: AttackBehavior,
}

impl ZombieController {
    pub fn new(config: ZombieConfig, spawn_position: Vec3) -> Self {
        let search = WanderConfig {
            radius: config.search_radius,
            ..config.wander.clone()
        };
        Self {
            wander: WanderBehavior::new(config.wander.clone(), spawn_position),
            search: WanderBehavior::new(search, spawn_position),
            follow_point: FollowPointBehavior::new(config.follow_point.clone()),
            attack: AttackBehavior::new(config.attack.clone()),
            config,
            state: ZombieState::Patrolling,
            target: None,
            last_known_position: None,
            search_timer: 0.0,
            pending_path_update: false,
        }
    }

    pub fn state(&self) -> ZombieState {
        self.state
    }

    pub fn last_known_position(&self) -> Option<Vec3> {
        self.last_known_position
    }

    fn transition(&mut self, next: ZombieState) {
        if self.state == next {
            return;
        }
        self.state = next;
        self.pending_path_update = true;

        match next {
            ZombieState::Patrolling => self.wander.reset(),
            ZombieState::Attacking => {
                self.attack.set_target(self.target);
                self.attack.reset();
            }
            ZombieState::MoveToLastTargetPosition => {
                self.target = None;
                self.attack.set_target(None);
                self.follow_point.set_point(self.last_known_position);
            }
            ZombieState::SearchLastTarget => {
                self.search_timer = 0.0;
                if let Some(position) = self.last_known_position {
                    self.search.set_origin(position);
                } else {
                    self.search.reset();
                }
            }
        }
    }
}

impl AgentController for ZombieController {
    fn decide(&mut self, senses: &Senses, dt: f32) {
        // ===== Зрение всегда побеждает =====
        if let Some(target) = senses.visible_target {
            if self.target != Some(target) {
                self.target = Some(target);
                self.attack.set_target(Some(target));
                self.pending_path_update = true;
            }
            if senses.visible_position.is_some() {
                self.last_known_position = senses.visible_position;
            }
            self.transition(ZombieState::Attacking);
            return;
        }

        if self.state == ZombieState::Attacking {
            self.transition(ZombieState::MoveToLastTargetPosition);
            return;
        }

        if let Some(heard) = senses.heard.as_ref() {
            self.last_known_position = Some(heard.position);
            if self.state == ZombieState::MoveToLastTargetPosition {
                self.follow_point.set_point(Some(heard.position));
                self.pending_path_update = true;
            } else {
                self.transition(ZombieState::MoveToLastTargetPosition);
            }
            return;
        }

        match self.state {
            ZombieState::MoveToLastTargetPosition => {
                if self.follow_point.is_reached(senses.position) {
                    self.transition(ZombieState::SearchLastTarget);
                }
            }
            ZombieState::SearchLastTarget => {
                self.search_timer += dt;
                if self.search_timer >= self.config.max_search_duration {
                    self.transition(ZombieState::Patrolling);
                }
            }
            ZombieState::Patrolling | ZombieState::Attacking => {}
        }
    }

    fn dispatch(&mut self, ctx: &mut AgentContext) -> AgentIntent {
        if std::mem::take(&mut self.pending_path_update) {
            ctx.force_path_update = true;
        }

        match self.state {
            ZombieState::Patrolling => self.wander.tick(ctx),
            ZombieState::Attacking => self.attack.tick(ctx),
            ZombieState::MoveToLastTargetPosition => self.follow_point.tick(ctx),
            ZombieState::SearchLastTarget => self.search.tick(ctx),
        }
    }

    fn state_name(&self) -> &'static str {
        self.state.as_str()
    }

    fn active_kind(&self) -> Option<BehaviorKind> {
        Some(match self.state {
            ZombieState::Patrolling => self.wander.kind(),
            ZombieState::Attacking => self.attack.kind(),
            ZombieState::MoveToLastTargetPosition => self.follow_point.kind(),
            ZombieState::SearchLastTarget => self.search.kind(),
        })
    }

    fn is_attacking(&self) -> bool {
        self.state == ZombieState::Attacking
    }

    fn target(&self) -> Option<Entity> {
        self.target
    }
}
