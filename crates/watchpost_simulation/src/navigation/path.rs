//! Waypoint following - общий для mesh path и raw waypoint list
//!
//! Cursor двигается только на ±1 за вызов; на конце пути - Stop (замираем),
//! Restart (index = 0) или InvertPath (разворот на месте).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::ground_distance;

/// Что делать, когда достигнут последний waypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum EndPathMode {
    #[default]
    Stop,
    Restart,
    InvertPath,
}

/// Позиция на пути (индекс + направление обхода)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub struct PathCursor {
    pub index: usize,
    pub reversed: bool,
    /// Stop mode: последний waypoint достигнут
    pub finished: bool,
}

impl PathCursor {
    pub fn starting_at(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Переход к следующему waypoint. Возвращает true если index изменился.
    pub fn advance(&mut self, len: usize, mode: EndPathMode) -> bool {
        if len == 0 || self.finished {
            return false;
        }

        let at_end = if self.reversed {
            self.index == 0
        } else {
            self.index + 1 >= len
        };

        if !at_end {
            if self.reversed {
                self.index -= 1;
            } else {
                self.index += 1;
            }
            return true;
        }

        match mode {
            EndPathMode::Stop => {
                self.finished = true;
                false
            }
            EndPathMode::Restart => {
                let changed = self.index != 0;
                self.index = 0;
                self.reversed = false;
                changed
            }
            EndPathMode::InvertPath => {
                if len < 2 {
                    return false;
                }
                self.reversed = !self.reversed;
                self.index = if self.reversed { len - 2 } else { 1 };
                true
            }
        }
    }
}

/// Один шаг waypoint following
///
/// Если агент в пределах `jump_distance` от текущего waypoint - cursor
/// сдвигается (не больше одного раза за вызов). Возвращает актуальный waypoint.
pub fn step_waypoint(
    position: Vec3,
    waypoints: &[Vec3],
    cursor: &mut PathCursor,
    jump_distance: f32,
    mode: EndPathMode,
) -> Option<Vec3> {
    if waypoints.is_empty() {
        return None;
    }
    if cursor.index >= waypoints.len() {
        cursor.index = waypoints.len() - 1;
    }

    if ground_distance(position, waypoints[cursor.index]) <= jump_distance {
        cursor.advance(waypoints.len(), mode);
    }

    Some(waypoints[cursor.index])
}

/// Состояние пути агента (мутирует только Navigator)
#[derive(Debug, Clone, Default)]
pub struct PathState {
    /// Углы пути (corner 0 - позиция агента на момент расчёта)
    pub waypoints: Vec<Vec3>,
    pub cursor: PathCursor,
    /// Destination, запрошенный behavior'ом
    pub raw_destination: Option<Vec3>,
    /// Destination после snap на mesh
    pub mesh_destination: Option<Vec3>,
    /// Был ли хотя бы один расчёт
    pub computed: bool,
}

impl PathState {
    /// Путь короче двух точек - "уже пришли"
    pub fn is_arrived(&self) -> bool {
        self.waypoints.len() < 2 || self.cursor.finished
    }

    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.waypoints.get(self.cursor.index).copied()
    }

    /// Отрезок пути, по которому агент идёт сейчас (предыдущий → текущий waypoint)
    pub fn current_leg(&self) -> Option<(Vec3, Vec3)> {
        let index = self.cursor.index;
        if index == 0 || index >= self.waypoints.len() {
            return None;
        }
        Some((self.waypoints[index - 1], self.waypoints[index]))
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.cursor = PathCursor::default();
    }
}
