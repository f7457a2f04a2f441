//! GridNavMesh - headless walkable grid в XZ плоскости
//!
//! Uniform grid клеток фиксированного размера. Клетки можно динамически
//! блокировать (двери, баррикады) - это и есть "дыры", которые ловит
//! `raycast_blocked`.
//!
//! Путь: A* по 8 соседям (диагональ только если оба ортогональных соседа
//! проходимы), затем string-pulling - оставляем только углы.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;

use super::NavMesh;
use crate::shared::ground_distance;

/// Радиус поиска walkable клетки при построении пути (в клетках)
const PATH_SNAP_CELLS: f32 = 4.0;

#[derive(Debug, Clone)]
pub struct GridNavMesh {
    /// Минимальный угол grid (x, z)
    origin: Vec2,
    cell_size: f32,
    width: usize,
    depth: usize,
    /// Высота поверхности (Y)
    height: f32,
    blocked: Vec<bool>,
}

impl GridNavMesh {
    /// Grid, покрывающий прямоугольник `min..max` (x, z)
    pub fn new(min: Vec2, max: Vec2, cell_size: f32, height: f32) -> Self {
        debug_assert!(cell_size > 0.0, "GridNavMesh: cell_size must be positive");
        let extent = (max - min).max(Vec2::splat(cell_size));
        let width = (extent.x / cell_size).ceil() as usize;
        let depth = (extent.y / cell_size).ceil() as usize;

        Self {
            origin: min,
            cell_size,
            width,
            depth,
            height,
            blocked: vec![false; width * depth],
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Блокирует клетки, центры которых лежат внутри `bounds` (в XZ)
    pub fn block_area(&mut self, bounds: &Aabb3d) {
        self.set_area(bounds, true);
    }

    pub fn unblock_area(&mut self, bounds: &Aabb3d) {
        self.set_area(bounds, false);
    }

    fn set_area(&mut self, bounds: &Aabb3d, blocked: bool) {
        for iz in 0..self.depth {
            for ix in 0..self.width {
                let c = self.cell_center(ix, iz);
                if c.x >= bounds.min.x && c.x <= bounds.max.x && c.z >= bounds.min.z && c.z <= bounds.max.z {
                    self.blocked[iz * self.width + ix] = blocked;
                }
            }
        }
    }

    pub fn is_walkable(&self, point: Vec3) -> bool {
        self.cell_of(point).is_some_and(|(ix, iz)| self.walkable(ix, iz))
    }

    fn walkable(&self, ix: usize, iz: usize) -> bool {
        !self.blocked[iz * self.width + ix]
    }

    fn cell_of(&self, point: Vec3) -> Option<(usize, usize)> {
        let local = (Vec2::new(point.x, point.z) - self.origin) / self.cell_size;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let (ix, iz) = (local.x.floor() as usize, local.y.floor() as usize);
        (ix < self.width && iz < self.depth).then_some((ix, iz))
    }

    fn cell_center(&self, ix: usize, iz: usize) -> Vec3 {
        Vec3::new(
            self.origin.x + (ix as f32 + 0.5) * self.cell_size,
            self.height,
            self.origin.y + (iz as f32 + 0.5) * self.cell_size,
        )
    }

    /// Ближайшая точка внутри клетки (с небольшим отступом от границы)
    fn closest_in_cell(&self, ix: usize, iz: usize, point: Vec3) -> Vec3 {
        let inset = self.cell_size * 0.01;
        let min_x = self.origin.x + ix as f32 * self.cell_size + inset;
        let min_z = self.origin.y + iz as f32 * self.cell_size + inset;
        let max_x = min_x + self.cell_size - 2.0 * inset;
        let max_z = min_z + self.cell_size - 2.0 * inset;
        Vec3::new(point.x.clamp(min_x, max_x), self.height, point.z.clamp(min_z, max_z))
    }

    fn segment_clear(&self, from: Vec3, to: Vec3) -> bool {
        let delta = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
        let length = delta.length();
        let step = self.cell_size * 0.25;
        let samples = (length / step).ceil().max(1.0) as usize;

        (0..=samples).all(|i| {
            let t = i as f32 / samples as f32;
            self.is_walkable(from + delta * t)
        })
    }

    fn find_cells(&self, start: (usize, usize), goal: (usize, usize)) -> Option<Vec<(usize, usize)>> {
        let index = |(ix, iz): (usize, usize)| iz * self.width + ix;
        let heuristic = |(ix, iz): (usize, usize)| {
            let dx = (ix as f32 - goal.0 as f32).abs();
            let dz = (iz as f32 - goal.1 as f32).abs();
            // Octile distance
            (dx.max(dz) + (std::f32::consts::SQRT_2 - 1.0) * dx.min(dz)) * self.cell_size
        };

        let mut g_score = vec![f32::INFINITY; self.blocked.len()];
        let mut came_from: Vec<Option<usize>> = vec![None; self.blocked.len()];
        let mut open = BinaryHeap::new();

        g_score[index(start)] = 0.0;
        open.push(OpenNode {
            f: heuristic(start),
            cell: index(start),
        });

        while let Some(OpenNode { cell, f }) = open.pop() {
            let (ix, iz) = (cell % self.width, cell / self.width);
            if (ix, iz) == goal {
                let mut cells = vec![(ix, iz)];
                let mut current = cell;
                while let Some(prev) = came_from[current] {
                    cells.push((prev % self.width, prev / self.width));
                    current = prev;
                }
                cells.reverse();
                return Some(cells);
            }
            if f > g_score[cell] + heuristic((ix, iz)) + 1e-4 {
                continue; // Устаревшая запись
            }

            for (dx, dz) in NEIGHBOURS {
                let nx = ix as i64 + dx;
                let nz = iz as i64 + dz;
                if nx < 0 || nz < 0 || nx >= self.width as i64 || nz >= self.depth as i64 {
                    continue;
                }
                let (nx, nz) = (nx as usize, nz as usize);
                if !self.walkable(nx, nz) {
                    continue;
                }
                let diagonal = dx != 0 && dz != 0;
                // No corner cutting
                if diagonal && (!self.walkable(nx, iz) || !self.walkable(ix, nz)) {
                    continue;
                }

                let step = if diagonal { std::f32::consts::SQRT_2 } else { 1.0 } * self.cell_size;
                let tentative = g_score[cell] + step;
                let neighbour = index((nx, nz));
                if tentative < g_score[neighbour] {
                    g_score[neighbour] = tentative;
                    came_from[neighbour] = Some(cell);
                    open.push(OpenNode {
                        f: tentative + heuristic((nx, nz)),
                        cell: neighbour,
                    });
                }
            }
        }

        None
    }

    /// String pulling: от каждого угла прыгаем к самой дальней видимой точке
    fn pull_string(&self, points: Vec<Vec3>) -> Vec<Vec3> {
        if points.len() <= 2 {
            return points;
        }

        let mut corners = vec![points[0]];
        let mut anchor = 0;
        while anchor < points.len() - 1 {
            let mut next = anchor + 1;
            for candidate in (anchor + 2..points.len()).rev() {
                if self.segment_clear(points[anchor], points[candidate]) {
                    next = candidate;
                    break;
                }
            }
            corners.push(points[next]);
            anchor = next;
        }
        corners
    }
}

const NEIGHBOURS: [(i64, i64); 8] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Запись open set (min-heap по f, tie-break по индексу клетки)
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: f32,
    cell: usize,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse: BinaryHeap - max-heap
        other.f.total_cmp(&self.f).then_with(|| other.cell.cmp(&self.cell))
    }
}

impl NavMesh for GridNavMesh {
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        if let Some((ix, iz)) = self.cell_of(point) {
            if self.walkable(ix, iz) {
                // Над walkable клеткой: высота просто прижимается к плоскости
                return Some(Vec3::new(point.x, self.height, point.z));
            }
        }

        // Перебираем клетки в квадрате радиуса max_distance
        let to_cell = |v: f32, origin: f32| ((v - origin) / self.cell_size).floor() as i64;
        let min_x = to_cell(point.x - max_distance, self.origin.x).max(0);
        let max_x = to_cell(point.x + max_distance, self.origin.x).min(self.width as i64 - 1);
        let min_z = to_cell(point.z - max_distance, self.origin.y).max(0);
        let max_z = to_cell(point.z + max_distance, self.origin.y).min(self.depth as i64 - 1);

        let mut best: Option<(f32, Vec3)> = None;
        for iz in min_z..=max_z {
            for ix in min_x..=max_x {
                let (ix, iz) = (ix as usize, iz as usize);
                if !self.walkable(ix, iz) {
                    continue;
                }
                let candidate = self.closest_in_cell(ix, iz, point);
                let distance = ground_distance(point, candidate);
                if distance <= max_distance && best.map_or(true, |(d, _)| distance < d) {
                    best = Some((distance, candidate));
                }
            }
        }

        best.map(|(_, p)| p)
    }

    fn compute_path(&self, start: Vec3, end: Vec3) -> Vec<Vec3> {
        let snap = self.cell_size * PATH_SNAP_CELLS;
        let (Some(start), Some(end)) = (self.sample_position(start, snap), self.sample_position(end, snap)) else {
            return Vec::new();
        };
        let (Some(start_cell), Some(end_cell)) = (self.cell_of(start), self.cell_of(end)) else {
            return Vec::new();
        };

        let Some(cells) = self.find_cells(start_cell, end_cell) else {
            return Vec::new();
        };

        if cells.len() < 2 {
            return vec![start, end];
        }

        // Центры промежуточных клеток + реальные start/end
        let mut points = Vec::with_capacity(cells.len());
        points.push(start);
        points.extend(cells[1..cells.len() - 1].iter().map(|&(ix, iz)| self.cell_center(ix, iz)));
        points.push(end);

        self.pull_string(points)
    }

    fn raycast_blocked(&self, from: Vec3, to: Vec3) -> bool {
        !self.segment_clear(from, to)
    }
}
