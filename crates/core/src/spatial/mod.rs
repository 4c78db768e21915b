//! Uniform-grid spatial hash for neighbor queries over players, mobs, and
//! loot (spec 4.5). Rebuilt once per tick.

use std::collections::HashMap;

use crate::wire::Vector2;

pub const DEFAULT_CELL_SIZE: f32 = 10.0;

type Cell = (i32, i32);

#[derive(Debug)]
pub struct SpatialGrid<T: Copy> {
    cell_size: f32,
    cells: HashMap<Cell, Vec<(Vector2, T)>>,
}

impl<T: Copy> SpatialGrid<T> {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, point: Vector2) -> Cell {
        (
            (point.0 / self.cell_size).floor() as i32,
            (point.1 / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, position: Vector2, value: T) {
        self.cells
            .entry(self.cell_of(position))
            .or_default()
            .push((position, value));
    }

    /// Visits every cell within `ceil(radius / cell_size)` rings of
    /// `point`'s cell and filters to exact distance, per spec 4.5.
    pub fn nearby(&self, point: Vector2, radius: f32) -> Vec<T> {
        let ring = (radius / self.cell_size).ceil() as i32;
        let (cx, cy) = self.cell_of(point);
        let mut found = Vec::new();

        for dx in -ring..=ring {
            for dy in -ring..=ring {
                let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &(pos, value) in bucket {
                    if point.distance(pos) <= radius {
                        found.push(value);
                    }
                }
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_neighbors_within_radius() {
        let mut grid = SpatialGrid::new(DEFAULT_CELL_SIZE);
        grid.insert(Vector2(0.0, 0.0), 1u32);
        grid.insert(Vector2(5.0, 0.0), 2u32);
        grid.insert(Vector2(50.0, 50.0), 3u32);

        let mut found = grid.nearby(Vector2(0.0, 0.0), 10.0);
        found.sort();
        assert_eq!(found, vec![1, 2]);
    }

    #[test]
    fn query_spans_multiple_cells_at_large_radius() {
        let mut grid = SpatialGrid::new(DEFAULT_CELL_SIZE);
        grid.insert(Vector2(0.0, 0.0), 1u32);
        grid.insert(Vector2(25.0, 0.0), 2u32);

        let found = grid.nearby(Vector2(0.0, 0.0), 30.0);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn clear_empties_all_cells() {
        let mut grid = SpatialGrid::new(DEFAULT_CELL_SIZE);
        grid.insert(Vector2(0.0, 0.0), 1u32);
        grid.clear();
        assert!(grid.nearby(Vector2(0.0, 0.0), 100.0).is_empty());
    }
}
