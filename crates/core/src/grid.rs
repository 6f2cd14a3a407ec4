//! Dense row-major cell grid
//!
//! The grid stores cells as a flat `Vec<Cell>` in row-major order
//! (`y * width + x`). The stepping engine reads one grid and assembles the
//! next into a fresh buffer, so a `Grid` handed out in a snapshot is never
//! mutated behind the caller's back.

use crate::cell::{Cell, CellState};
use serde::{Deserialize, Serialize};

/// Offsets of the eight Moore neighbors, row-major scan order
pub const MOORE_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Rectangular cell container with Moore neighbor access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid by calling `init` for every `(x, y)` coordinate
    pub fn new<F>(width: usize, height: usize, mut init: F) -> Self
    where
        F: FnMut(usize, usize) -> Cell,
    {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(init(x, y));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    /// Build a grid directly from a row-major cell buffer
    ///
    /// The buffer length must equal `width * height`.
    pub fn from_cells(width: usize, height: usize, cells: Vec<Cell>) -> Self {
        assert_eq!(cells.len(), width * height, "cell buffer size mismatch");
        Grid {
            width,
            height,
            cells,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bounds-checked cell lookup; out-of-range coordinates return `None`
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.width && y < self.height {
            Some(&self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// Unchecked lookup for hot paths where bounds are already established
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> &Cell {
        &self.cells[y * self.width + x]
    }

    /// Replace the cell at `(x, y)`; out-of-range coordinates are ignored
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    /// The Moore neighbors of `(x, y)` that fall inside raw grid bounds
    ///
    /// Boundary policies wrap or synthesize out-of-range neighbors
    /// separately; this accessor only ever filters them out.
    pub fn moore_neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = &Cell> {
        MOORE_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height {
                Some(self.at(nx as usize, ny as usize))
            } else {
                None
            }
        })
    }

    /// Row-major iterator over all cells
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Row-major access to the raw cell buffer
    pub fn as_slice(&self) -> &[Cell] {
        &self.cells
    }

    pub fn count_state(&self, state: CellState) -> usize {
        self.cells.iter().filter(|c| c.state == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::VegetationType;

    fn tree(x: usize, y: usize) -> Cell {
        Cell::new(x, y, CellState::Tree, 500.0, VegetationType::SparseForest, 0.3, 20.0)
    }

    #[test]
    fn test_row_major_layout() {
        let grid = Grid::new(4, 3, tree);
        let cell = grid.at(2, 1);
        assert_eq!((cell.x, cell.y), (2, 1));
        assert_eq!(grid.as_slice()[grid.width() + 2], *cell);
    }

    #[test]
    fn test_out_of_range_returns_none() {
        let grid = Grid::new(4, 3, tree);
        assert!(grid.get(4, 0).is_none());
        assert!(grid.get(0, 3).is_none());
        assert!(grid.get(3, 2).is_some());
    }

    #[test]
    fn test_corner_has_three_neighbors() {
        let grid = Grid::new(5, 5, tree);
        assert_eq!(grid.moore_neighbors(0, 0).count(), 3);
        assert_eq!(grid.moore_neighbors(4, 4).count(), 3);
        assert_eq!(grid.moore_neighbors(0, 2).count(), 5);
        assert_eq!(grid.moore_neighbors(2, 2).count(), 8);
    }

    #[test]
    fn test_count_state() {
        let mut grid = Grid::new(3, 3, tree);
        let burning = grid.at(1, 1).with_state(CellState::Burning);
        grid.set(1, 1, burning);
        assert_eq!(grid.count_state(CellState::Burning), 1);
        assert_eq!(grid.count_state(CellState::Tree), 8);
    }

    #[test]
    fn test_set_out_of_range_is_ignored() {
        let mut grid = Grid::new(3, 3, tree);
        let stray = tree(9, 9);
        grid.set(9, 9, stray);
        assert_eq!(grid.count_state(CellState::Tree), 9);
    }
}
