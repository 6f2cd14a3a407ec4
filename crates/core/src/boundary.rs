//! Boundary handling for neighbor lookups
//!
//! The grid's raw neighbor enumeration drops out-of-range cells; the
//! boundary policy decides what the automaton actually sees past the edge.

use crate::cell::{Cell, CellState, VegetationType};
use crate::grid::{Grid, MOORE_OFFSETS};
use serde::{Deserialize, Serialize};

/// Edge behavior for neighbor resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Toroidal wrap-around
    Periodic,
    /// Out-of-range indices clamp to the nearest edge cell
    Reflective,
    /// Out-of-range neighbors simply do not exist
    Absorbing,
    /// Out-of-range neighbors are synthesized with this state and inert physics
    Fixed(CellState),
}

impl BoundaryPolicy {
    /// Resolve the neighbor of `(x, y)` at offset `(dx, dy)`
    ///
    /// Returns `None` only under `Absorbing` (or for a zero offset).
    pub fn resolve(&self, grid: &Grid, x: usize, y: usize, dx: i64, dy: i64) -> Option<Cell> {
        if dx == 0 && dy == 0 {
            return None;
        }
        let w = grid.width() as i64;
        let h = grid.height() as i64;
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;

        if nx >= 0 && nx < w && ny >= 0 && ny < h {
            return Some(*grid.at(nx as usize, ny as usize));
        }

        match *self {
            BoundaryPolicy::Periodic => {
                let px = nx.rem_euclid(w) as usize;
                let py = ny.rem_euclid(h) as usize;
                Some(*grid.at(px, py))
            }
            BoundaryPolicy::Reflective => {
                let cx = nx.clamp(0, w - 1) as usize;
                let cy = ny.clamp(0, h - 1) as usize;
                Some(*grid.at(cx, cy))
            }
            BoundaryPolicy::Absorbing => None,
            BoundaryPolicy::Fixed(state) => Some(phantom_cell(nx, ny, state)),
        }
    }

    /// The Moore neighborhood of `(x, y)` under this policy
    ///
    /// At most 8 cells; fewer under `Absorbing` at an edge.
    pub fn moore_neighbors(&self, grid: &Grid, x: usize, y: usize) -> Vec<Cell> {
        MOORE_OFFSETS
            .iter()
            .filter_map(|&(dx, dy)| self.resolve(grid, x, y, dx, dy))
            .collect()
    }
}

/// Synthesize an inert out-of-grid cell for the `Fixed` policy
///
/// Barren, saturated, and cold, so it can neither ignite nor transmit heat
/// regardless of the configured state.
fn phantom_cell(nx: i64, ny: i64, state: CellState) -> Cell {
    Cell::new(
        nx.max(0) as usize,
        ny.max(0) as usize,
        state,
        0.0,
        VegetationType::Barren,
        1.0,
        0.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with_marker() -> Grid {
        // 4x4 of trees; (0,0) is burning so wrap lookups are observable
        let mut grid = Grid::new(4, 4, |x, y| {
            Cell::new(x, y, CellState::Tree, 100.0, VegetationType::SparseForest, 0.3, 15.0)
        });
        let marked = grid.at(0, 0).with_state(CellState::Burning);
        grid.set(0, 0, marked);
        grid
    }

    #[test]
    fn test_periodic_wraps_to_opposite_edge() {
        let grid = grid_with_marker();
        let policy = BoundaryPolicy::Periodic;
        // Neighbor to the left of (0, 0) wraps to (3, 0)
        let cell = policy.resolve(&grid, 0, 0, -1, 0).unwrap();
        assert_eq!((cell.x, cell.y), (3, 0));
        // From (3, 3), the (+1, +1) neighbor wraps to the burning (0, 0)
        let wrapped = policy.resolve(&grid, 3, 3, 1, 1).unwrap();
        assert_eq!(wrapped.state, CellState::Burning);
    }

    #[test]
    fn test_reflective_clamps_to_edge() {
        let grid = grid_with_marker();
        let policy = BoundaryPolicy::Reflective;
        let cell = policy.resolve(&grid, 0, 0, -1, -1).unwrap();
        assert_eq!((cell.x, cell.y), (0, 0));
        assert_eq!(cell.state, CellState::Burning);
    }

    #[test]
    fn test_absorbing_drops_outside_neighbors() {
        let grid = grid_with_marker();
        let policy = BoundaryPolicy::Absorbing;
        assert!(policy.resolve(&grid, 0, 0, -1, 0).is_none());
        assert_eq!(policy.moore_neighbors(&grid, 0, 0).len(), 3);
        assert_eq!(policy.moore_neighbors(&grid, 2, 2).len(), 8);
    }

    #[test]
    fn test_fixed_synthesizes_inert_cell() {
        let grid = grid_with_marker();
        let policy = BoundaryPolicy::Fixed(CellState::Empty);
        let cell = policy.resolve(&grid, 0, 0, 0, -1).unwrap();
        assert_eq!(cell.state, CellState::Empty);
        assert_eq!(cell.vegetation, VegetationType::Barren);
        assert_eq!(cell.moisture, 1.0);
        assert_eq!(policy.moore_neighbors(&grid, 0, 0).len(), 8);
    }

    #[test]
    fn test_interior_identical_across_policies() {
        let grid = grid_with_marker();
        for policy in [
            BoundaryPolicy::Periodic,
            BoundaryPolicy::Reflective,
            BoundaryPolicy::Absorbing,
            BoundaryPolicy::Fixed(CellState::Tree),
        ] {
            let neighbors = policy.moore_neighbors(&grid, 1, 1);
            assert_eq!(neighbors.len(), 8);
            assert!(neighbors.iter().any(|c| c.state == CellState::Burning));
        }
    }
}
