//! Immutable simulation snapshots

use crate::cell::{Cell, CellState};
use crate::climate::Climate;
use crate::event::FireEvent;
use crate::grid::Grid;
use crate::metrics::{ClusterAnalysis, Metrics};
use crate::terrain::Terrain;
use std::sync::Arc;

/// Upper bound on the events retained per state
pub const MAX_EVENTS: usize = 1024;

/// One step's complete snapshot
///
/// The grid is owned; terrain and climate are invariant across steps and
/// shared by reference counting. The cluster labeling computed by the
/// metrics pass is cached here so the analysis layer never relabels.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub grid: Grid,
    pub terrain: Arc<Terrain>,
    pub climate: Arc<Climate>,
    /// Length of the step that produced this state
    pub time_step: f64,
    pub elapsed_time: f64,
    /// Number of steps taken to reach this state
    pub step_index: u64,
    pub metrics: Metrics,
    pub clusters: ClusterAnalysis,
    /// Most recent fire events, bounded by `MAX_EVENTS`
    pub events: Vec<FireEvent>,
}

impl SimulationState {
    /// Wrap an initial grid, computing its metrics
    pub fn initial(grid: Grid, terrain: Arc<Terrain>, climate: Arc<Climate>) -> Self {
        let clusters = ClusterAnalysis::analyze(&grid);
        let metrics = Metrics::collect(&grid, &clusters);
        SimulationState {
            grid,
            terrain,
            climate,
            time_step: 0.0,
            elapsed_time: 0.0,
            step_index: 0,
            metrics,
            clusters,
            events: Vec::new(),
        }
    }

    /// Fully forested initial state derived from terrain and climate
    ///
    /// Vegetation follows the elevation bands; every burnable cell starts
    /// as a tree at ambient temperature with humidity-equilibrated
    /// moisture.
    pub fn forested(terrain: &Arc<Terrain>, climate: &Arc<Climate>) -> Self {
        let grid = Grid::new(terrain.width(), terrain.height(), |x, y| {
            let elevation = terrain.elevation(x, y);
            let vegetation = Terrain::vegetation_from_elevation(elevation);
            let state = if vegetation.is_burnable() {
                CellState::Tree
            } else {
                CellState::Empty
            };
            Cell::new(
                x,
                y,
                state,
                elevation,
                vegetation,
                climate.humidity,
                climate.temperature_at_elevation(elevation),
            )
        });
        SimulationState::initial(grid, Arc::clone(terrain), Arc::clone(climate))
    }

    /// Copy of this state with the cells at `points` set burning
    ///
    /// Non-burnable cells are left untouched.
    pub fn with_ignitions(&self, points: &[(usize, usize)]) -> Self {
        let mut grid = self.grid.clone();
        for &(x, y) in points {
            if let Some(cell) = grid.get(x, y) {
                if cell.is_burnable() {
                    let lit = cell.with_state(CellState::Burning).with_temperature(300.0);
                    grid.set(x, y, lit);
                }
            }
        }
        let clusters = ClusterAnalysis::analyze(&grid);
        let metrics = Metrics::collect(&grid, &clusters);
        SimulationState {
            grid,
            terrain: Arc::clone(&self.terrain),
            climate: Arc::clone(&self.climate),
            time_step: self.time_step,
            elapsed_time: self.elapsed_time,
            step_index: self.step_index,
            metrics,
            clusters,
            events: self.events.clone(),
        }
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Total cell count of the system
    pub fn system_size(&self) -> usize {
        self.grid.width() * self.grid.height()
    }
}
