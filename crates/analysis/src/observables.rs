//! Order parameters computed from simulation states
//!
//! Every function reads the cluster labeling cached on the state by the
//! engine's metrics pass; nothing here relabels the grid.

use alpine_fire_core::{CellState, SimulationState, VegetationType};
use serde::{Deserialize, Serialize};

/// The scalar observables of one state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderParameters {
    /// Burnt cells over non-water cells
    pub burnt_fraction: f64,
    /// Burning cells over non-water cells
    pub active_fraction: f64,
    /// Largest fire cluster over system size
    pub largest_cluster_ratio: f64,
    /// 1 when a cluster spans the grid, 0 otherwise
    pub percolation_binary: f64,
    /// Smooth percolation indicator from the metrics pass
    pub percolation_smooth: f64,
    /// Fire clusters per cell
    pub cluster_density: f64,
    pub mean_cluster_size: f64,
    /// Boundary length between burning and non-burning cells
    pub fire_front_length: f64,
    /// Cheap proxy: square root of the mean cluster size
    pub correlation_length: f64,
}

impl OrderParameters {
    /// Compute all order parameters for a state
    pub fn measure(state: &SimulationState) -> Self {
        let grid = &state.grid;
        let clusters = &state.clusters;
        let system_size = state.system_size();

        let mut burnt = 0usize;
        let mut burning = 0usize;
        let mut non_water = 0usize;
        for cell in grid.cells() {
            if cell.vegetation != VegetationType::Water {
                non_water += 1;
                match cell.state {
                    CellState::Burnt => burnt += 1,
                    CellState::Burning => burning += 1,
                    _ => {}
                }
            }
        }
        let non_water = non_water.max(1);

        let cluster_count = clusters.cluster_count();
        let mean_cluster_size = if cluster_count > 0 {
            clusters.sizes.iter().sum::<usize>() as f64 / cluster_count as f64
        } else {
            0.0
        };

        OrderParameters {
            burnt_fraction: burnt as f64 / non_water as f64,
            active_fraction: burning as f64 / non_water as f64,
            largest_cluster_ratio: clusters.largest as f64 / system_size as f64,
            percolation_binary: if clusters.spans() { 1.0 } else { 0.0 },
            percolation_smooth: state.metrics.percolation_indicator,
            cluster_density: cluster_count as f64 / system_size as f64,
            mean_cluster_size,
            fire_front_length: fire_front_length(state),
            correlation_length: mean_cluster_size.sqrt(),
        }
    }

    /// Named values, in a fixed order, for map-style aggregation
    pub fn as_pairs(&self) -> [(&'static str, f64); 9] {
        [
            ("burnt_fraction", self.burnt_fraction),
            ("active_fraction", self.active_fraction),
            ("largest_cluster_ratio", self.largest_cluster_ratio),
            ("percolation_binary", self.percolation_binary),
            ("percolation_smooth", self.percolation_smooth),
            ("cluster_density", self.cluster_density),
            ("mean_cluster_size", self.mean_cluster_size),
            ("fire_front_length", self.fire_front_length),
            ("correlation_length", self.correlation_length),
        ]
    }
}

/// Perimeter between `Burning` and non-burning cells, in cell edges
///
/// Counts the four-connected boundary; edges against the outside of the
/// grid do not contribute.
pub fn fire_front_length(state: &SimulationState) -> f64 {
    let grid = &state.grid;
    let width = grid.width();
    let height = grid.height();
    let mut edges = 0usize;

    for y in 0..height {
        for x in 0..width {
            if grid.at(x, y).state != CellState::Burning {
                continue;
            }
            if x + 1 < width && grid.at(x + 1, y).state != CellState::Burning {
                edges += 1;
            }
            if x > 0 && grid.at(x - 1, y).state != CellState::Burning {
                edges += 1;
            }
            if y + 1 < height && grid.at(x, y + 1).state != CellState::Burning {
                edges += 1;
            }
            if y > 0 && grid.at(x, y - 1).state != CellState::Burning {
                edges += 1;
            }
        }
    }
    edges as f64
}

/// Susceptibility of the burnt fraction over a state sequence
///
/// Sample variance across the sequence, scaled by the system size.
pub fn susceptibility(burnt_fractions: &[f64], system_size: usize) -> f64 {
    if burnt_fractions.len() < 2 {
        return 0.0;
    }
    let n = burnt_fractions.len() as f64;
    let mean = burnt_fractions.iter().sum::<f64>() / n;
    let variance = burnt_fractions
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        / (n - 1.0);
    variance * system_size as f64
}
