//! Per-step metric collection
//!
//! Labels the `Burning | Burnt` subgrid with a two-pass union-find
//! (path compression, union by size) under Moore connectivity, derives the
//! spanning tests from per-cluster extents, and aggregates the scalar
//! metrics carried on every state. The labeling is computed once per step
//! and cached on the state so the order-parameter layer can reuse it.

use crate::cell::CellState;
use crate::grid::Grid;
use crate::physics::logistic;
use serde::{Deserialize, Serialize};

/// Disjoint-set forest over flat cell indices
struct DisjointSets {
    parent: Vec<u32>,
    size: Vec<u32>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        DisjointSets {
            parent: (0..n as u32).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut i: u32) -> u32 {
        while self.parent[i as usize] != i {
            // Path halving
            let grandparent = self.parent[self.parent[i as usize] as usize];
            self.parent[i as usize] = grandparent;
            i = grandparent;
        }
        i
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra as usize] >= self.size[rb as usize] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small as usize] = big;
        self.size[big as usize] += self.size[small as usize];
    }
}

/// Connected-component labeling of the fire-affected subgrid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAnalysis {
    /// Per-cell cluster label, row-major; 0 is background
    pub labels: Vec<u32>,
    /// Cluster sizes indexed by `label - 1`
    pub sizes: Vec<usize>,
    /// Size of the largest cluster, 0 when no fire cells exist
    pub largest: usize,
    /// A cluster touches both the left and right edges
    pub spans_horizontal: bool,
    /// A cluster touches both the top and bottom edges
    pub spans_vertical: bool,
}

impl ClusterAnalysis {
    /// Label the `Burning | Burnt` cells of the grid
    pub fn analyze(grid: &Grid) -> Self {
        let width = grid.width();
        let height = grid.height();
        let n = width * height;
        let cells = grid.as_slice();

        let in_cluster =
            |i: usize| matches!(cells[i].state, CellState::Burning | CellState::Burnt);

        let mut sets = DisjointSets::new(n);

        // First pass: union each fire cell with its already-scanned Moore
        // neighbors (west, north-west, north, north-east)
        for y in 0..height {
            for x in 0..width {
                let i = y * width + x;
                if !in_cluster(i) {
                    continue;
                }
                if x > 0 && in_cluster(i - 1) {
                    sets.union(i as u32, (i - 1) as u32);
                }
                if y > 0 {
                    let above = i - width;
                    if in_cluster(above) {
                        sets.union(i as u32, above as u32);
                    }
                    if x > 0 && in_cluster(above - 1) {
                        sets.union(i as u32, (above - 1) as u32);
                    }
                    if x + 1 < width && in_cluster(above + 1) {
                        sets.union(i as u32, (above + 1) as u32);
                    }
                }
            }
        }

        // Second pass: compact root indices into dense labels and gather
        // sizes and extents
        let mut labels = vec![0u32; n];
        let mut root_label = vec![0u32; n];
        let mut sizes: Vec<usize> = Vec::new();
        let mut extents: Vec<(usize, usize, usize, usize)> = Vec::new();

        for y in 0..height {
            for x in 0..width {
                let i = y * width + x;
                if !in_cluster(i) {
                    continue;
                }
                let root = sets.find(i as u32) as usize;
                let label = if root_label[root] == 0 {
                    sizes.push(0);
                    extents.push((x, x, y, y));
                    let fresh = sizes.len() as u32;
                    root_label[root] = fresh;
                    fresh
                } else {
                    root_label[root]
                };
                labels[i] = label;
                let idx = (label - 1) as usize;
                sizes[idx] += 1;
                let e = &mut extents[idx];
                e.0 = e.0.min(x);
                e.1 = e.1.max(x);
                e.2 = e.2.min(y);
                e.3 = e.3.max(y);
            }
        }

        let largest = sizes.iter().copied().max().unwrap_or(0);
        let spans_horizontal = extents
            .iter()
            .any(|&(min_x, max_x, _, _)| min_x == 0 && max_x == width - 1);
        let spans_vertical = extents
            .iter()
            .any(|&(_, _, min_y, max_y)| min_y == 0 && max_y == height - 1);

        ClusterAnalysis {
            labels,
            sizes,
            largest,
            spans_horizontal,
            spans_vertical,
        }
    }

    pub fn spans(&self) -> bool {
        self.spans_horizontal || self.spans_vertical
    }

    pub fn cluster_count(&self) -> usize {
        self.sizes.len()
    }
}

/// Scalar metrics attached to every produced state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub active_fires: usize,
    pub total_burnt_area: usize,
    pub largest_fire_cluster_size: usize,
    /// Mean temperature of burning cells, 0 when none burn
    pub average_fire_intensity: f64,
    /// 1 when a cluster spans the grid, smooth sigmoid of the largest
    /// cluster ratio otherwise
    pub percolation_indicator: f64,
    pub tree_density: f64,
    pub average_moisture: f64,
}

impl Metrics {
    /// Aggregate metrics from a grid and its cluster labeling
    pub fn collect(grid: &Grid, clusters: &ClusterAnalysis) -> Self {
        let total = grid.width() * grid.height();
        let mut active_fires = 0usize;
        let mut burnt = 0usize;
        let mut trees = 0usize;
        let mut empties = 0usize;
        let mut intensity_sum = 0.0;
        let mut moisture_sum = 0.0;

        for cell in grid.cells() {
            moisture_sum += cell.moisture;
            match cell.state {
                CellState::Burning => {
                    active_fires += 1;
                    intensity_sum += cell.temperature;
                }
                CellState::Burnt => burnt += 1,
                CellState::Tree => trees += 1,
                CellState::Empty => empties += 1,
            }
        }

        debug_assert_eq!(active_fires + burnt + trees + empties, total);

        let average_fire_intensity = if active_fires > 0 {
            intensity_sum / active_fires as f64
        } else {
            0.0
        };

        let percolation_indicator = if clusters.spans() {
            1.0
        } else {
            let ratio = clusters.largest as f64 / total as f64;
            logistic(10.0 * (ratio - 0.1))
        };

        Metrics {
            active_fires,
            total_burnt_area: burnt,
            largest_fire_cluster_size: clusters.largest,
            average_fire_intensity,
            percolation_indicator,
            tree_density: trees as f64 / total as f64,
            average_moisture: moisture_sum / total as f64,
        }
    }
}
