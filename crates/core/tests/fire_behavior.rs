//! Scenario tests for fire behavior on small grids
//!
//! All scenarios run on a 10x10 grid under a summer climate with zero
//! wind unless a case says otherwise.

use alpine_fire_core::{
    Cell, CellState, Climate, RunConfig, Season, SimulationState, SteppingEngine, Terrain,
    TimeStepPolicy, VegetationType,
};
use std::sync::Arc;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn summer_state<F>(init: F) -> SimulationState
where
    F: FnMut(usize, usize) -> Cell,
{
    let terrain = Arc::new(Terrain::flat(10, 10, 500.0));
    let climate = Arc::new(Climate::seasonal(Season::Summer));
    let grid = alpine_fire_core::Grid::new(10, 10, init);
    SimulationState::initial(grid, terrain, climate)
}

fn engine(seed: u64) -> SteppingEngine {
    SteppingEngine::new(RunConfig {
        seed: Some(seed),
        ..RunConfig::default()
    })
    .unwrap()
}

#[test]
fn test_isolated_spark_dies_without_fuel() {
    // Single burning cell surrounded by empty ground
    let state = summer_state(|x, y| {
        let cell = Cell::new(x, y, CellState::Empty, 500.0, VegetationType::DenseForest, 0.3, 24.0);
        if (x, y) == (5, 5) {
            cell.with_state(CellState::Burning).with_temperature(600.0)
        } else {
            cell
        }
    });

    let engine = engine(1);
    let mut current = state;
    for _ in 0..50 {
        current = engine.step(&current).unwrap();
    }
    assert_eq!(current.metrics.active_fires, 0, "isolated fire must die");
    assert!(current.metrics.total_burnt_area <= 1);
}

#[test]
fn test_line_fire_reaches_spanning_cluster() {
    // Column x = 0 ignited, everything else dry forest
    let state = summer_state(|x, y| {
        let cell = Cell::new(x, y, CellState::Tree, 500.0, VegetationType::DenseForest, 0.1, 24.0);
        if x == 0 {
            cell.with_state(CellState::Burning).with_temperature(600.0)
        } else {
            cell
        }
    });

    let engine = engine(2);
    let mut current = state;
    let mut spanned = false;
    for _ in 0..200 {
        current = engine.step(&current).unwrap();
        if current.metrics.percolation_indicator == 1.0 {
            spanned = true;
            break;
        }
    }
    assert!(spanned, "line fire must reach a spanning cluster");
}

#[test]
fn test_wind_drives_fire_beyond_ignition_line() {
    use alpine_fire_core::Wind;
    // Same line fire under a strong easterly wind: spread is certain
    let terrain = Arc::new(Terrain::flat(10, 10, 500.0));
    let climate = Arc::new(
        Climate::new(Season::Summer, Wind::new(0.0, 10.0), 0.2, 0.0).unwrap(),
    );
    let grid = alpine_fire_core::Grid::new(10, 10, |x, y| {
        let cell = Cell::new(x, y, CellState::Tree, 500.0, VegetationType::DenseForest, 0.1, 24.0);
        if x == 0 {
            cell.with_state(CellState::Burning).with_temperature(600.0)
        } else {
            cell
        }
    });
    let state = SimulationState::initial(grid, terrain, climate);
    let initial_fire_area = 10;

    let engine = engine(2);
    let mut current = state;
    for _ in 0..300 {
        current = engine.step(&current).unwrap();
    }
    let fire_area = current.metrics.total_burnt_area + current.metrics.active_fires;
    assert!(
        fire_area > initial_fire_area,
        "wind-driven fire should have spread, area = {fire_area}"
    );
}

#[test]
fn test_wet_forest_quenches_fire() {
    // Single ignition in a saturated forest: fewer than five cells ever
    // ignite before the fire goes out
    let state = summer_state(|x, y| {
        let cell = Cell::new(x, y, CellState::Tree, 500.0, VegetationType::DenseForest, 0.9, 24.0);
        if (x, y) == (5, 5) {
            cell.with_state(CellState::Burning).with_temperature(600.0)
        } else {
            cell
        }
    });

    let engine = engine(3);
    let mut current = state;
    for _ in 0..200 {
        current = engine.step(&current).unwrap();
        if current.metrics.active_fires == 0 {
            break;
        }
    }
    assert_eq!(current.metrics.active_fires, 0, "wet fire must extinguish");
    // The original cell plus at most a handful of neighbor ignitions
    assert!(
        current.metrics.total_burnt_area < 5,
        "burnt area {} too large for a quenched fire",
        current.metrics.total_burnt_area
    );
}

#[test]
fn test_mass_conservation_and_clamping() {
    let state = summer_state(|x, y| {
        let cell = Cell::new(x, y, CellState::Tree, 500.0, VegetationType::SparseForest, 0.2, 24.0);
        if x == 4 && (3..=6).contains(&y) {
            cell.with_state(CellState::Burning).with_temperature(500.0)
        } else {
            cell
        }
    });

    let engine = engine(4);
    let mut current = state;
    for _ in 0..40 {
        current = engine.step(&current).unwrap();
        let total = current.grid.count_state(CellState::Empty)
            + current.grid.count_state(CellState::Tree)
            + current.grid.count_state(CellState::Burning)
            + current.grid.count_state(CellState::Burnt);
        assert_eq!(total, 100);
        for cell in current.grid.cells() {
            assert!((0.0..=1.0).contains(&cell.moisture));
            assert!(cell.temperature.is_finite());
        }
        assert!(current.metrics.percolation_indicator >= 0.0);
        assert!(current.metrics.percolation_indicator <= 1.0);
    }
}

#[test]
fn test_burnt_area_monotone_without_regrowth() {
    let state = summer_state(|x, y| {
        let cell = Cell::new(x, y, CellState::Tree, 500.0, VegetationType::Grassland, 0.1, 24.0);
        if (x, y) == (5, 5) || (x, y) == (4, 5) {
            cell.with_state(CellState::Burning).with_temperature(600.0)
        } else {
            cell
        }
    });

    // Regrowth is disabled in the default rule configuration
    let engine = engine(5);
    let mut current = state;
    let mut previous_burnt = 0;
    for _ in 0..60 {
        current = engine.step(&current).unwrap();
        assert!(
            current.metrics.total_burnt_area >= previous_burnt,
            "burnt area decreased without regrowth"
        );
        previous_burnt = current.metrics.total_burnt_area;
    }
}

#[test]
fn test_spanning_cluster_at_least_grid_span() {
    let state = summer_state(|x, y| {
        let cell = Cell::new(x, y, CellState::Tree, 500.0, VegetationType::DenseForest, 0.1, 24.0);
        if y == 3 {
            cell.with_state(CellState::Burning).with_temperature(600.0)
        } else {
            cell
        }
    });
    assert!(state.clusters.spans_horizontal);
    assert!(state.clusters.largest >= 10);

    let engine = engine(6);
    let mut current = state;
    for _ in 0..30 {
        current = engine.step(&current).unwrap();
        if current.clusters.spans() {
            assert!(current.clusters.largest >= 10);
        }
    }
}

#[test]
fn test_adaptive_dt_stays_within_bounds() {
    let config = RunConfig {
        seed: Some(8),
        time_step: TimeStepPolicy::Adaptive,
        min_dt: 0.02,
        max_dt: 0.8,
        ..RunConfig::default()
    };
    let engine = SteppingEngine::new(config).unwrap();
    let state = summer_state(|x, y| {
        let cell = Cell::new(x, y, CellState::Tree, 500.0, VegetationType::DenseForest, 0.15, 24.0);
        if (3..=6).contains(&x) && y == 5 {
            cell.with_state(CellState::Burning).with_temperature(600.0)
        } else {
            cell
        }
    });

    let mut current = state;
    for _ in 0..40 {
        current = engine.step(&current).unwrap();
        assert!((0.02..=0.8).contains(&current.time_step));
    }
}
