//! Parameter projections, sweeps, and phase diagrams

use crate::ensemble::{EnsembleOutcome, EnsembleRunner};
use alpine_fire_core::{
    rng::cell_rng, Cell, CellState, Climate, Grid, RunConfig, SimulationState, Wind,
};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Seed used by randomized projections so sweeps are reproducible
const PROJECTION_SEED: u64 = 42;

/// Control parameters a sweep can vary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parameter {
    /// Probability that a non-burning cell carries a tree
    TreeDensity,
    /// Uniform fuel moisture
    Moisture,
    /// Wind speed (m/s), direction unchanged
    WindSpeed,
    /// Uniform temperature shift on top of the elevation profile (°C)
    TemperatureAnomaly,
    /// Spark rule probability (enables the spark rule)
    SparkProbability,
}

impl Parameter {
    pub fn name(self) -> &'static str {
        match self {
            Parameter::TreeDensity => "tree_density",
            Parameter::Moisture => "moisture",
            Parameter::WindSpeed => "wind_speed",
            Parameter::TemperatureAnomaly => "temperature_anomaly",
            Parameter::SparkProbability => "spark_probability",
        }
    }

    /// Project a parameter value onto a base state and run configuration
    ///
    /// Pure: the inputs are not modified, and the same `(state, value)`
    /// always yields the same projected state (randomized rewrites draw
    /// from a fixed seed).
    pub fn apply(
        self,
        base: &SimulationState,
        value: f64,
        config: &RunConfig,
    ) -> (SimulationState, RunConfig) {
        match self {
            Parameter::TreeDensity => (project_tree_density(base, value), config.clone()),
            Parameter::Moisture => (project_moisture(base, value), config.clone()),
            Parameter::WindSpeed => (project_wind_speed(base, value), config.clone()),
            Parameter::TemperatureAnomaly => {
                (project_temperature_anomaly(base, value), config.clone())
            }
            Parameter::SparkProbability => {
                let mut config = config.clone();
                config.rules.enable_sparks = true;
                config.rules.spark_probability = value.clamp(0.0, 1.0);
                (base.clone(), config)
            }
        }
    }
}

fn rebuild(base: &SimulationState, grid: Grid) -> SimulationState {
    SimulationState::initial(grid, Arc::clone(&base.terrain), Arc::clone(&base.climate))
}

/// Rewrite every non-burning burnable cell as tree-or-empty with the
/// given density
fn project_tree_density(base: &SimulationState, density: f64) -> SimulationState {
    let density = density.clamp(0.0, 1.0);
    let mut grid = base.grid.clone();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let cell = *grid.at(x, y);
            if cell.is_burning() || !cell.vegetation.is_burnable() {
                continue;
            }
            let mut rng = cell_rng(PROJECTION_SEED, 0, x, y);
            let state = if rng.random::<f64>() < density {
                CellState::Tree
            } else {
                CellState::Empty
            };
            grid.set(x, y, cell.with_state(state));
        }
    }
    rebuild(base, grid)
}

fn project_moisture(base: &SimulationState, moisture: f64) -> SimulationState {
    let mut grid = base.grid.clone();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let cell = grid.at(x, y).with_moisture(moisture);
            grid.set(x, y, cell);
        }
    }
    rebuild(base, grid)
}

fn project_wind_speed(base: &SimulationState, speed: f64) -> SimulationState {
    let climate = Climate {
        wind: Wind::new(base.climate.wind.direction, speed.max(0.0)),
        ..(*base.climate).clone()
    };
    let mut state = base.clone();
    state.climate = Arc::new(climate);
    state
}

fn project_temperature_anomaly(base: &SimulationState, delta: f64) -> SimulationState {
    let mut grid = base.grid.clone();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let cell: Cell = *grid.at(x, y);
            let ambient = base.climate.temperature_at_elevation(cell.elevation);
            grid.set(x, y, cell.with_temperature(ambient + delta));
        }
    }
    rebuild(base, grid)
}

/// One sweep sample: a parameter value and its ensemble result
#[derive(Debug, Clone)]
pub struct ParameterPoint {
    pub parameter: Parameter,
    pub value: f64,
    pub ensemble: EnsembleOutcome,
}

impl EnsembleRunner {
    /// Sweep a parameter across `values`, one ensemble per value
    ///
    /// Values run in parallel under the runner's worker cap; the returned
    /// points keep the input order.
    pub fn sweep(
        &self,
        base: &SimulationState,
        parameter: Parameter,
        values: &[f64],
    ) -> Vec<ParameterPoint> {
        info!(parameter = parameter.name(), points = values.len(), "parameter sweep");
        self.pool().install(|| {
            values
                .par_iter()
                .map(|&value| self.sweep_point(base, parameter, value))
                .collect()
        })
    }

    fn sweep_point(
        &self,
        base: &SimulationState,
        parameter: Parameter,
        value: f64,
    ) -> ParameterPoint {
        let (projected, config) = parameter.apply(base, value, self.run_config());
        let runner = EnsembleRunner::new(config, self.analysis_config().clone())
            .unwrap_or_else(|e| unreachable!("projected configuration rejected: {e}"));
        ParameterPoint {
            parameter,
            value,
            ensemble: runner.run(&projected),
        }
    }

    /// Two-dimensional phase diagram
    ///
    /// The outer axis is `param1`; for each of its values the entire inner
    /// sweep over `param2` completes before the outer axis advances.
    pub fn phase_diagram(
        &self,
        base: &SimulationState,
        param1: Parameter,
        values1: &[f64],
        param2: Parameter,
        values2: &[f64],
    ) -> Vec<(f64, Vec<ParameterPoint>)> {
        values1
            .iter()
            .map(|&v1| {
                let (projected, config) = param1.apply(base, v1, self.run_config());
                let runner = EnsembleRunner::new(config, self.analysis_config().clone())
                    .unwrap_or_else(|e| unreachable!("projected configuration rejected: {e}"));
                (v1, runner.sweep(&projected, param2, values2))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alpine_fire_core::{AnalysisConfig, Season, Terrain, TimeStepPolicy};

    fn base_state() -> SimulationState {
        let terrain = Arc::new(Terrain::flat(8, 8, 600.0));
        let climate = Arc::new(Climate::seasonal(Season::Summer));
        SimulationState::forested(&terrain, &climate)
    }

    #[test]
    fn test_full_density_yields_only_trees() {
        let (state, _) =
            Parameter::TreeDensity.apply(&base_state(), 1.0, &RunConfig::default());
        assert_eq!(state.grid.count_state(CellState::Tree), 64);
    }

    #[test]
    fn test_zero_density_yields_only_empty() {
        let (state, _) =
            Parameter::TreeDensity.apply(&base_state(), 0.0, &RunConfig::default());
        assert_eq!(state.grid.count_state(CellState::Empty), 64);
    }

    #[test]
    fn test_density_projection_is_reproducible() {
        let base = base_state();
        let (a, _) = Parameter::TreeDensity.apply(&base, 0.6, &RunConfig::default());
        let (b, _) = Parameter::TreeDensity.apply(&base, 0.6, &RunConfig::default());
        assert_eq!(a.grid, b.grid);
    }

    #[test]
    fn test_moisture_projection_idempotent() {
        let base = base_state();
        let config = RunConfig::default();
        let (once, _) = Parameter::Moisture.apply(&base, 0.42, &config);
        let (twice, _) = Parameter::Moisture.apply(&once, 0.42, &config);
        assert_eq!(once.grid, twice.grid);
        assert!(once.grid.cells().all(|c| c.moisture == 0.42));
    }

    #[test]
    fn test_wind_projection_replaces_climate() {
        let base = base_state();
        let (state, _) = Parameter::WindSpeed.apply(&base, 14.0, &RunConfig::default());
        assert_eq!(state.climate.wind.speed, 14.0);
        assert_eq!(base.climate.wind.speed, 0.0);
        // Grid untouched
        assert_eq!(state.grid, base.grid);
    }

    #[test]
    fn test_temperature_anomaly_is_elevation_corrected() {
        let terrain = Arc::new(Terrain::slope_ramp(8, 8, 400.0, 1600.0));
        let climate = Arc::new(Climate::seasonal(Season::Summer));
        let base = SimulationState::forested(&terrain, &climate);
        let (state, _) = Parameter::TemperatureAnomaly.apply(&base, 3.0, &RunConfig::default());
        for cell in state.grid.cells() {
            let expected = climate.temperature_at_elevation(cell.elevation) + 3.0;
            assert!((cell.temperature - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_spark_projection_updates_config_only() {
        let base = base_state();
        let config = RunConfig::default();
        let (state, projected) = Parameter::SparkProbability.apply(&base, 0.02, &config);
        assert_eq!(state.grid, base.grid);
        assert!(projected.rules.enable_sparks);
        assert_eq!(projected.rules.spark_probability, 0.02);
    }

    #[test]
    fn test_sweep_preserves_value_order() {
        let runner = EnsembleRunner::new(
            RunConfig {
                max_steps: 5,
                max_time: 2.0,
                time_step: TimeStepPolicy::Fixed(0.5),
                parallelism: 2,
                ..RunConfig::default()
            },
            AnalysisConfig {
                ensemble_size: 2,
                warmup_time: 0.0,
                measurement_interval: 1.0,
            },
        )
        .unwrap();
        let values = [0.2, 0.5, 0.8];
        let points = runner.sweep(&base_state(), Parameter::TreeDensity, &values);
        assert_eq!(points.len(), 3);
        for (point, value) in points.iter().zip(values) {
            assert_eq!(point.value, value);
            assert_eq!(point.parameter, Parameter::TreeDensity);
        }
    }
}
