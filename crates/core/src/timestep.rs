//! Time-step calculation policies

use crate::config::{RunConfig, TimeStepPolicy};
use crate::state::SimulationState;

/// Compute the next step length under the configured policy
///
/// Every policy's result is clamped to `[min_dt, max_dt]`.
pub fn compute_dt(state: &SimulationState, config: &RunConfig) -> f64 {
    let raw = match config.time_step {
        TimeStepPolicy::Fixed(dt) => dt,
        TimeStepPolicy::Adaptive => cfl_bound(state, config).min(activity_ladder(state)),
        TimeStepPolicy::ChangeRate => activity_ladder(state),
    };
    raw.clamp(config.min_dt, config.max_dt)
}

/// CFL stability bound: `0.5 / max spread rate` over burning cells
///
/// A quiescent grid has no advective front, so the bound is the maximum
/// step.
fn cfl_bound(state: &SimulationState, config: &RunConfig) -> f64 {
    let mut max_rate = 0.0f64;
    for cell in state.grid.cells() {
        if cell.is_burning() {
            let slope = state.terrain.slope(cell.x, cell.y);
            let rate = config.physics.spread_rate(cell, slope, &state.climate);
            max_rate = max_rate.max(rate);
        }
    }
    if max_rate > 0.0 {
        0.5 / max_rate
    } else {
        config.max_dt
    }
}

/// Step-down ladder on fire activity
fn activity_ladder(state: &SimulationState) -> f64 {
    match state.metrics.active_fires {
        0 => 1.0,
        1..=9 => 0.5,
        10..=49 => 0.1,
        _ => 0.05,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::{Climate, Season};
    use crate::terrain::Terrain;
    use std::sync::Arc;

    fn quiet_state() -> SimulationState {
        let terrain = Arc::new(Terrain::flat(12, 12, 500.0));
        let climate = Arc::new(Climate::seasonal(Season::Summer));
        SimulationState::forested(&terrain, &climate)
    }

    #[test]
    fn test_fixed_policy_clamped() {
        let state = quiet_state();
        let config = RunConfig {
            time_step: TimeStepPolicy::Fixed(5.0),
            min_dt: 0.01,
            max_dt: 1.0,
            ..RunConfig::default()
        };
        assert_eq!(compute_dt(&state, &config), 1.0);

        let config = RunConfig {
            time_step: TimeStepPolicy::Fixed(0.001),
            ..config
        };
        assert_eq!(compute_dt(&state, &config), 0.01);
    }

    #[test]
    fn test_quiescent_grid_uses_max_dt() {
        let state = quiet_state();
        let config = RunConfig {
            time_step: TimeStepPolicy::Adaptive,
            min_dt: 0.01,
            max_dt: 1.0,
            ..RunConfig::default()
        };
        // No fires: CFL is max_dt, ladder is 1.0
        assert_eq!(compute_dt(&state, &config), 1.0);
    }

    #[test]
    fn test_active_fire_shrinks_dt() {
        let state = quiet_state().with_ignitions(&[(5, 5), (6, 5), (7, 5)]);
        let config = RunConfig {
            time_step: TimeStepPolicy::Adaptive,
            min_dt: 0.01,
            max_dt: 1.0,
            ..RunConfig::default()
        };
        let dt = compute_dt(&state, &config);
        assert!(dt <= 0.5);
        assert!(dt >= config.min_dt);
    }

    #[test]
    fn test_change_rate_follows_ladder() {
        let config = RunConfig {
            time_step: TimeStepPolicy::ChangeRate,
            min_dt: 0.01,
            max_dt: 1.0,
            ..RunConfig::default()
        };
        assert_eq!(compute_dt(&quiet_state(), &config), 1.0);

        let few = quiet_state().with_ignitions(&[(5, 5)]);
        assert_eq!(compute_dt(&few, &config), 0.5);

        let many: Vec<(usize, usize)> = (0..12).flat_map(|x| (0..4).map(move |y| (x, y))).collect();
        let busy = quiet_state().with_ignitions(&many);
        assert!(busy.metrics.active_fires >= 10);
        let dt = compute_dt(&busy, &config);
        assert!(dt <= 0.1);
    }
}
