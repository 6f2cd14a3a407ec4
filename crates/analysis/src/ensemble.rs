//! Ensemble orchestration
//!
//! Runs many perturbed copies of a base state under independently seeded
//! engines and aggregates their order parameters. Members run in parallel
//! up to `min(ensemble_size, parallelism)`; aggregation is a fixed-order
//! fold over the member results, so identical configurations produce
//! bit-identical aggregates regardless of scheduling.

use crate::observables::OrderParameters;
use crate::phase::{classify_ensemble, Phase};
use alpine_fire_core::{
    AnalysisConfig, ConfigError, RunConfig, SimulationError, SimulationState, SteppingEngine,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Seed base for ensemble members; member `i` runs with `42 + i`
const MEMBER_SEED_BASE: u64 = 42;

/// Number of perturbed ignition points per member
const IGNITION_POINTS: usize = 3;

/// One completed simulation run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub final_state: SimulationState,
    /// Order parameters sampled after warmup at the measurement interval
    pub time_series: Vec<OrderParameters>,
    /// Order parameters of the final state
    pub order_parameters: OrderParameters,
    pub phase: Phase,
    pub wall_time: Duration,
}

/// Aggregated result of an ensemble
#[derive(Debug, Clone)]
pub struct EnsembleOutcome {
    /// Per-member results in seed order; failed members keep their error
    pub runs: Vec<Result<RunOutcome, SimulationError>>,
    pub mean: BTreeMap<&'static str, f64>,
    pub std_dev: BTreeMap<&'static str, f64>,
    pub phase: Phase,
}

impl EnsembleOutcome {
    pub fn successes(&self) -> impl Iterator<Item = &RunOutcome> {
        self.runs.iter().filter_map(|r| r.as_ref().ok())
    }
}

/// Batch runner over perturbed initial states
pub struct EnsembleRunner {
    run_config: RunConfig,
    analysis: AnalysisConfig,
    pool: rayon::ThreadPool,
}

impl EnsembleRunner {
    /// # Errors
    ///
    /// Any validation error from either configuration, or a thread-pool
    /// build failure.
    pub fn new(run_config: RunConfig, analysis: AnalysisConfig) -> Result<Self, ConfigError> {
        run_config.validate()?;
        analysis.validate()?;
        // workers() is already at least one
        let workers = analysis.ensemble_size.min(run_config.workers());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
        Ok(EnsembleRunner {
            run_config,
            analysis,
            pool,
        })
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    pub fn analysis_config(&self) -> &AnalysisConfig {
        &self.analysis
    }

    pub(crate) fn pool(&self) -> &rayon::ThreadPool {
        &self.pool
    }

    /// Run the full ensemble from a base state
    pub fn run(&self, base: &SimulationState) -> EnsembleOutcome {
        let size = self.analysis.ensemble_size;
        info!(size, "running ensemble");

        let runs: Vec<Result<RunOutcome, SimulationError>> = self.pool.install(|| {
            (0..size)
                .into_par_iter()
                .map(|i| {
                    let seed = MEMBER_SEED_BASE + i as u64;
                    let initial = perturbed_initial(base, seed);
                    self.run_single(initial, seed)
                })
                .collect()
        });

        for (i, run) in runs.iter().enumerate() {
            if let Err(err) = run {
                warn!(member = i, %err, "ensemble member failed");
            }
        }

        aggregate(runs)
    }

    /// Run one member to completion under its own seeded engine
    ///
    /// Completion means quiescence (no active fires), the configured
    /// simulated-time horizon, or the step cap, whichever comes first.
    ///
    /// # Errors
    ///
    /// The member's fatal `SimulationError`, if stepping failed.
    pub fn run_single(
        &self,
        initial: SimulationState,
        seed: u64,
    ) -> Result<RunOutcome, SimulationError> {
        let started = Instant::now();
        let config = RunConfig {
            seed: Some(seed),
            ..self.run_config.clone()
        };
        let max_time = config.max_time;
        let max_steps = config.max_steps;
        let engine = SteppingEngine::new(config)
            .unwrap_or_else(|e| unreachable!("validated configuration rejected: {e}"));

        let warmup = self.analysis.warmup_time;
        let interval = self.analysis.measurement_interval;
        let mut next_measurement = warmup;

        let mut time_series = Vec::new();
        let mut final_state = None;

        let done =
            move |s: &SimulationState| {
                (s.step_index > 0 && s.metrics.active_fires == 0) || s.elapsed_time >= max_time
            };
        for state in engine.run_until(initial, done).take(max_steps + 1) {
            let state = state?;
            if state.elapsed_time >= next_measurement {
                time_series.push(OrderParameters::measure(&state));
                next_measurement = state.elapsed_time + interval;
            }
            final_state = Some(state);
        }

        let final_state =
            final_state.unwrap_or_else(|| unreachable!("run yields at least the initial state"));
        let order_parameters = OrderParameters::measure(&final_state);
        let phase = crate::phase::classify_state(&order_parameters);

        Ok(RunOutcome {
            final_state,
            time_series,
            order_parameters,
            phase,
            wall_time: started.elapsed(),
        })
    }
}

/// Ignite a member-specific triple of cells on the base state
fn perturbed_initial(base: &SimulationState, seed: u64) -> SimulationState {
    let mut rng = SmallRng::seed_from_u64(seed);
    let width = base.width();
    let height = base.height();
    let points: Vec<(usize, usize)> = (0..IGNITION_POINTS)
        .map(|_| (rng.random_range(0..width), rng.random_range(0..height)))
        .collect();
    base.with_ignitions(&points)
}

/// Fold member results into means and standard deviations per observable
fn aggregate(runs: Vec<Result<RunOutcome, SimulationError>>) -> EnsembleOutcome {
    let mut sums: BTreeMap<&'static str, (f64, f64, usize)> = BTreeMap::new();
    for run in runs.iter().filter_map(|r| r.as_ref().ok()) {
        for (name, value) in run.order_parameters.as_pairs() {
            let entry = sums.entry(name).or_insert((0.0, 0.0, 0));
            entry.0 += value;
            entry.1 += value * value;
            entry.2 += 1;
        }
    }

    let mut mean = BTreeMap::new();
    let mut std_dev = BTreeMap::new();
    for (name, (sum, sum_sq, n)) in &sums {
        let n_f = *n as f64;
        let m = sum / n_f;
        mean.insert(*name, m);
        let variance = if *n > 1 {
            ((sum_sq - n_f * m * m) / (n_f - 1.0)).max(0.0)
        } else {
            0.0
        };
        std_dev.insert(*name, variance.sqrt());
    }

    let phase = classify_ensemble(
        mean.get("burnt_fraction").copied().unwrap_or(0.0),
        std_dev.get("burnt_fraction").copied().unwrap_or(0.0),
        mean.get("percolation_smooth").copied().unwrap_or(0.0),
        mean.get("largest_cluster_ratio").copied().unwrap_or(0.0),
    );

    EnsembleOutcome {
        runs,
        mean,
        std_dev,
        phase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alpine_fire_core::{Climate, Season, Terrain, TimeStepPolicy};
    use std::sync::Arc;

    fn base_state() -> SimulationState {
        let terrain = Arc::new(Terrain::flat(10, 10, 600.0));
        let climate = Arc::new(Climate::seasonal(Season::Summer));
        SimulationState::forested(&terrain, &climate)
    }

    fn runner(size: usize) -> EnsembleRunner {
        EnsembleRunner::new(
            RunConfig {
                max_steps: 30,
                max_time: 10.0,
                time_step: TimeStepPolicy::Fixed(0.5),
                parallelism: 2,
                ..RunConfig::default()
            },
            AnalysisConfig {
                ensemble_size: size,
                warmup_time: 0.0,
                measurement_interval: 1.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_members_get_distinct_seeds() {
        let base = base_state();
        let a = perturbed_initial(&base, MEMBER_SEED_BASE);
        let b = perturbed_initial(&base, MEMBER_SEED_BASE + 1);
        // Different seeds almost surely ignite different triples
        assert_ne!(a.grid, b.grid);
        assert!(a.metrics.active_fires >= 1);
        assert!(a.metrics.active_fires <= IGNITION_POINTS);
    }

    #[test]
    fn test_ensemble_aggregates_all_observables() {
        let outcome = runner(4).run(&base_state());
        assert_eq!(outcome.runs.len(), 4);
        assert_eq!(outcome.successes().count(), 4);
        assert!(outcome.mean.contains_key("burnt_fraction"));
        assert!(outcome.std_dev.contains_key("burnt_fraction"));
        assert_eq!(outcome.mean.len(), 9);
    }

    #[test]
    fn test_ensemble_is_bit_deterministic() {
        let base = base_state();
        let first = runner(4).run(&base);
        let second = runner(4).run(&base);
        assert_eq!(first.mean, second.mean);
        assert_eq!(first.std_dev, second.std_dev);
        assert_eq!(first.phase, second.phase);
    }

    #[test]
    fn test_time_series_respects_interval() {
        let run = runner(1)
            .run_single(base_state().with_ignitions(&[(5, 5)]), 42)
            .unwrap();
        assert!(!run.time_series.is_empty());
        // Fixed dt 0.5 and interval 1.0: at most one sample per two states
        assert!(run.time_series.len() <= 1 + (run.final_state.elapsed_time / 1.0) as usize + 1);
        assert!(run.wall_time.as_nanos() > 0);
    }
}
