//! The stepping engine
//!
//! Drives the automaton: computes the step length, assembles the next grid
//! under the configured update strategy, stamps rule-emitted events with
//! the new elapsed time, recomputes the metrics, and wraps everything in a
//! fresh immutable state.
//!
//! Determinism: every random draw derives from `(seed, step, x, y)`, so
//! runs with the same seed are bit-identical regardless of how the
//! synchronous update is parallelized.

use crate::cell::Cell;
use crate::config::{RunConfig, UpdateStrategy};
use crate::error::{ConfigError, SimulationError};
use crate::event::{FireEvent, FireEventKind};
use crate::grid::Grid;
use crate::metrics::{ClusterAnalysis, Metrics};
use crate::rng::{cell_rng, step_rng};
use crate::rules::{RuleContext, RuleSet};
use crate::state::{SimulationState, MAX_EVENTS};
use crate::timestep::compute_dt;
use rayon::prelude::*;
use tracing::{debug, info};

/// Relaxation rate of non-burning cells toward ambient temperature
const AMBIENT_RELAXATION: f64 = 0.05;

type CellOutcome = (Cell, Vec<(FireEventKind, usize, usize)>);

/// A configured, reusable automaton driver
///
/// The engine owns its rule set and worker pool; states flow through it
/// without being retained, so one engine can drive many runs.
pub struct SteppingEngine {
    config: RunConfig,
    rules: RuleSet,
    pool: rayon::ThreadPool,
}

impl SteppingEngine {
    /// Build an engine, validating the configuration up front
    ///
    /// # Errors
    ///
    /// Any `ConfigError` from `RunConfig::validate`, or a thread-pool
    /// build failure.
    pub fn new(config: RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rules = RuleSet::default_rules(&config.rules);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers())
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
        info!(
            strategy = ?config.update_strategy,
            boundary = ?config.boundary,
            workers = config.workers(),
            "stepping engine ready"
        );
        Ok(SteppingEngine { config, rules, pool })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Advance one step
    ///
    /// # Errors
    ///
    /// `SimulationError` on grid/terrain dimension mismatch or an
    /// unrecoverable rule fault; the failed state is not produced.
    pub fn step(&self, state: &SimulationState) -> Result<SimulationState, SimulationError> {
        let dt = compute_dt(state, &self.config);
        self.step_with_dt(state, dt)
    }

    /// Advance one step of exactly `dt`
    fn step_with_dt(
        &self,
        state: &SimulationState,
        dt: f64,
    ) -> Result<SimulationState, SimulationError> {
        let grid = &state.grid;
        if (grid.width(), grid.height()) != (state.terrain.width(), state.terrain.height()) {
            return Err(SimulationError::DimensionMismatch {
                grid: (grid.width(), grid.height()),
                terrain: (state.terrain.width(), state.terrain.height()),
            });
        }

        let (cells, events) = match self.config.update_strategy {
            UpdateStrategy::Synchronous => self.synchronous_update(state, dt)?,
            UpdateStrategy::Asynchronous => self.asynchronous_update(state, dt)?,
            UpdateStrategy::Block(k) => self.block_update(state, k, dt)?,
        };

        let new_grid = Grid::from_cells(grid.width(), grid.height(), cells);
        let elapsed_time = state.elapsed_time + dt;

        let mut stamped: Vec<FireEvent> = events
            .into_iter()
            .map(|(kind, x, y)| FireEvent::new(kind, x, y).stamped(elapsed_time))
            .collect();
        stamped.truncate(MAX_EVENTS);

        let clusters = ClusterAnalysis::analyze(&new_grid);
        let metrics = Metrics::collect(&new_grid, &clusters);
        debug!(
            step = state.step_index + 1,
            elapsed = elapsed_time,
            active = metrics.active_fires,
            burnt = metrics.total_burnt_area,
            "step complete"
        );

        Ok(SimulationState {
            grid: new_grid,
            terrain: state.terrain.clone(),
            climate: state.climate.clone(),
            time_step: dt,
            elapsed_time,
            step_index: state.step_index + 1,
            metrics,
            clusters,
            events: stamped,
        })
    }

    /// One cell's update against a read-only snapshot
    fn update_cell(
        &self,
        snapshot: &Grid,
        state: &SimulationState,
        x: usize,
        y: usize,
        dt: f64,
    ) -> Result<CellOutcome, SimulationError> {
        let mut cell = *snapshot.at(x, y);

        // Ambient physics before the rule lists: the burn clock for fires,
        // the moisture balance and temperature relaxation for everything
        // else
        if cell.is_burning() {
            cell.burn_duration += dt;
        } else {
            let delta = self.config.physics.moisture_delta(
                cell.temperature,
                state.climate.humidity,
                state.climate.precipitation,
                dt,
            );
            cell.moisture = (cell.moisture + delta).clamp(0.0, 1.0);

            let ambient = state.climate.temperature_at_elevation(cell.elevation);
            let rate = (AMBIENT_RELAXATION * dt).min(1.0);
            cell.temperature += (ambient - cell.temperature) * rate;
        }

        let neighbors = self.config.boundary.moore_neighbors(snapshot, x, y);
        let ctx = RuleContext {
            grid: snapshot,
            terrain: &state.terrain,
            climate: &state.climate,
            physics: &self.config.physics,
            config: &self.config.rules,
            dt,
        };
        let mut rng = cell_rng(self.config.seed(), state.step_index, x, y);
        let mut events = Vec::new();
        let cell = self
            .rules
            .apply_to_cell(cell, &neighbors, &ctx, &mut rng, &mut events);

        if !cell.temperature.is_finite() || !cell.moisture.is_finite() {
            return Err(SimulationError::RuleFailure {
                rule: "cell-update",
                x,
                y,
                detail: format!(
                    "non-finite cell quantities: T={}, M={}",
                    cell.temperature, cell.moisture
                ),
            });
        }

        Ok((cell, events))
    }

    /// Synchronous strategy: every cell reads the pre-step snapshot;
    /// outputs are assembled independently, in parallel
    fn synchronous_update(
        &self,
        state: &SimulationState,
        dt: f64,
    ) -> Result<(Vec<Cell>, Vec<(FireEventKind, usize, usize)>), SimulationError> {
        let width = state.grid.width();
        let height = state.grid.height();
        let snapshot = &state.grid;

        let outcomes: Result<Vec<CellOutcome>, SimulationError> = self.pool.install(|| {
            (0..width * height)
                .into_par_iter()
                .map(|i| self.update_cell(snapshot, state, i % width, i / width, dt))
                .collect()
        });

        Ok(split_outcomes(outcomes?))
    }

    /// Block strategy: `k x k` tiles update in parallel; every read still
    /// comes from the pre-step snapshot, so border collisions resolve
    /// exactly as the synchronous strategy would
    fn block_update(
        &self,
        state: &SimulationState,
        block: usize,
        dt: f64,
    ) -> Result<(Vec<Cell>, Vec<(FireEventKind, usize, usize)>), SimulationError> {
        let width = state.grid.width();
        let height = state.grid.height();
        let snapshot = &state.grid;

        let blocks_x = width.div_ceil(block);
        let blocks_y = height.div_ceil(block);

        let per_block: Result<Vec<Vec<(usize, CellOutcome)>>, SimulationError> =
            self.pool.install(|| {
                (0..blocks_x * blocks_y)
                    .into_par_iter()
                    .map(|b| {
                        let bx = (b % blocks_x) * block;
                        let by = (b / blocks_x) * block;
                        let mut results = Vec::new();
                        for y in by..(by + block).min(height) {
                            for x in bx..(bx + block).min(width) {
                                let outcome = self.update_cell(snapshot, state, x, y, dt)?;
                                results.push((y * width + x, outcome));
                            }
                        }
                        Ok(results)
                    })
                    .collect()
            });

        // Reassemble row-major so cells and events match the synchronous
        // ordering guarantee
        let mut slots: Vec<Option<CellOutcome>> = vec![None; width * height];
        for block_results in per_block? {
            for (index, outcome) in block_results {
                slots[index] = Some(outcome);
            }
        }
        let outcomes: Vec<CellOutcome> = slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| unreachable!("blocks tile the grid")))
            .collect();

        Ok(split_outcomes(outcomes))
    }

    /// Asynchronous strategy: cells are visited in a seeded pseudo-random
    /// order and each update sees every previous update of the same step
    fn asynchronous_update(
        &self,
        state: &SimulationState,
        dt: f64,
    ) -> Result<(Vec<Cell>, Vec<(FireEventKind, usize, usize)>), SimulationError> {
        let width = state.grid.width();
        let height = state.grid.height();

        let mut order: Vec<usize> = (0..width * height).collect();
        shuffle(&mut order, self.config.seed(), state.step_index);

        let mut working = state.grid.clone();
        let mut events = Vec::new();

        for index in order {
            let (x, y) = (index % width, index / width);
            let (cell, mut cell_events) = self.update_cell(&working, state, x, y, dt)?;
            working.set(x, y, cell);
            events.append(&mut cell_events);
        }

        let cells = working.as_slice().to_vec();
        Ok((cells, events))
    }

    /// Lazy run of at most `max_steps` steps after the initial state
    pub fn run(&self, initial: SimulationState, max_steps: usize) -> StateIter<'_> {
        StateIter::new(self, initial, StopCondition::Steps(max_steps))
    }

    /// Lazy run that ends with the first state satisfying `predicate`
    pub fn run_until<P>(&self, initial: SimulationState, predicate: P) -> StateIter<'_>
    where
        P: Fn(&SimulationState) -> bool + 'static,
    {
        StateIter::new(self, initial, StopCondition::Until(Box::new(predicate)))
    }

    /// Lazy run to exactly `max_time` of simulated time
    ///
    /// The final step is shortened so the last state's elapsed time equals
    /// `max_time`.
    pub fn run_adaptive(&self, initial: SimulationState, max_time: f64) -> StateIter<'_> {
        StateIter::new(self, initial, StopCondition::Time(max_time))
    }
}

fn split_outcomes(outcomes: Vec<CellOutcome>) -> (Vec<Cell>, Vec<(FireEventKind, usize, usize)>) {
    let mut cells = Vec::with_capacity(outcomes.len());
    let mut events = Vec::new();
    for (cell, mut cell_events) in outcomes {
        cells.push(cell);
        events.append(&mut cell_events);
    }
    (cells, events)
}

/// Deterministic Fisher-Yates driven by the step generator
fn shuffle(indices: &mut [usize], seed: u64, step: u64) {
    use rand::Rng;
    let mut rng = step_rng(seed, step);
    for i in (1..indices.len()).rev() {
        let j = rng.random_range(0..=i);
        indices.swap(i, j);
    }
}

enum StopCondition {
    /// At most this many steps after the initial state
    Steps(usize),
    /// Stop after yielding a state satisfying the predicate
    Until(Box<dyn Fn(&SimulationState) -> bool>),
    /// Stop exactly at this elapsed time
    Time(f64),
}

/// Pull-driven state sequence
///
/// Produces one state per demand, the initial state first. Dropping the
/// iterator cancels the run at a step boundary; after an error the
/// sequence terminates.
pub struct StateIter<'a> {
    engine: &'a SteppingEngine,
    current: Option<SimulationState>,
    stop: StopCondition,
    steps_taken: usize,
    yielded_initial: bool,
    finished: bool,
}

impl<'a> StateIter<'a> {
    fn new(engine: &'a SteppingEngine, initial: SimulationState, stop: StopCondition) -> Self {
        StateIter {
            engine,
            current: Some(initial),
            stop,
            steps_taken: 0,
            yielded_initial: false,
            finished: false,
        }
    }

    fn should_stop_after(&self, state: &SimulationState) -> bool {
        match &self.stop {
            StopCondition::Steps(max) => self.steps_taken >= *max,
            StopCondition::Until(predicate) => predicate(state),
            StopCondition::Time(max_time) => state.elapsed_time >= *max_time,
        }
    }

    fn next_dt(&self, state: &SimulationState) -> f64 {
        let dt = compute_dt(state, &self.engine.config);
        if let StopCondition::Time(max_time) = &self.stop {
            // Shorten the final step to land exactly on max_time
            let remaining = max_time - state.elapsed_time;
            if remaining > 0.0 && remaining < dt {
                return remaining;
            }
        }
        dt
    }
}

impl Iterator for StateIter<'_> {
    type Item = Result<SimulationState, SimulationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if !self.yielded_initial {
            self.yielded_initial = true;
            let state = self.current.as_ref()?;
            if self.should_stop_after(state) {
                self.finished = true;
            }
            return Some(Ok(state.clone()));
        }

        let state = self.current.take()?;
        let dt = self.next_dt(&state);
        match self.engine.step_with_dt(&state, dt) {
            Ok(mut next) => {
                if let StopCondition::Time(max_time) = &self.stop {
                    // Absorb the rounding of the shortened final step
                    if next.elapsed_time >= *max_time {
                        next.elapsed_time = *max_time;
                    }
                }
                self.steps_taken += 1;
                if self.should_stop_after(&next) {
                    self.finished = true;
                } else {
                    self.current = Some(next.clone());
                }
                Some(Ok(next))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
