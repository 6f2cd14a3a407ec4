//! Rule system
//!
//! A rule is a small capability: a name, an applicability predicate, and a
//! pure transition from a cell (plus its boundary-resolved neighbors and
//! the pre-step snapshot) to a replacement cell and optionally an event.
//! Rules are a closed enum with a single dispatch site so the hot path
//! stays inlinable and the default rule set is statically known.
//!
//! Rules are partitioned into five ordered phase lists; the engine selects
//! lists by the cell's current state and threads the cell through every
//! applicable rule in order. Rules only ever read the pre-step snapshot.

mod burning;
mod extinction;
mod ignition;
mod recovery;

use crate::cell::{Cell, CellState};
use crate::climate::Climate;
use crate::config::RuleConfig;
use crate::event::FireEventKind;
use crate::grid::Grid;
use crate::physics::FirePhysics;
use crate::terrain::Terrain;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

/// Everything a rule may read while transforming a cell
///
/// All references point at pre-step data shared by every cell update in
/// the step, so rule application is freely parallelizable.
pub struct RuleContext<'a> {
    pub grid: &'a Grid,
    pub terrain: &'a Terrain,
    pub climate: &'a Climate,
    pub physics: &'a FirePhysics,
    pub config: &'a RuleConfig,
    /// Length of the step being computed
    pub dt: f64,
}

impl RuleContext<'_> {
    /// Terrain slope under a cell, radians
    #[inline]
    pub fn slope_at(&self, cell: &Cell) -> f64 {
        self.terrain.slope(cell.x, cell.y)
    }
}

/// The closed set of automaton rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Rule {
    // Ignition phase
    PreHeating,
    NeighborIgnition,
    SparkIgnition { probability: f64 },
    EmberIgnition { max_distance: f64 },
    // Burning phase
    IntensityEvolution,
    FuelConsumption,
    HeatGeneration,
    // Extinction phase
    FuelDepletion,
    TemperatureDecay,
    MoistureSuppression,
    NeighborIsolation,
    CombinedExtinction,
    // Recovery phase
    MoistureRecovery,
    VegetationSuccession { rate: f64 },
    NaturalRegrowth { rate: f64 },
    SeasonalGrowth { rate: f64 },
    SeedDispersion { rate: f64 },
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::PreHeating => "pre-heating",
            Rule::NeighborIgnition => "neighbor-ignition",
            Rule::SparkIgnition { .. } => "spark-ignition",
            Rule::EmberIgnition { .. } => "ember-ignition",
            Rule::IntensityEvolution => "intensity-evolution",
            Rule::FuelConsumption => "fuel-consumption",
            Rule::HeatGeneration => "heat-generation",
            Rule::FuelDepletion => "fuel-depletion",
            Rule::TemperatureDecay => "temperature-decay",
            Rule::MoistureSuppression => "moisture-suppression",
            Rule::NeighborIsolation => "neighbor-isolation",
            Rule::CombinedExtinction => "combined-extinction",
            Rule::MoistureRecovery => "moisture-recovery",
            Rule::VegetationSuccession { .. } => "vegetation-succession",
            Rule::NaturalRegrowth { .. } => "natural-regrowth",
            Rule::SeasonalGrowth { .. } => "seasonal-growth",
            Rule::SeedDispersion { .. } => "seed-dispersion",
        }
    }

    /// Whether the rule has anything to say about this cell
    pub fn is_applicable(&self, cell: &Cell, ctx: &RuleContext<'_>) -> bool {
        match self {
            Rule::PreHeating => ignition::preheating_applicable(cell, ctx),
            Rule::NeighborIgnition => ignition::neighbor_ignition_applicable(cell, ctx),
            Rule::SparkIgnition { .. } => ignition::spark_ignition_applicable(cell, ctx),
            Rule::EmberIgnition { .. } => ignition::ember_ignition_applicable(cell, ctx),
            Rule::IntensityEvolution
            | Rule::FuelConsumption
            | Rule::HeatGeneration
            | Rule::FuelDepletion
            | Rule::TemperatureDecay
            | Rule::MoistureSuppression
            | Rule::NeighborIsolation
            | Rule::CombinedExtinction => cell.state == CellState::Burning,
            Rule::MoistureRecovery => recovery::moisture_recovery_applicable(cell, ctx),
            Rule::VegetationSuccession { .. } => {
                ctx.config.enable_regrowth && cell.state == CellState::Burnt
            }
            Rule::NaturalRegrowth { .. }
            | Rule::SeasonalGrowth { .. }
            | Rule::SeedDispersion { .. } => {
                ctx.config.enable_regrowth
                    && matches!(cell.state, CellState::Empty | CellState::Burnt)
            }
        }
    }

    /// Transform the cell, possibly emitting a fire event
    ///
    /// The returned event is unstamped; the engine stamps it with the new
    /// elapsed time when the step is assembled.
    pub fn apply(
        &self,
        cell: Cell,
        neighbors: &[Cell],
        ctx: &RuleContext<'_>,
        rng: &mut SmallRng,
    ) -> (Cell, Option<FireEventKind>) {
        match self {
            Rule::PreHeating => (ignition::preheat(cell, neighbors, ctx), None),
            Rule::NeighborIgnition => ignition::neighbor_ignition(cell, neighbors, ctx, rng),
            Rule::SparkIgnition { probability } => {
                ignition::spark_ignition(cell, *probability, ctx, rng)
            }
            Rule::EmberIgnition { max_distance } => {
                ignition::ember_ignition(cell, *max_distance, ctx, rng)
            }
            Rule::IntensityEvolution => (burning::evolve_intensity(cell, ctx), None),
            Rule::FuelConsumption => (burning::consume_fuel(cell, ctx), None),
            Rule::HeatGeneration => (burning::sustain_heat(cell, ctx), None),
            Rule::FuelDepletion => extinction::fuel_depletion(cell, ctx),
            Rule::TemperatureDecay => extinction::temperature_decay(cell, ctx),
            Rule::MoistureSuppression => extinction::moisture_suppression(cell, ctx, rng),
            Rule::NeighborIsolation => extinction::neighbor_isolation(cell, neighbors, ctx, rng),
            Rule::CombinedExtinction => extinction::combined_extinction(cell, ctx, rng),
            Rule::MoistureRecovery => (recovery::recover_moisture(cell, ctx), None),
            Rule::VegetationSuccession { rate } => {
                (recovery::vegetation_succession(cell, *rate, ctx, rng), None)
            }
            Rule::NaturalRegrowth { rate } => {
                (recovery::natural_regrowth(cell, *rate, ctx, rng), None)
            }
            Rule::SeasonalGrowth { rate } => {
                (recovery::seasonal_growth(cell, *rate, ctx, rng), None)
            }
            Rule::SeedDispersion { rate } => {
                (recovery::seed_dispersion(cell, *rate, neighbors, ctx, rng), None)
            }
        }
    }
}

/// The five ordered phase lists of the rule engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub ignition: Vec<Rule>,
    pub burning: Vec<Rule>,
    pub extinction: Vec<Rule>,
    pub recovery: Vec<Rule>,
    pub intervention: Vec<Rule>,
}

impl RuleSet {
    /// The default rule set, parameterized by the rule configuration
    pub fn default_rules(config: &RuleConfig) -> Self {
        let mut ignition = vec![Rule::PreHeating, Rule::NeighborIgnition];
        if config.enable_sparks {
            ignition.push(Rule::SparkIgnition {
                probability: config.spark_probability,
            });
        }
        if config.enable_embers {
            ignition.push(Rule::EmberIgnition {
                max_distance: config.ember_distance,
            });
        }

        RuleSet {
            ignition,
            burning: vec![
                Rule::IntensityEvolution,
                Rule::FuelConsumption,
                Rule::HeatGeneration,
            ],
            extinction: vec![
                Rule::FuelDepletion,
                Rule::TemperatureDecay,
                Rule::MoistureSuppression,
                Rule::NeighborIsolation,
                Rule::CombinedExtinction,
            ],
            recovery: vec![
                Rule::MoistureRecovery,
                Rule::VegetationSuccession {
                    rate: config.regrowth_rate * 2.0,
                },
                Rule::NaturalRegrowth {
                    rate: config.regrowth_rate,
                },
                Rule::SeasonalGrowth {
                    rate: config.regrowth_rate,
                },
                Rule::SeedDispersion {
                    rate: config.regrowth_rate,
                },
            ],
            intervention: Vec::new(),
        }
    }

    /// The phase lists applied to a cell in this state, in order
    pub fn lists_for(&self, state: CellState) -> [&[Rule]; 3] {
        match state {
            CellState::Empty | CellState::Burnt => {
                [&self.recovery[..], &self.intervention[..], &[]]
            }
            CellState::Tree => [&self.ignition[..], &self.intervention[..], &[]],
            CellState::Burning => [
                &self.burning[..],
                &self.extinction[..],
                &self.intervention[..],
            ],
        }
    }

    /// Apply every applicable rule to the cell, collecting emitted events
    pub fn apply_to_cell(
        &self,
        mut cell: Cell,
        neighbors: &[Cell],
        ctx: &RuleContext<'_>,
        rng: &mut SmallRng,
        events: &mut Vec<(FireEventKind, usize, usize)>,
    ) -> Cell {
        let lists = self.lists_for(cell.state);
        for list in lists {
            for rule in list {
                if rule.is_applicable(&cell, ctx) {
                    let (next, event) = rule.apply(cell, neighbors, ctx, rng);
                    cell = next;
                    if let Some(kind) = event {
                        events.push((kind, cell.x, cell.y));
                    }
                }
            }
        }
        cell
    }
}
