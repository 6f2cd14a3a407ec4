//! Alpine forest-fire cellular automaton
//!
//! Deterministic cellular-automaton driver for studying fire percolation
//! on heterogeneous alpine terrain. The crate provides the domain model
//! (cells, grid, terrain, climate), the fire physics primitives, a closed
//! rule system with five ordered phase lists, configurable boundary
//! handling and time stepping, and the stepping engine that produces lazy
//! sequences of immutable simulation states with per-step metrics.
//!
//! Batch orchestration and critical-phenomena analysis live in the
//! companion `alpine-fire-analysis` crate.

pub mod boundary;
pub mod cell;
pub mod climate;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod grid;
pub mod metrics;
pub mod physics;
pub mod rng;
pub mod rules;
pub mod state;
pub mod terrain;
pub mod timestep;

// Re-export main types
pub use boundary::BoundaryPolicy;
pub use cell::{Cell, CellState, VegetationType};
pub use climate::{Climate, Season, Wind};
pub use config::{AnalysisConfig, RuleConfig, RunConfig, TimeStepPolicy, UpdateStrategy};
pub use engine::{StateIter, SteppingEngine};
pub use error::{ConfigError, SimulationError};
pub use event::{FireEvent, FireEventKind};
pub use grid::Grid;
pub use metrics::{ClusterAnalysis, Metrics};
pub use physics::FirePhysics;
pub use rules::{Rule, RuleContext, RuleSet};
pub use state::SimulationState;
pub use terrain::Terrain;
