//! Run, rule, and analysis configuration
//!
//! Configuration structs are plain data validated up front; a run never
//! starts from an invalid configuration (§ error surface: validation
//! failures are synchronous, before any state is produced).

use crate::boundary::BoundaryPolicy;
use crate::error::ConfigError;
use crate::physics::FirePhysics;
use serde::{Deserialize, Serialize};

/// How the new grid is assembled each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStrategy {
    /// All cells read the pre-step snapshot; outputs are independent
    Synchronous,
    /// Cells visited in a seeded pseudo-random order, seeing prior updates
    Asynchronous,
    /// `k x k` tiles updated in parallel, synchronous semantics inside
    Block(usize),
}

/// Time-step selection policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimeStepPolicy {
    /// Constant dt, clamped to the configured bounds
    Fixed(f64),
    /// `min(CFL bound, activity ladder)`, clamped
    Adaptive,
    /// Activity ladder alone
    ChangeRate,
}

/// Per-run engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub max_steps: usize,
    /// Wall-clock of the simulated system, not the host
    pub max_time: f64,
    pub min_dt: f64,
    pub max_dt: f64,
    pub time_step: TimeStepPolicy,
    pub update_strategy: UpdateStrategy,
    pub boundary: BoundaryPolicy,
    /// Upper bound on worker threads for parallel strategies
    pub parallelism: usize,
    /// Seed for every stochastic draw; `None` means seed 0
    pub seed: Option<u64>,
    pub physics: FirePhysics,
    pub rules: RuleConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            max_steps: 1000,
            max_time: 100.0,
            min_dt: 0.01,
            max_dt: 1.0,
            time_step: TimeStepPolicy::Adaptive,
            update_strategy: UpdateStrategy::Synchronous,
            boundary: BoundaryPolicy::Absorbing,
            parallelism: 4,
            seed: None,
            physics: FirePhysics::default(),
            rules: RuleConfig::default(),
        }
    }
}

impl RunConfig {
    /// Validate before any state is produced
    ///
    /// # Errors
    ///
    /// Rejects inverted or non-positive dt bounds, zero parallelism
    /// treated as one, zero block sizes, and rule-config range errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_dt.is_finite()
            || !self.max_dt.is_finite()
            || self.min_dt <= 0.0
            || self.min_dt > self.max_dt
        {
            return Err(ConfigError::InvalidTimeStepBounds {
                min_dt: self.min_dt,
                max_dt: self.max_dt,
            });
        }
        if let TimeStepPolicy::Fixed(dt) = self.time_step {
            if !dt.is_finite() || dt <= 0.0 {
                return Err(ConfigError::NegativeValue {
                    name: "fixed dt",
                    value: dt,
                });
            }
        }
        if let UpdateStrategy::Block(k) = self.update_strategy {
            if k == 0 {
                return Err(ConfigError::ZeroBlockSize);
            }
        }
        if !self.max_time.is_finite() || self.max_time < 0.0 {
            return Err(ConfigError::NegativeValue {
                name: "max_time",
                value: self.max_time,
            });
        }
        self.rules.validate()
    }

    /// Effective seed: configured value or 0
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(0)
    }

    /// Effective worker count, at least one
    pub fn workers(&self) -> usize {
        self.parallelism.max(1)
    }
}

/// Feature toggles for the default rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub enable_sparks: bool,
    /// Per-step base probability of a lightning/spark ignition
    pub spark_probability: f64,
    pub enable_embers: bool,
    /// Maximum ember transport distance (cells)
    pub ember_distance: f64,
    pub enable_regrowth: bool,
    /// Base per-step regrowth probability
    pub regrowth_rate: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig {
            enable_sparks: false,
            spark_probability: 0.0001,
            enable_embers: true,
            ember_distance: 5.0,
            enable_regrowth: false,
            regrowth_rate: 0.001,
        }
    }
}

impl RuleConfig {
    /// # Errors
    ///
    /// Rejects probabilities outside [0, 1] and negative distances.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.spark_probability) {
            return Err(ConfigError::OutOfUnitRange {
                name: "spark_probability",
                value: self.spark_probability,
            });
        }
        if !(0.0..=1.0).contains(&self.regrowth_rate) {
            return Err(ConfigError::OutOfUnitRange {
                name: "regrowth_rate",
                value: self.regrowth_rate,
            });
        }
        if !self.ember_distance.is_finite() || self.ember_distance < 0.0 {
            return Err(ConfigError::NegativeValue {
                name: "ember_distance",
                value: self.ember_distance,
            });
        }
        Ok(())
    }
}

/// Configuration for ensemble measurement campaigns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub ensemble_size: usize,
    /// Simulated time discarded before measurements begin
    pub warmup_time: f64,
    /// Simulated time between retained measurements
    pub measurement_interval: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            ensemble_size: 16,
            warmup_time: 0.0,
            measurement_interval: 1.0,
        }
    }
}

impl AnalysisConfig {
    /// # Errors
    ///
    /// Rejects empty ensembles and negative times.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ensemble_size == 0 {
            return Err(ConfigError::NegativeValue {
                name: "ensemble_size",
                value: 0.0,
            });
        }
        if !self.warmup_time.is_finite() || self.warmup_time < 0.0 {
            return Err(ConfigError::NegativeValue {
                name: "warmup_time",
                value: self.warmup_time,
            });
        }
        if !self.measurement_interval.is_finite() || self.measurement_interval <= 0.0 {
            return Err(ConfigError::NegativeValue {
                name: "measurement_interval",
                value: self.measurement_interval,
            });
        }
        Ok(())
    }
}
