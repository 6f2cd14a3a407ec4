//! Error types for configuration validation and run-time failures

use std::fmt;

/// Rejected configuration, reported before any state is produced
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Grid or terrain dimensions were zero
    InvalidDimensions { width: usize, height: usize },
    /// Elevation buffer length does not match `width * height`
    ElevationSizeMismatch { expected: usize, actual: usize },
    /// Elevation value was negative or non-finite
    InvalidElevation(f64),
    /// A fraction or probability fell outside [0, 1]
    OutOfUnitRange { name: &'static str, value: f64 },
    /// A value that must be non-negative was negative or non-finite
    NegativeValue { name: &'static str, value: f64 },
    /// Time-step bounds were inverted or non-positive
    InvalidTimeStepBounds { min_dt: f64, max_dt: f64 },
    /// Wind speed was negative or non-finite
    InvalidWindSpeed(f64),
    /// Wind direction was non-finite
    InvalidWindDirection(f64),
    /// Block update strategy was configured with a zero block size
    ZeroBlockSize,
    /// The worker thread pool could not be built
    ThreadPool(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDimensions { width, height } => {
                write!(f, "grid dimensions must be positive, got {width}x{height}")
            }
            ConfigError::ElevationSizeMismatch { expected, actual } => {
                write!(f, "elevation buffer holds {actual} samples, expected {expected}")
            }
            ConfigError::InvalidElevation(value) => {
                write!(f, "elevation must be finite and non-negative, got {value}")
            }
            ConfigError::OutOfUnitRange { name, value } => {
                write!(f, "{name} must lie in [0, 1], got {value}")
            }
            ConfigError::NegativeValue { name, value } => {
                write!(f, "{name} must be non-negative and finite, got {value}")
            }
            ConfigError::InvalidTimeStepBounds { min_dt, max_dt } => {
                write!(f, "time-step bounds must satisfy 0 < min_dt <= max_dt, got [{min_dt}, {max_dt}]")
            }
            ConfigError::InvalidWindSpeed(value) => {
                write!(f, "wind speed must be finite and non-negative, got {value}")
            }
            ConfigError::InvalidWindDirection(value) => {
                write!(f, "wind direction must be finite, got {value}")
            }
            ConfigError::ZeroBlockSize => {
                write!(f, "block update strategy requires a block size of at least 1")
            }
            ConfigError::ThreadPool(detail) => {
                write!(f, "failed to build worker thread pool: {detail}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Fatal failure inside a running simulation
///
/// Per-cell numeric warnings are clamped and survived; these variants end
/// the current run. The state being produced when the error occurred is
/// not emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A rule produced a non-finite cell quantity that could not be clamped
    RuleFailure {
        rule: &'static str,
        x: usize,
        y: usize,
        detail: String,
    },
    /// Grid and terrain dimensions disagree
    DimensionMismatch {
        grid: (usize, usize),
        terrain: (usize, usize),
    },
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::RuleFailure { rule, x, y, detail } => {
                write!(f, "rule '{rule}' failed at ({x}, {y}): {detail}")
            }
            SimulationError::DimensionMismatch { grid, terrain } => {
                write!(
                    f,
                    "grid is {}x{} but terrain is {}x{}",
                    grid.0, grid.1, terrain.0, terrain.1
                )
            }
        }
    }
}

impl std::error::Error for SimulationError {}
