use serde::{Deserialize, Serialize};

/// Combustion state of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Empty,
    Tree,
    Burning,
    Burnt,
}

/// Vegetation cover classes for alpine terrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VegetationType {
    DenseForest,
    SparseForest,
    Shrubland,
    Grassland,
    Barren,
    Water,
    Urban,
}

impl VegetationType {
    /// Multiplier applied to the ignition probability for this cover class
    pub fn ignition_factor(self) -> f64 {
        match self {
            VegetationType::DenseForest => 1.2,
            VegetationType::SparseForest => 1.0,
            VegetationType::Shrubland => 0.9,
            VegetationType::Grassland => 0.8,
            VegetationType::Barren => 0.1,
            VegetationType::Water => 0.0,
            VegetationType::Urban => 0.3,
        }
    }

    /// Base fire spread rate in cells per time unit
    pub fn base_spread_rate(self) -> f64 {
        match self {
            VegetationType::DenseForest => 0.5,
            VegetationType::SparseForest => 0.7,
            VegetationType::Grassland => 1.2,
            VegetationType::Shrubland => 0.9,
            VegetationType::Barren => 0.1,
            VegetationType::Water => 0.0,
            VegetationType::Urban => 0.2,
        }
    }

    /// Available fuel per cell in arbitrary burn-duration units
    pub fn fuel_content(self) -> f64 {
        match self {
            VegetationType::DenseForest => 100.0,
            VegetationType::SparseForest => 60.0,
            VegetationType::Grassland => 20.0,
            VegetationType::Shrubland => 40.0,
            VegetationType::Barren | VegetationType::Water | VegetationType::Urban => 10.0,
        }
    }

    /// Whether fire can ever take hold on this cover class
    pub fn is_burnable(self) -> bool {
        !matches!(self, VegetationType::Water)
    }
}

/// A single cell of the automaton
///
/// Cells are value types: the stepping engine replaces cells rather than
/// mutating them in place, so a cell read from a snapshot never changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    pub state: CellState,
    /// Terrain elevation at this cell (meters above sea level)
    pub elevation: f64,
    pub vegetation: VegetationType,
    /// Fuel moisture fraction, 0 (bone dry) to 1 (saturated)
    pub moisture: f64,
    /// Cell temperature (°C); tracks flame temperature while burning
    pub temperature: f64,
    /// Time spent in the Burning state, in simulation time units
    pub burn_duration: f64,
}

impl Cell {
    pub fn new(
        x: usize,
        y: usize,
        state: CellState,
        elevation: f64,
        vegetation: VegetationType,
        moisture: f64,
        temperature: f64,
    ) -> Self {
        Cell {
            x,
            y,
            state,
            elevation,
            vegetation,
            moisture: moisture.clamp(0.0, 1.0),
            temperature,
            burn_duration: 0.0,
        }
    }

    /// True for cells that a fire can currently move into
    pub fn is_burnable(&self) -> bool {
        self.state == CellState::Tree && self.vegetation.is_burnable()
    }

    pub fn is_burning(&self) -> bool {
        self.state == CellState::Burning
    }

    /// Replace the combustion state, resetting the burn clock on ignition
    pub fn with_state(mut self, state: CellState) -> Self {
        if state == CellState::Burning && self.state != CellState::Burning {
            self.burn_duration = 0.0;
        }
        self.state = state;
        self
    }

    pub fn with_moisture(mut self, moisture: f64) -> Self {
        self.moisture = moisture.clamp(0.0, 1.0);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}
