//! Seasonal climate forcing
//!
//! A `Climate` is held fixed over a run and shared by every cell update.
//! Seasons carry the base conditions; elevation corrections are derived on
//! demand (standard lapse rate for temperature, thin-air oxygen factor).

use crate::error::ConfigError;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Standard atmospheric lapse rate (°C per meter)
const LAPSE_RATE: f64 = 0.0065;

/// Oxygen availability reduction per meter of elevation
const OXYGEN_REDUCTION_RATE: f64 = 0.00008;

/// Season of the simulated run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Valley-floor base temperature (°C)
    pub fn base_temperature(self) -> f64 {
        match self {
            Season::Spring => 15.0,
            Season::Summer => 28.0,
            Season::Autumn => 12.0,
            Season::Winter => -2.0,
        }
    }

    /// Typical relative humidity, 0 to 1
    pub fn base_humidity(self) -> f64 {
        match self {
            Season::Spring => 0.55,
            Season::Summer => 0.35,
            Season::Autumn => 0.60,
            Season::Winter => 0.75,
        }
    }

    /// Propensity for precipitation, 0 to 1
    pub fn precipitation_propensity(self) -> f64 {
        match self {
            Season::Spring => 0.4,
            Season::Summer => 0.15,
            Season::Autumn => 0.45,
            Season::Winter => 0.6,
        }
    }

    /// Elevation above which snow cover persists (meters)
    pub fn snow_line(self) -> f64 {
        match self {
            Season::Spring => 2200.0,
            Season::Summer => 3200.0,
            Season::Autumn => 2400.0,
            Season::Winter => 1200.0,
        }
    }
}

/// Wind forcing: direction in radians (counterclockwise from +x), speed in m/s
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub direction: f64,
    pub speed: f64,
}

impl Wind {
    pub fn new(direction: f64, speed: f64) -> Self {
        Wind { direction, speed }
    }

    pub fn calm() -> Self {
        Wind {
            direction: 0.0,
            speed: 0.0,
        }
    }

    /// Wind as a velocity vector in grid coordinates
    pub fn vector(&self) -> Vector2<f64> {
        Vector2::new(self.direction.cos(), self.direction.sin()) * self.speed
    }
}

/// Fixed climate conditions for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Climate {
    pub season: Season,
    pub wind: Wind,
    /// Relative humidity, 0 to 1
    pub humidity: f64,
    /// Precipitation rate (mm-equivalent per time unit)
    pub precipitation: f64,
}

impl Climate {
    /// Create a climate, validating ranges
    ///
    /// # Errors
    ///
    /// Rejects humidity outside [0, 1], negative or non-finite wind speed,
    /// non-finite wind direction, and negative precipitation.
    pub fn new(
        season: Season,
        wind: Wind,
        humidity: f64,
        precipitation: f64,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&humidity) {
            return Err(ConfigError::OutOfUnitRange {
                name: "humidity",
                value: humidity,
            });
        }
        if !wind.speed.is_finite() || wind.speed < 0.0 {
            return Err(ConfigError::InvalidWindSpeed(wind.speed));
        }
        if !wind.direction.is_finite() {
            return Err(ConfigError::InvalidWindDirection(wind.direction));
        }
        if !precipitation.is_finite() || precipitation < 0.0 {
            return Err(ConfigError::NegativeValue {
                name: "precipitation",
                value: precipitation,
            });
        }
        Ok(Climate {
            season,
            wind,
            humidity,
            precipitation,
        })
    }

    /// Seasonal preset with the season's typical humidity and no wind
    pub fn seasonal(season: Season) -> Self {
        Climate {
            season,
            wind: Wind::calm(),
            humidity: season.base_humidity(),
            precipitation: 0.0,
        }
    }

    /// Hot, dry, windy conditions for worst-case spread studies
    pub fn drought(wind_speed: f64) -> Self {
        Climate {
            season: Season::Summer,
            wind: Wind::new(0.0, wind_speed.max(0.0)),
            humidity: 0.12,
            precipitation: 0.0,
        }
    }

    /// Air temperature at elevation, from the seasonal base and lapse rate
    pub fn temperature_at_elevation(&self, elevation: f64) -> f64 {
        self.season.base_temperature() - LAPSE_RATE * elevation
    }

    /// Oxygen availability factor at elevation, 0 to 1
    pub fn oxygen_factor_at_elevation(&self, elevation: f64) -> f64 {
        (1.0 - OXYGEN_REDUCTION_RATE * elevation).max(0.0)
    }
}
