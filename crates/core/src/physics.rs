//! Fire physics primitives
//!
//! Free functions over a `FirePhysics` parameter struct, composed by the
//! rules. Every probability leaving this module is clamped to [0, 1].

use crate::cell::Cell;
use crate::climate::{Climate, Wind};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Tunable physical parameters with empirical defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirePhysics {
    pub base_ignition_probability: f64,
    pub moisture_coefficient: f64,
    /// Temperature at which ignition becomes likely (°C)
    pub temperature_critical: f64,
    /// Width of the ignition temperature response (°C)
    pub temperature_scale: f64,
    /// Empirical exponent coefficient for upslope spread
    pub slope_factor: f64,
    /// Empirical exponent coefficient for wind-driven spread
    pub wind_factor: f64,
    pub evaporation_rate: f64,
    pub precipitation_rate: f64,
    /// Radius within which burning cells contribute heat (cells)
    pub heat_transfer_radius: f64,
    /// Upslope convection enhancement per unit of relative rise
    pub convection_enhancement: f64,
}

impl Default for FirePhysics {
    fn default() -> Self {
        FirePhysics {
            base_ignition_probability: 0.01,
            moisture_coefficient: 0.05,
            temperature_critical: 30.0,
            temperature_scale: 5.0,
            slope_factor: 3.533,
            wind_factor: 0.1783,
            evaporation_rate: 0.001,
            precipitation_rate: 0.01,
            heat_transfer_radius: 2.0,
            convection_enhancement: 0.5,
        }
    }
}

/// Standard logistic function
#[inline]
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl FirePhysics {
    /// Probability that a tree cell ignites from `burning_neighbors` fires
    ///
    /// Multiplicative response: neighbor pressure, moisture damping,
    /// temperature response, vegetation class, upslope enhancement, wind
    /// enhancement, and high-altitude oxygen thinning. Clamped to [0, 1].
    pub fn ignition_probability(
        &self,
        cell: &Cell,
        burning_neighbors: usize,
        slope: f64,
        climate: &Climate,
    ) -> f64 {
        if !cell.vegetation.is_burnable() {
            return 0.0;
        }

        let neighbor_term = 1.0 + 0.5 * burning_neighbors as f64;
        let moisture_term = (-self.moisture_coefficient * cell.moisture).exp();
        let temperature_term = logistic(
            (cell.temperature - self.temperature_critical) / self.temperature_scale,
        );
        let vegetation_term = cell.vegetation.ignition_factor();
        let slope_term = self.slope_multiplier(slope);
        let wind_term = (self.wind_factor * climate.wind.speed).exp();
        let oxygen_term = climate.oxygen_factor_at_elevation(cell.elevation);

        let p = self.base_ignition_probability
            * neighbor_term
            * moisture_term
            * temperature_term
            * vegetation_term
            * slope_term
            * wind_term
            * oxygen_term;

        clamp_probability(p)
    }

    /// Upslope spread multiplier for a slope angle in radians
    fn slope_multiplier(&self, slope: f64) -> f64 {
        if slope > 0.0 && slope < std::f64::consts::FRAC_PI_2 {
            (self.slope_factor * slope.tan().powf(1.2)).exp()
        } else {
            1.0
        }
    }

    /// Total heat delivered to `target` from burning `sources`
    ///
    /// Radiative `T / d^2` per source, boosted when the target sits uphill
    /// of the source (convection) and when the wind blows from source
    /// toward target. Sources beyond `heat_transfer_radius` contribute
    /// nothing.
    pub fn heat_input<'a>(
        &self,
        target: &Cell,
        sources: impl Iterator<Item = &'a Cell>,
        wind: &Wind,
    ) -> f64 {
        let wind_vec = wind.vector();
        let mut total = 0.0;

        for source in sources {
            if !source.is_burning() {
                continue;
            }
            let dx = target.x as f64 - source.x as f64;
            let dy = target.y as f64 - source.y as f64;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance <= 0.0 || distance > self.heat_transfer_radius {
                continue;
            }

            let mut heat = source.temperature.max(0.0) / (distance * distance);

            // Convective enhancement when the target sits uphill
            let rise = target.elevation - source.elevation;
            if rise > 0.0 {
                heat *= 1.0 + self.convection_enhancement * rise.abs() / distance;
            }

            // Wind pushes heat downwind
            let displacement = Vector2::new(dx, dy);
            if wind_vec.dot(&displacement) > 0.0 {
                heat *= 1.0 + 0.2 * wind.speed;
            }

            total += heat;
        }

        total
    }

    /// Moisture change over `dt` from evaporation and precipitation
    ///
    /// `dM/dt = -evaporation * T * (1 - humidity) + precipitation_rate * P`,
    /// integrated explicitly. The caller clamps the resulting moisture.
    pub fn moisture_delta(
        &self,
        temperature: f64,
        humidity: f64,
        precipitation: f64,
        dt: f64,
    ) -> f64 {
        let evaporation = -self.evaporation_rate * temperature.max(0.0) * (1.0 - humidity);
        let recharge = self.precipitation_rate * precipitation;
        (evaporation + recharge) * dt
    }

    /// Local fire spread rate in cells per time unit
    ///
    /// Base rate by vegetation class, damped by moisture, boosted by
    /// temperature, wind, and upslope terrain.
    pub fn spread_rate(&self, cell: &Cell, slope: f64, climate: &Climate) -> f64 {
        let base = cell.vegetation.base_spread_rate();
        if base <= 0.0 {
            return 0.0;
        }

        let moisture_term = 1.0 - cell.moisture;
        let temperature_term = 0.5
            + logistic((cell.temperature - self.temperature_critical) / self.temperature_scale);
        let wind_term = (self.wind_factor * climate.wind.speed).exp();
        let slope_term = self.slope_multiplier(slope);

        base * moisture_term * temperature_term * wind_term * slope_term
    }

    /// Whether a burning cell has exhausted its fuel
    ///
    /// Hotter fires consume fuel faster; the consumption clock is the time
    /// spent burning scaled by a temperature-dependent burn rate.
    pub fn fuel_depleted(&self, cell: &Cell) -> bool {
        let burn_acceleration = 1.0 + ((cell.temperature - 20.0) / 100.0).max(0.0);
        cell.burn_duration * 1.5 * burn_acceleration >= cell.vegetation.fuel_content()
    }

    /// Probability that a burning cell extinguishes this step
    pub fn extinction_probability(&self, cell: &Cell, climate: &Climate) -> f64 {
        let cold_term = if cell.temperature < 10.0 {
            0.3 * (10.0 - cell.temperature) / 10.0
        } else {
            0.0
        };
        let p = cell.moisture * 0.5
            + cold_term
            + climate.precipitation * 0.8
            + climate.humidity * 0.2;
        clamp_probability(p)
    }
}

/// Clamp a probability to [0, 1], mapping NaN to 0
#[inline]
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellState, VegetationType};
    use crate::climate::Season;
    use approx::assert_relative_eq;

    fn tree_cell(moisture: f64, temperature: f64) -> Cell {
        Cell::new(5, 5, CellState::Tree, 500.0, VegetationType::SparseForest, moisture, temperature)
    }

    fn summer() -> Climate {
        Climate::seasonal(Season::Summer)
    }

    #[test]
    fn test_ignition_probability_in_unit_range() {
        let physics = FirePhysics::default();
        let climate = Climate::drought(30.0);
        let cell = tree_cell(0.0, 400.0);
        let p = physics.ignition_probability(&cell, 8, 1.2, &climate);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_more_burning_neighbors_raise_probability() {
        let physics = FirePhysics::default();
        let climate = summer();
        let cell = tree_cell(0.2, 30.0);
        let p1 = physics.ignition_probability(&cell, 1, 0.0, &climate);
        let p3 = physics.ignition_probability(&cell, 3, 0.0, &climate);
        assert!(p3 > p1);
    }

    #[test]
    fn test_moisture_damps_ignition() {
        let physics = FirePhysics::default();
        let climate = summer();
        let dry = physics.ignition_probability(&tree_cell(0.05, 30.0), 2, 0.0, &climate);
        let wet = physics.ignition_probability(&tree_cell(0.95, 30.0), 2, 0.0, &climate);
        assert!(dry > wet);
    }

    #[test]
    fn test_water_cell_never_ignites() {
        let physics = FirePhysics::default();
        let climate = Climate::drought(30.0);
        let mut cell = tree_cell(0.0, 500.0);
        cell.vegetation = VegetationType::Water;
        assert_eq!(physics.ignition_probability(&cell, 8, 1.0, &climate), 0.0);
    }

    #[test]
    fn test_heat_input_falls_with_distance() {
        let physics = FirePhysics::default();
        let target = tree_cell(0.2, 20.0);
        let near = Cell::new(6, 5, CellState::Burning, 500.0, VegetationType::SparseForest, 0.0, 600.0);
        let far = Cell::new(7, 5, CellState::Burning, 500.0, VegetationType::SparseForest, 0.0, 600.0);

        let h_near = physics.heat_input(&target, std::iter::once(&near), &Wind::calm());
        let h_far = physics.heat_input(&target, std::iter::once(&far), &Wind::calm());
        assert!(h_near > h_far);
        assert_relative_eq!(h_near, 600.0);
        assert_relative_eq!(h_far, 150.0);
    }

    #[test]
    fn test_heat_input_respects_radius() {
        let physics = FirePhysics::default();
        let target = tree_cell(0.2, 20.0);
        let distant = Cell::new(9, 5, CellState::Burning, 500.0, VegetationType::SparseForest, 0.0, 600.0);
        assert_eq!(physics.heat_input(&target, std::iter::once(&distant), &Wind::calm()), 0.0);
    }

    #[test]
    fn test_uphill_target_receives_more_heat() {
        let physics = FirePhysics::default();
        let mut uphill = tree_cell(0.2, 20.0);
        uphill.elevation = 520.0;
        let flat = tree_cell(0.2, 20.0);
        let source = Cell::new(6, 5, CellState::Burning, 500.0, VegetationType::SparseForest, 0.0, 600.0);

        let h_up = physics.heat_input(&uphill, std::iter::once(&source), &Wind::calm());
        let h_flat = physics.heat_input(&flat, std::iter::once(&source), &Wind::calm());
        assert!(h_up > h_flat);
    }

    #[test]
    fn test_downwind_target_receives_more_heat() {
        let physics = FirePhysics::default();
        let target = tree_cell(0.2, 20.0);
        let source = Cell::new(4, 5, CellState::Burning, 500.0, VegetationType::SparseForest, 0.0, 600.0);
        // Wind blowing east, source west of target: aligned
        let windy = Wind::new(0.0, 10.0);
        let h_wind = physics.heat_input(&target, std::iter::once(&source), &windy);
        let h_calm = physics.heat_input(&target, std::iter::once(&source), &Wind::calm());
        assert_relative_eq!(h_wind, h_calm * 3.0);
    }

    #[test]
    fn test_moisture_delta_signs() {
        let physics = FirePhysics::default();
        // Hot and dry: net drying
        assert!(physics.moisture_delta(35.0, 0.2, 0.0, 1.0) < 0.0);
        // Raining: net recharge
        assert!(physics.moisture_delta(10.0, 0.8, 5.0, 1.0) > 0.0);
    }

    #[test]
    fn test_fuel_depletion_faster_when_hot() {
        let physics = FirePhysics::default();
        let mut cool = tree_cell(0.1, 50.0).with_state(CellState::Burning);
        let mut hot = tree_cell(0.1, 800.0).with_state(CellState::Burning);
        cool.vegetation = VegetationType::Grassland;
        hot.vegetation = VegetationType::Grassland;
        cool.burn_duration = 10.0;
        hot.burn_duration = 10.0;
        assert!(physics.fuel_depleted(&hot));
        assert!(!physics.fuel_depleted(&cool));
    }

    #[test]
    fn test_extinction_probability_clamped() {
        let physics = FirePhysics::default();
        let climate = Climate::new(Season::Autumn, Wind::calm(), 1.0, 10.0).unwrap();
        let cell = tree_cell(1.0, -5.0).with_state(CellState::Burning);
        let p = physics.extinction_probability(&cell, &climate);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn test_spread_rate_zero_on_water() {
        let physics = FirePhysics::default();
        let mut cell = tree_cell(0.1, 35.0);
        cell.vegetation = VegetationType::Water;
        assert_eq!(physics.spread_rate(&cell, 0.0, &summer()), 0.0);
    }

    #[test]
    fn test_logistic_midpoint() {
        assert_relative_eq!(logistic(0.0), 0.5);
        assert!(logistic(10.0) > 0.99);
        assert!(logistic(-10.0) < 0.01);
    }
}
