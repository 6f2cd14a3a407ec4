//! Burning-phase rules, applied to `Burning` cells

use super::RuleContext;
use crate::cell::Cell;

/// Nominal flame temperature before fuel and oxygen modifiers (°C)
const BASE_FLAME_TEMPERATURE: f64 = 600.0;

/// Hard ceiling on cell temperature (°C)
const MAX_FLAME_TEMPERATURE: f64 = 800.0;

/// Relaxation rate toward the target flame temperature (per time unit)
const INTENSITY_RELAXATION: f64 = 0.1;

/// Minimum self-sustained temperature of an actively burning cell (°C)
const SUSTAINED_FLOOR: f64 = 200.0;

/// Moisture level a fully burnt-out fuel bed tends toward
const CHAR_MOISTURE: f64 = 0.95;

/// Relax the flame temperature toward its fuel- and oxygen-limited target
pub(super) fn evolve_intensity(cell: Cell, ctx: &RuleContext<'_>) -> Cell {
    let fuel_term = cell.vegetation.ignition_factor().max(0.1);
    let oxygen_term = ctx.climate.oxygen_factor_at_elevation(cell.elevation);
    let moisture_term = 1.0 - 0.5 * cell.moisture;

    let target = (BASE_FLAME_TEMPERATURE * fuel_term * oxygen_term * moisture_term)
        .min(MAX_FLAME_TEMPERATURE);
    let rate = (INTENSITY_RELAXATION * ctx.dt).min(1.0);
    let temperature = cell.temperature + (target - cell.temperature) * rate;

    cell.with_temperature(temperature)
}

/// Advance the fuel bed toward char: moisture climbs toward 0.95 as the
/// burnable mass disappears
pub(super) fn consume_fuel(cell: Cell, ctx: &RuleContext<'_>) -> Cell {
    let fuel = cell.vegetation.fuel_content();
    if fuel <= 0.0 {
        return cell;
    }
    let burn_acceleration = 1.0 + ((cell.temperature - 20.0) / 100.0).max(0.0);
    let burned_fraction = (cell.burn_duration * 1.5 * burn_acceleration / fuel).min(1.0);

    let rate = (burned_fraction * INTENSITY_RELAXATION * ctx.dt).min(1.0);
    let moisture = cell.moisture + (CHAR_MOISTURE - cell.moisture) * rate;
    cell.with_moisture(moisture)
}

/// Keep an actively burning cell above its self-sustained temperature floor
pub(super) fn sustain_heat(cell: Cell, _ctx: &RuleContext<'_>) -> Cell {
    let floor = SUSTAINED_FLOOR * (1.0 - 0.5 * cell.moisture);
    if cell.temperature < floor {
        cell.with_temperature(floor)
    } else {
        cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellState, VegetationType};
    use crate::climate::{Climate, Season};
    use crate::config::RuleConfig;
    use crate::grid::Grid;
    use crate::physics::FirePhysics;
    use crate::terrain::Terrain;

    fn burning_cell(temperature: f64) -> Cell {
        Cell::new(2, 2, CellState::Tree, 500.0, VegetationType::DenseForest, 0.1, temperature)
            .with_state(CellState::Burning)
    }

    struct Fixture {
        grid: Grid,
        terrain: Terrain,
        climate: Climate,
        physics: FirePhysics,
        config: RuleConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                grid: Grid::new(5, 5, |x, y| {
                    Cell::new(x, y, CellState::Tree, 500.0, VegetationType::DenseForest, 0.1, 20.0)
                }),
                terrain: Terrain::flat(5, 5, 500.0),
                climate: Climate::seasonal(Season::Summer),
                physics: FirePhysics::default(),
                config: RuleConfig::default(),
            }
        }

        fn ctx(&self, dt: f64) -> RuleContext<'_> {
            RuleContext {
                grid: &self.grid,
                terrain: &self.terrain,
                climate: &self.climate,
                physics: &self.physics,
                config: &self.config,
                dt,
            }
        }
    }

    #[test]
    fn test_intensity_rises_toward_target() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx(1.0);
        let cell = burning_cell(300.0);
        let evolved = evolve_intensity(cell, &ctx);
        assert!(evolved.temperature > 300.0);
        assert!(evolved.temperature <= 800.0);
    }

    #[test]
    fn test_intensity_never_exceeds_cap() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx(10.0);
        let mut cell = burning_cell(795.0);
        for _ in 0..50 {
            cell = evolve_intensity(cell, &ctx);
            assert!(cell.temperature <= 800.0 + 1e-9);
        }
    }

    #[test]
    fn test_fuel_consumption_raises_moisture() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx(1.0);
        let mut cell = burning_cell(600.0);
        cell.burn_duration = 8.0;
        let consumed = consume_fuel(cell, &ctx);
        assert!(consumed.moisture > cell.moisture);
        assert!(consumed.moisture <= 0.95);
    }

    #[test]
    fn test_fresh_fire_consumes_nothing_yet() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx(1.0);
        let cell = burning_cell(600.0);
        assert_eq!(consume_fuel(cell, &ctx).moisture, cell.moisture);
    }

    #[test]
    fn test_sustained_floor_applies() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx(1.0);
        let cold = burning_cell(50.0);
        let sustained = sustain_heat(cold, &ctx);
        assert!(sustained.temperature >= 150.0);
        let hot = burning_cell(700.0);
        assert_eq!(sustain_heat(hot, &ctx).temperature, 700.0);
    }
}
