//! Extinction-phase rules, moving `Burning` cells to `Burnt`

use super::RuleContext;
use crate::cell::{Cell, CellState};
use crate::event::FireEventKind;
use crate::physics::clamp_probability;
use rand::rngs::SmallRng;
use rand::Rng;

/// Below this temperature a flame can no longer sustain itself (°C)
const EXTINCTION_TEMPERATURE: f64 = 150.0;

/// Moisture above which suppression becomes likely
const SUPPRESSION_MOISTURE: f64 = 0.75;

/// Per-time-unit extinction rate for a fire with nothing left to spread to
const ISOLATION_RATE: f64 = 0.5;

fn extinguish(cell: Cell, kind: FireEventKind) -> (Cell, Option<FireEventKind>) {
    (cell.with_state(CellState::Burnt), Some(kind))
}

/// Burn out when the fuel bed is exhausted
pub(super) fn fuel_depletion(cell: Cell, ctx: &RuleContext<'_>) -> (Cell, Option<FireEventKind>) {
    if ctx.physics.fuel_depleted(&cell) {
        extinguish(cell, FireEventKind::Burnout)
    } else {
        (cell, None)
    }
}

/// Die of cold: a flame below the sustaining temperature goes out
pub(super) fn temperature_decay(
    cell: Cell,
    _ctx: &RuleContext<'_>,
) -> (Cell, Option<FireEventKind>) {
    if cell.temperature < EXTINCTION_TEMPERATURE {
        extinguish(cell, FireEventKind::Extinction)
    } else {
        (cell, None)
    }
}

/// Wet fuel smothers the fire
pub(super) fn moisture_suppression(
    cell: Cell,
    ctx: &RuleContext<'_>,
    rng: &mut SmallRng,
) -> (Cell, Option<FireEventKind>) {
    if cell.moisture <= SUPPRESSION_MOISTURE {
        return (cell, None);
    }
    let p = clamp_probability((cell.moisture - SUPPRESSION_MOISTURE) * 2.0 * ctx.dt);
    if rng.random::<f64>() < p {
        extinguish(cell, FireEventKind::Extinction)
    } else {
        (cell, None)
    }
}

/// A fire with no live fuel and no companion fires around it gutters out
pub(super) fn neighbor_isolation(
    cell: Cell,
    neighbors: &[Cell],
    ctx: &RuleContext<'_>,
    rng: &mut SmallRng,
) -> (Cell, Option<FireEventKind>) {
    let sustaining = neighbors
        .iter()
        .any(|n| n.is_burnable() || n.is_burning());
    if sustaining {
        return (cell, None);
    }
    let p = clamp_probability(ISOLATION_RATE * ctx.dt);
    if rng.random::<f64>() < p {
        extinguish(cell, FireEventKind::Extinction)
    } else {
        (cell, None)
    }
}

/// The combined weather-driven extinction draw
pub(super) fn combined_extinction(
    cell: Cell,
    ctx: &RuleContext<'_>,
    rng: &mut SmallRng,
) -> (Cell, Option<FireEventKind>) {
    let p = ctx.physics.extinction_probability(&cell, ctx.climate);
    let p_step = clamp_probability(p * ctx.dt);
    if rng.random::<f64>() < p_step {
        extinguish(cell, FireEventKind::Extinction)
    } else {
        (cell, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::VegetationType;
    use crate::climate::{Climate, Season};
    use crate::config::RuleConfig;
    use crate::grid::Grid;
    use crate::physics::FirePhysics;
    use crate::rng::cell_rng;
    use crate::terrain::Terrain;

    fn burning(moisture: f64, temperature: f64) -> Cell {
        Cell::new(2, 2, CellState::Tree, 500.0, VegetationType::Grassland, moisture, temperature)
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
                    Cell::new(x, y, CellState::Empty, 500.0, VegetationType::Grassland, 0.3, 20.0)
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
    fn test_fuel_depletion_emits_burnout() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx(1.0);
        let mut cell = burning(0.1, 600.0);
        cell.burn_duration = 100.0;
        let (out, event) = fuel_depletion(cell, &ctx);
        assert_eq!(out.state, CellState::Burnt);
        assert_eq!(event, Some(FireEventKind::Burnout));
    }

    #[test]
    fn test_cold_flame_goes_out() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx(1.0);
        let (out, event) = temperature_decay(burning(0.1, 80.0), &ctx);
        assert_eq!(out.state, CellState::Burnt);
        assert_eq!(event, Some(FireEventKind::Extinction));
        let (still, _) = temperature_decay(burning(0.1, 400.0), &ctx);
        assert_eq!(still.state, CellState::Burning);
    }

    #[test]
    fn test_dry_fire_not_suppressed() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx(1.0);
        let mut rng = cell_rng(0, 0, 2, 2);
        let (out, _) = moisture_suppression(burning(0.3, 500.0), &ctx, &mut rng);
        assert_eq!(out.state, CellState::Burning);
    }

    #[test]
    fn test_saturated_fire_suppressed() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx(2.0);
        // (1.0 - 0.75) * 2 * dt=2 -> certain
        let mut rng = cell_rng(0, 0, 2, 2);
        let (out, event) = moisture_suppression(burning(1.0, 500.0), &ctx, &mut rng);
        assert_eq!(out.state, CellState::Burnt);
        assert_eq!(event, Some(FireEventKind::Extinction));
    }

    #[test]
    fn test_isolated_fire_eventually_dies() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx(2.0);
        // Empty neighbors, dt=2 makes the isolation draw certain
        let neighbors: Vec<Cell> = fixture.grid.moore_neighbors(2, 2).copied().collect();
        let mut rng = cell_rng(0, 0, 2, 2);
        let (out, _) = neighbor_isolation(burning(0.1, 500.0), &neighbors, &ctx, &mut rng);
        assert_eq!(out.state, CellState::Burnt);
    }

    #[test]
    fn test_surrounded_fire_not_isolated() {
        let mut fixture = Fixture::new();
        let tree = Cell::new(1, 2, CellState::Tree, 500.0, VegetationType::Grassland, 0.3, 20.0);
        fixture.grid.set(1, 2, tree);
        let ctx = fixture.ctx(2.0);
        let neighbors: Vec<Cell> = fixture.grid.moore_neighbors(2, 2).copied().collect();
        let mut rng = cell_rng(0, 0, 2, 2);
        let (out, _) = neighbor_isolation(burning(0.1, 500.0), &neighbors, &ctx, &mut rng);
        assert_eq!(out.state, CellState::Burning);
    }
}
