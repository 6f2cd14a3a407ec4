//! Recovery-phase rules, applied to `Empty` and `Burnt` cells

use super::RuleContext;
use crate::cell::{Cell, CellState};
use crate::climate::Season;
use crate::physics::clamp_probability;
use crate::terrain::Terrain;
use rand::rngs::SmallRng;
use rand::Rng;

/// Rate at which ground moisture relaxes toward ambient humidity
const MOISTURE_RELAXATION: f64 = 0.1;

fn regrow(cell: Cell, ctx: &RuleContext<'_>) -> Cell {
    let vegetation = Terrain::vegetation_from_elevation(cell.elevation);
    let mut grown = cell.with_state(CellState::Tree);
    grown.vegetation = vegetation;
    grown.moisture = ctx.climate.humidity;
    grown.temperature = ctx.climate.temperature_at_elevation(cell.elevation);
    grown
}

pub(super) fn moisture_recovery_applicable(cell: &Cell, ctx: &RuleContext<'_>) -> bool {
    matches!(cell.state, CellState::Empty | CellState::Burnt)
        && cell.moisture < ctx.climate.humidity
}

/// Ground moisture drifts back toward ambient humidity
pub(super) fn recover_moisture(cell: Cell, ctx: &RuleContext<'_>) -> Cell {
    let rate = (MOISTURE_RELAXATION * ctx.dt).min(1.0);
    let moisture = cell.moisture + (ctx.climate.humidity - cell.moisture) * rate;
    cell.with_moisture(moisture)
}

/// Burnt ground clears to bare soil before anything can grow on it
pub(super) fn vegetation_succession(
    cell: Cell,
    rate: f64,
    ctx: &RuleContext<'_>,
    rng: &mut SmallRng,
) -> Cell {
    let p = clamp_probability(rate * ctx.dt);
    if rng.random::<f64>() < p {
        cell.with_state(CellState::Empty)
    } else {
        cell
    }
}

/// Baseline probabilistic regrowth, dampened on dry ground
pub(super) fn natural_regrowth(
    cell: Cell,
    rate: f64,
    ctx: &RuleContext<'_>,
    rng: &mut SmallRng,
) -> Cell {
    if cell.state != CellState::Empty || !cell.vegetation.is_burnable() {
        return cell;
    }
    let p = clamp_probability(rate * (0.5 + 0.5 * cell.moisture) * ctx.dt);
    if rng.random::<f64>() < p {
        regrow(cell, ctx)
    } else {
        cell
    }
}

/// Season-modulated regrowth: vigorous in spring, dormant in winter
pub(super) fn seasonal_growth(
    cell: Cell,
    rate: f64,
    ctx: &RuleContext<'_>,
    rng: &mut SmallRng,
) -> Cell {
    if cell.state != CellState::Empty {
        return cell;
    }
    if !cell.vegetation.is_burnable() {
        return cell;
    }
    let season_factor = match ctx.climate.season {
        Season::Spring => 2.0,
        Season::Summer => 1.0,
        Season::Autumn => 0.8,
        Season::Winter => 0.1,
    };
    let p = clamp_probability(rate * season_factor * ctx.dt);
    if rng.random::<f64>() < p {
        regrow(cell, ctx)
    } else {
        cell
    }
}

/// Wind-assisted seed transport from neighboring trees
pub(super) fn seed_dispersion(
    cell: Cell,
    rate: f64,
    neighbors: &[Cell],
    ctx: &RuleContext<'_>,
    rng: &mut SmallRng,
) -> Cell {
    if cell.state != CellState::Empty || !cell.vegetation.is_burnable() {
        return cell;
    }
    let tree_neighbors = neighbors
        .iter()
        .filter(|n| n.state == CellState::Tree)
        .count();
    if tree_neighbors == 0 {
        return cell;
    }
    let wind_assist = 1.0 + 0.1 * ctx.climate.wind.speed;
    let p = clamp_probability(rate * tree_neighbors as f64 / 8.0 * wind_assist * ctx.dt);
    if rng.random::<f64>() < p {
        regrow(cell, ctx)
    } else {
        cell
    }
}
