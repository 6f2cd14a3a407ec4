//! Curve extraction from sweep results
//!
//! Bridges the ensemble layer and the critical-point estimators: sweeps
//! produce `ParameterPoint` sequences, estimators consume plain
//! `(parameter value, observable)` curves.

use crate::critical::binder_cumulant;
use crate::sweep::ParameterPoint;

/// Ensemble-mean curve of one observable across a sweep
pub fn order_parameter_curve(points: &[ParameterPoint], observable: &str) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter_map(|point| {
            point
                .ensemble
                .mean
                .get(observable)
                .map(|&value| (point.value, value))
        })
        .collect()
}

/// Susceptibility curve: cross-member variance scaled by system size
///
/// The variance of the observable across ensemble members plays the
/// susceptibility role; `system_size` is the cell count of the swept
/// grids.
pub fn susceptibility_curve(
    points: &[ParameterPoint],
    observable: &str,
    system_size: usize,
) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter_map(|point| {
            point.ensemble.std_dev.get(observable).map(|&sd| {
                (point.value, sd * sd * system_size as f64)
            })
        })
        .collect()
}

/// Per-size Binder-cumulant curves from per-size sweeps
///
/// For every system size, computes `U = 1 - <m^4>/(3 <m^2>^2)` at each
/// sweep point from the successful members' final order parameters.
pub fn binder_curves(
    per_size: &[(usize, Vec<ParameterPoint>)],
    observable: &str,
) -> Vec<(usize, Vec<(f64, f64)>)> {
    per_size
        .iter()
        .map(|(size, points)| {
            let curve = points
                .iter()
                .map(|point| {
                    let samples: Vec<f64> = point
                        .ensemble
                        .successes()
                        .flat_map(|run| {
                            run.order_parameters
                                .as_pairs()
                                .into_iter()
                                .filter(|(name, _)| *name == observable)
                                .map(|(_, value)| value)
                        })
                        .collect();
                    (point.value, binder_cumulant(&samples))
                })
                .collect();
            (*size, curve)
        })
        .collect()
}

/// Per-size mean order-parameter curves, the data-collapse input
pub fn per_size_curves(
    per_size: &[(usize, Vec<ParameterPoint>)],
    observable: &str,
) -> Vec<(usize, Vec<(f64, f64)>)> {
    per_size
        .iter()
        .map(|(size, points)| (*size, order_parameter_curve(points, observable)))
        .collect()
}
