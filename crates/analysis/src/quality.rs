//! Data-quality diagnostics
//!
//! Equilibration and finite-size checks for measurement campaigns. Like
//! the statistical helpers these are pure functions; they flag problems,
//! they never abort an analysis.

use crate::stats::linear_regression;
use serde::{Deserialize, Serialize};

/// Drift threshold on the time-series slope
const DRIFT_SLOPE: f64 = 0.001;

/// Drift is only trusted when the linear fit explains the series
const DRIFT_R_SQUARED: f64 = 0.5;

/// Minimum effective (decorrelated) sample count
const MIN_EFFECTIVE_SAMPLES: f64 = 20.0;

/// Integrated autocorrelation time of a series
///
/// `tau = 1 + 2 sum rho(k)`, summed with an automatic window that stops
/// at the first non-positive autocorrelation. Never below 1.
pub fn autocorrelation_time(series: &[f64]) -> f64 {
    let n = series.len();
    if n < 2 {
        return 1.0;
    }
    let n_f = n as f64;
    let mean = series.iter().sum::<f64>() / n_f;
    let variance = series.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n_f;
    if variance <= 0.0 {
        return 1.0;
    }

    let mut tau = 1.0;
    for lag in 1..n / 2 {
        let mut covariance = 0.0;
        for i in 0..n - lag {
            covariance += (series[i] - mean) * (series[i + lag] - mean);
        }
        covariance /= (n - lag) as f64;
        let rho = covariance / variance;
        if rho <= 0.0 {
            break;
        }
        tau += 2.0 * rho;
    }
    tau.max(1.0)
}

/// Equilibration diagnostics of a measurement series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibrationReport {
    /// Slope of the series against its sample index
    pub slope: f64,
    pub r_squared: f64,
    /// Systematic trend detected: the series has not equilibrated
    pub drift_detected: bool,
    pub autocorrelation_time: f64,
    /// Decorrelated sample count `n / tau`
    pub effective_samples: f64,
    pub sufficient_samples: bool,
}

/// Assess whether a measurement series is equilibrated and long enough
pub fn equilibration_report(series: &[f64]) -> EquilibrationReport {
    let index: Vec<f64> = (0..series.len()).map(|i| i as f64).collect();
    let fit = linear_regression(&index, series);
    let drift_detected = fit.slope.abs() > DRIFT_SLOPE && fit.r_squared > DRIFT_R_SQUARED;

    let tau = autocorrelation_time(series);
    let effective_samples = series.len() as f64 / tau;

    EquilibrationReport {
        slope: fit.slope,
        r_squared: fit.r_squared,
        drift_detected,
        autocorrelation_time: tau,
        effective_samples,
        sufficient_samples: effective_samples >= MIN_EFFECTIVE_SAMPLES,
    }
}

/// Finite-size diagnostics across system sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiniteSizeReport {
    /// `(linear size, correlation length / linear size)` per system
    pub saturation_ratios: Vec<(usize, f64)>,
    /// A correlation length reached half its box: results are
    /// size-limited and larger systems are needed
    pub size_limited: bool,
}

/// Compare measured correlation lengths against their system sizes
pub fn finite_size_report(measurements: &[(usize, f64)]) -> FiniteSizeReport {
    let saturation_ratios: Vec<(usize, f64)> = measurements
        .iter()
        .map(|&(size, xi)| {
            let ratio = if size > 0 { xi / size as f64 } else { 0.0 };
            (size, ratio)
        })
        .collect();
    let size_limited = saturation_ratios.iter().any(|&(_, ratio)| ratio >= 0.5);
    FiniteSizeReport {
        saturation_ratios,
        size_limited,
    }
}
