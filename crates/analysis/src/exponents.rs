//! Critical-exponent extraction
//!
//! Log-log regression on windows close to, but excluding, the critical
//! point. Degenerate inputs never panic: estimators fall back to the 2D
//! isotropic percolation values with zero confidence.

use crate::stats::{linear_regression, LinearFit};
use serde::{Deserialize, Serialize};

/// 2D isotropic percolation defaults, used when extraction degenerates
pub const DEFAULT_BETA: f64 = 0.139;
pub const DEFAULT_GAMMA: f64 = 2.389;
pub const DEFAULT_NU: f64 = 1.333;
pub const DEFAULT_TAU: f64 = 2.055;

/// Relative half-width of the fitting window around the critical point
const DEFAULT_WINDOW: f64 = 0.1;

/// Result of one exponent extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExponentEstimate {
    /// A usable fit
    Fitted { value: f64, r_squared: f64 },
    /// Too few points or degenerate values; carries the class default
    InsufficientData { default: f64 },
}

impl ExponentEstimate {
    pub fn value(&self) -> f64 {
        match self {
            ExponentEstimate::Fitted { value, .. } => *value,
            ExponentEstimate::InsufficientData { default } => *default,
        }
    }

    /// Fit quality in [0, 1]; zero for insufficient data
    pub fn confidence(&self) -> f64 {
        match self {
            ExponentEstimate::Fitted { r_squared, .. } => r_squared.clamp(0.0, 1.0),
            ExponentEstimate::InsufficientData { .. } => 0.0,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, ExponentEstimate::InsufficientData { .. })
    }
}

/// Log-log fit over `(|t|, value)` pairs; `None` when fewer than two
/// usable points survive the finiteness filter
fn log_log_fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    let mut ln_t = Vec::with_capacity(points.len());
    let mut ln_v = Vec::with_capacity(points.len());
    for &(t, v) in points {
        if t > 0.0 && v > 0.0 && t.is_finite() && v.is_finite() {
            ln_t.push(t.ln());
            ln_v.push(v.ln());
        }
    }
    if ln_t.len() < 2 {
        return None;
    }
    let fit = linear_regression(&ln_t, &ln_v);
    if fit.r_squared == 0.0 && fit.slope == 0.0 {
        return None;
    }
    Some(fit)
}

/// Order-parameter exponent: `m ~ (p - pc)^beta` above the critical point
pub fn extract_beta(curve: &[(f64, f64)], pc: f64) -> ExponentEstimate {
    let window: Vec<(f64, f64)> = curve
        .iter()
        .filter_map(|&(p, m)| {
            let t = p - pc;
            (t > 0.0 && t <= DEFAULT_WINDOW).then_some((t, m))
        })
        .collect();
    match log_log_fit(&window) {
        Some(fit) => ExponentEstimate::Fitted {
            value: fit.slope,
            r_squared: fit.r_squared,
        },
        None => ExponentEstimate::InsufficientData {
            default: DEFAULT_BETA,
        },
    }
}

/// Susceptibility exponent: `chi ~ |p - pc|^(-gamma)` on both sides
pub fn extract_gamma(curve: &[(f64, f64)], pc: f64) -> ExponentEstimate {
    divergence_exponent(curve, pc, DEFAULT_GAMMA)
}

/// Correlation-length exponent: `xi ~ |p - pc|^(-nu)`
pub fn extract_nu(curve: &[(f64, f64)], pc: f64) -> ExponentEstimate {
    divergence_exponent(curve, pc, DEFAULT_NU)
}

fn divergence_exponent(curve: &[(f64, f64)], pc: f64, default: f64) -> ExponentEstimate {
    let window: Vec<(f64, f64)> = curve
        .iter()
        .filter_map(|&(p, v)| {
            let t = (p - pc).abs();
            (t > 0.0 && t <= DEFAULT_WINDOW).then_some((t, v))
        })
        .collect();
    match log_log_fit(&window) {
        Some(fit) => ExponentEstimate::Fitted {
            value: -fit.slope,
            r_squared: fit.r_squared,
        },
        None => ExponentEstimate::InsufficientData { default },
    }
}

/// Cluster-size exponent: `n(s) ~ s^(-tau)` from a size histogram
///
/// Takes `(size, count)` pairs, typically binned from the per-step
/// cluster size distribution.
pub fn extract_tau(histogram: &[(f64, f64)]) -> ExponentEstimate {
    match log_log_fit(histogram) {
        Some(fit) => ExponentEstimate::Fitted {
            value: -fit.slope,
            r_squared: fit.r_squared,
        },
        None => ExponentEstimate::InsufficientData {
            default: DEFAULT_TAU,
        },
    }
}

/// Histogram of cluster sizes suitable for `extract_tau`
pub fn cluster_size_histogram(sizes: &[usize]) -> Vec<(f64, f64)> {
    use std::collections::BTreeMap;
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for &s in sizes {
        if s > 0 {
            *counts.entry(s).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(s, c)| (s as f64, c as f64))
        .collect()
}

/// The full exponent set of a universality class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalExponents {
    pub beta: f64,
    pub gamma: f64,
    pub nu: f64,
    pub alpha: f64,
    pub delta: f64,
    pub eta: f64,
}

impl CriticalExponents {
    /// Complete the set from the three independently measured exponents
    ///
    /// Uses the scaling laws in two dimensions: Rushbrooke for `alpha`,
    /// Widom for `delta`, Fisher for `eta`.
    pub fn from_measured(beta: f64, gamma: f64, nu: f64) -> Self {
        let alpha = 2.0 - 2.0 * beta - gamma;
        let delta = if beta.abs() > f64::EPSILON {
            1.0 + gamma / beta
        } else {
            0.0
        };
        let eta = if nu.abs() > f64::EPSILON {
            2.0 - gamma / nu
        } else {
            0.0
        };
        CriticalExponents {
            beta,
            gamma,
            nu,
            alpha,
            delta,
            eta,
        }
    }
}
