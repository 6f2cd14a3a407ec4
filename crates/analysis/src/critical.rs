//! Critical-point estimation
//!
//! Four independent estimators over order-parameter data: interval
//! bisection, susceptibility-peak location, Binder-cumulant crossings,
//! and finite-size data collapse. Each returns a `CriticalPoint` with a
//! method-specific confidence; none of them panic on degenerate input.

use crate::curves::{binder_curves, order_parameter_curve, per_size_curves, susceptibility_curve};
use crate::stats::{mean, std_dev};
use crate::sweep::{Parameter, ParameterPoint};
use serde::{Deserialize, Serialize};

/// Which estimator produced a critical point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriticalPointMethod {
    Bisection,
    SusceptibilityPeak,
    BinderCrossing,
    DataCollapse,
}

/// An estimated critical point
///
/// Serializes for downstream reporting; the observable name is a static
/// label, so this is a write-only surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriticalPoint {
    pub parameter: Parameter,
    pub value: f64,
    /// Estimator-specific quality in [0, 1]
    pub confidence: f64,
    pub method: CriticalPointMethod,
    pub order_parameter: &'static str,
}

/// Maximum bisection depth
const BISECTION_DEPTH: usize = 20;

/// Estimator selection for a measurement campaign
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimatorConfig {
    pub method: CriticalPointMethod,
    /// Name of the observable the estimate is based on
    pub order_parameter: &'static str,
    /// Order-parameter exponent assumed by the data collapse
    pub beta: f64,
    /// Correlation-length exponent assumed by the data collapse
    pub nu: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            method: CriticalPointMethod::SusceptibilityPeak,
            order_parameter: "burnt_fraction",
            beta: crate::exponents::DEFAULT_BETA,
            nu: crate::exponents::DEFAULT_NU,
        }
    }
}

/// Run the configured estimator over per-size sweep results
///
/// `sweeps` pairs each linear system size `L` with its parameter sweep;
/// single-curve methods (bisection, susceptibility peak) use the largest
/// size, the finite-size methods use all of them. Returns `None` when
/// the data cannot support the chosen method.
pub fn estimate_critical_point(
    config: &EstimatorConfig,
    parameter: Parameter,
    sweeps: &[(usize, Vec<ParameterPoint>)],
) -> Option<CriticalPoint> {
    let largest = sweeps.iter().max_by_key(|(size, _)| *size)?;
    let observable = config.order_parameter;

    match config.method {
        CriticalPointMethod::Bisection => {
            let curve = order_parameter_curve(&largest.1, observable);
            if curve.len() < 2 {
                return None;
            }
            let lo = curve.first()?.0;
            let hi = curve.last()?.0;
            let values: Vec<f64> = curve.iter().map(|&(_, m)| m).collect();
            let min = values.iter().copied().fold(f64::MAX, f64::min);
            let max = values.iter().copied().fold(f64::MIN, f64::max);
            let threshold = 0.5 * (min + max);
            let tolerance = (hi - lo) / 1e4;
            bisection(
                parameter,
                observable,
                |p| interpolate(&curve, p),
                lo,
                hi,
                threshold,
                tolerance,
            )
        }
        CriticalPointMethod::SusceptibilityPeak => {
            let system_size = largest.0 * largest.0;
            let chi = susceptibility_curve(&largest.1, observable, system_size);
            susceptibility_peak(parameter, observable, &chi)
        }
        CriticalPointMethod::BinderCrossing => {
            let curves = binder_curves(sweeps, observable);
            binder_crossing(parameter, observable, &curves)
        }
        CriticalPointMethod::DataCollapse => {
            let curves = per_size_curves(sweeps, observable);
            let candidates: Vec<f64> = largest.1.iter().map(|point| point.value).collect();
            data_collapse(
                parameter,
                observable,
                &curves,
                config.beta,
                config.nu,
                &candidates,
            )
        }
    }
}

/// Piecewise-linear interpolation over a sorted `(x, y)` curve
fn interpolate(curve: &[(f64, f64)], x: f64) -> f64 {
    match curve.iter().position(|&(p, _)| p >= x) {
        None => curve.last().map_or(0.0, |&(_, y)| y),
        Some(0) => curve[0].1,
        Some(i) => {
            let (x0, y0) = curve[i - 1];
            let (x1, y1) = curve[i];
            if x1 > x0 {
                y0 + (y1 - y0) * (x - x0) / (x1 - x0)
            } else {
                y0
            }
        }
    }
}

/// Binder cumulant `1 - <m^4> / (3 <m^2>^2)` of a sample of the order
/// parameter; 0 for degenerate samples
pub fn binder_cumulant(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f64;
    let m2 = samples.iter().map(|m| m * m).sum::<f64>() / n;
    let m4 = samples.iter().map(|m| m.powi(4)).sum::<f64>() / n;
    if m2 <= 0.0 {
        return 0.0;
    }
    1.0 - m4 / (3.0 * m2 * m2)
}

/// Bisect a monotone order-parameter response for its threshold crossing
///
/// `evaluate` must be monotone over `[lo, hi]`; the estimator halves the
/// interval until `tolerance` or the depth cap. Returns `None` when the
/// threshold is not bracketed. Confidence reflects the residual interval
/// width.
pub fn bisection<F>(
    parameter: Parameter,
    order_parameter: &'static str,
    evaluate: F,
    lo: f64,
    hi: f64,
    threshold: f64,
    tolerance: f64,
) -> Option<CriticalPoint>
where
    F: Fn(f64) -> f64,
{
    if lo >= hi || !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let f_lo = evaluate(lo);
    let f_hi = evaluate(hi);
    let rising = f_hi >= f_lo;
    // The threshold must sit between the endpoint responses
    if (f_lo - threshold) * (f_hi - threshold) > 0.0 {
        return None;
    }

    let initial_width = hi - lo;
    let (mut lo, mut hi) = (lo, hi);
    for _ in 0..BISECTION_DEPTH {
        if hi - lo <= tolerance {
            break;
        }
        let mid = 0.5 * (lo + hi);
        let f_mid = evaluate(mid);
        let below = if rising {
            f_mid < threshold
        } else {
            f_mid >= threshold
        };
        if below {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let residual = (hi - lo) / initial_width;
    Some(CriticalPoint {
        parameter,
        value: 0.5 * (lo + hi),
        confidence: (1.0 - residual).clamp(0.0, 1.0),
        method: CriticalPointMethod::Bisection,
        order_parameter,
    })
}

/// Locate the susceptibility peak across a sweep
///
/// The peak's abscissa is refined with a parabola through the maximal
/// sample and its neighbors; confidence is the peak's prominence above
/// the baseline (the mean of the remaining samples).
pub fn susceptibility_peak(
    parameter: Parameter,
    order_parameter: &'static str,
    points: &[(f64, f64)],
) -> Option<CriticalPoint> {
    if points.len() < 3 {
        return None;
    }
    let peak_idx = points
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)?;
    let (peak_x, peak_y) = points[peak_idx];
    if !peak_y.is_finite() || peak_y <= 0.0 {
        return None;
    }

    // Quadratic refinement when the peak is interior
    let value = if peak_idx > 0 && peak_idx + 1 < points.len() {
        let (x0, y0) = points[peak_idx - 1];
        let (x1, y1) = (peak_x, peak_y);
        let (x2, y2) = points[peak_idx + 1];
        parabola_vertex(x0, y0, x1, y1, x2, y2).unwrap_or(peak_x)
    } else {
        peak_x
    };

    let baseline = mean(
        &points
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != peak_idx)
            .map(|(_, &(_, y))| y)
            .collect::<Vec<f64>>(),
    );
    let prominence = ((peak_y - baseline) / peak_y).clamp(0.0, 1.0);

    Some(CriticalPoint {
        parameter,
        value,
        confidence: prominence,
        method: CriticalPointMethod::SusceptibilityPeak,
        order_parameter,
    })
}

/// Vertex abscissa of the parabola through three points
fn parabola_vertex(x0: f64, y0: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Option<f64> {
    let d0 = (x1 - x0) * (y1 - y2);
    let d2 = (x1 - x2) * (y1 - y0);
    let denominator = 2.0 * (d0 - d2);
    if denominator.abs() < 1e-12 {
        return None;
    }
    let numerator = (x1 - x0) * d0 - (x1 - x2) * d2;
    Some(x1 - numerator / denominator)
}

/// Binder-cumulant crossing estimator
///
/// Takes per-size cumulant curves sampled on a common parameter grid.
/// For every pair of sizes, every adjacent grid interval is inspected for
/// a sign change of the difference curve and each crossing is linearly
/// interpolated; the estimate is the mean of all crossings found, with
/// confidence `1 - std/mean`.
pub fn binder_crossing(
    parameter: Parameter,
    order_parameter: &'static str,
    curves: &[(usize, Vec<(f64, f64)>)],
) -> Option<CriticalPoint> {
    if curves.len() < 2 {
        return None;
    }

    let mut crossings = Vec::new();
    for i in 0..curves.len() {
        for j in (i + 1)..curves.len() {
            let curve_a = &curves[i].1;
            let curve_b = &curves[j].1;
            let len = curve_a.len().min(curve_b.len());
            // Every adjacent interval is inspected; all crossings count
            for k in 0..len.saturating_sub(1) {
                let d0 = curve_a[k].1 - curve_b[k].1;
                let d1 = curve_a[k + 1].1 - curve_b[k + 1].1;
                if d0 == 0.0 {
                    crossings.push(curve_a[k].0);
                } else if d0 * d1 < 0.0 {
                    let fraction = d0 / (d0 - d1);
                    crossings.push(curve_a[k].0 + fraction * (curve_a[k + 1].0 - curve_a[k].0));
                }
            }
        }
    }

    if crossings.is_empty() {
        return None;
    }
    let estimate = mean(&crossings);
    let spread = std_dev(&crossings);
    let confidence = if estimate.abs() > f64::EPSILON {
        (1.0 - spread / estimate.abs()).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Some(CriticalPoint {
        parameter,
        value: estimate,
        confidence,
        method: CriticalPointMethod::BinderCrossing,
        order_parameter,
    })
}

/// Finite-size data collapse
///
/// Searches `candidates` for the critical point minimizing the binned
/// variance of the rescaled pairs `(t * L^(1/nu), m * L^(beta/nu))` pooled
/// over all system sizes. Good collapse means every size's curve lands on
/// one master curve, so the within-bin variance vanishes.
pub fn data_collapse(
    parameter: Parameter,
    order_parameter: &'static str,
    curves: &[(usize, Vec<(f64, f64)>)],
    beta: f64,
    nu: f64,
    candidates: &[f64],
) -> Option<CriticalPoint> {
    if curves.is_empty() || candidates.is_empty() || nu <= 0.0 {
        return None;
    }

    let mut best: Option<(f64, f64)> = None;
    let mut scores = Vec::with_capacity(candidates.len());
    for &pc in candidates {
        let score = collapse_score(curves, beta, nu, pc)?;
        scores.push(score);
        if best.is_none_or(|(_, s)| score < s) {
            best = Some((pc, score));
        }
    }
    let (value, best_score) = best?;

    let typical = mean(&scores);
    let confidence = if typical > 0.0 {
        (1.0 - best_score / typical).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Some(CriticalPoint {
        parameter,
        value,
        confidence,
        method: CriticalPointMethod::DataCollapse,
        order_parameter,
    })
}

/// Mean within-bin variance of the rescaled data for one candidate pc
fn collapse_score(
    curves: &[(usize, Vec<(f64, f64)>)],
    beta: f64,
    nu: f64,
    pc: f64,
) -> Option<f64> {
    const BINS: usize = 20;

    let mut rescaled: Vec<(f64, f64)> = Vec::new();
    for &(size, ref curve) in curves {
        let length = size as f64;
        for &(p, m) in curve {
            let x = (p - pc) * length.powf(1.0 / nu);
            let y = m * length.powf(beta / nu);
            if x.is_finite() && y.is_finite() {
                rescaled.push((x, y));
            }
        }
    }
    if rescaled.len() < 2 {
        return None;
    }

    let min_x = rescaled.iter().map(|&(x, _)| x).fold(f64::MAX, f64::min);
    let max_x = rescaled.iter().map(|&(x, _)| x).fold(f64::MIN, f64::max);
    if max_x <= min_x {
        return None;
    }
    let bin_width = (max_x - min_x) / BINS as f64;

    let mut bins: Vec<Vec<f64>> = vec![Vec::new(); BINS];
    for &(x, y) in &rescaled {
        let idx = (((x - min_x) / bin_width) as usize).min(BINS - 1);
        bins[idx].push(y);
    }

    let mut variance_sum = 0.0;
    let mut populated = 0usize;
    for bin in &bins {
        if bin.len() >= 2 {
            let sd = std_dev(bin);
            variance_sum += sd * sd;
            populated += 1;
        }
    }
    if populated == 0 {
        return None;
    }
    Some(variance_sum / populated as f64)
}
