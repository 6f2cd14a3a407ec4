//! Side-effect-free statistical helpers
//!
//! Small numerical routines shared by the critical-point, exponent, and
//! data-quality machinery. All of them are pure functions of their inputs;
//! resampling routines take an explicit seed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Ordinary least-squares line fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Placeholder returned for degenerate regression inputs
pub const DEGENERATE_FIT: LinearFit = LinearFit {
    slope: 0.0,
    intercept: 1.0,
    r_squared: 0.0,
};

/// Least-squares line through `(x, y)` pairs
///
/// Fewer than two points, or zero variance in `x`, returns the
/// `(0, 1, 0)` placeholder rather than dividing by zero.
pub fn linear_regression(x: &[f64], y: &[f64]) -> LinearFit {
    let n = x.len().min(y.len());
    if n < 2 {
        return DEGENERATE_FIT;
    }
    let n_f = n as f64;
    let mean_x = x[..n].iter().sum::<f64>() / n_f;
    let mean_y = y[..n].iter().sum::<f64>() / n_f;

    let mut ss_xx = 0.0;
    let mut ss_xy = 0.0;
    let mut ss_yy = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        ss_xx += dx * dx;
        ss_xy += dx * dy;
        ss_yy += dy * dy;
    }
    if ss_xx == 0.0 || !ss_xx.is_finite() || !ss_xy.is_finite() {
        return DEGENERATE_FIT;
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if ss_yy > 0.0 {
        (ss_xy * ss_xy) / (ss_xx * ss_yy)
    } else {
        0.0
    };

    LinearFit {
        slope,
        intercept,
        r_squared,
    }
}

/// Weighted least-squares line fit
///
/// Weights must be non-negative; non-positive total weight degenerates.
pub fn weighted_least_squares(x: &[f64], y: &[f64], weights: &[f64]) -> LinearFit {
    let n = x.len().min(y.len()).min(weights.len());
    if n < 2 {
        return DEGENERATE_FIT;
    }
    let w_total: f64 = weights[..n].iter().sum();
    if w_total <= 0.0 || !w_total.is_finite() {
        return DEGENERATE_FIT;
    }

    let mean_x = x[..n]
        .iter()
        .zip(weights)
        .map(|(xi, wi)| xi * wi)
        .sum::<f64>()
        / w_total;
    let mean_y = y[..n]
        .iter()
        .zip(weights)
        .map(|(yi, wi)| yi * wi)
        .sum::<f64>()
        / w_total;

    let mut ss_xx = 0.0;
    let mut ss_xy = 0.0;
    let mut ss_yy = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        ss_xx += weights[i] * dx * dx;
        ss_xy += weights[i] * dx * dy;
        ss_yy += weights[i] * dy * dy;
    }
    if ss_xx == 0.0 {
        return DEGENERATE_FIT;
    }

    let slope = ss_xy / ss_xx;
    LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
        r_squared: if ss_yy > 0.0 {
            (ss_xy * ss_xy) / (ss_xx * ss_yy)
        } else {
            0.0
        },
    }
}

/// Bootstrap estimate of a statistic's standard error
///
/// Returns `(statistic on the full sample, bootstrap standard error)`.
pub fn bootstrap<F>(data: &[f64], statistic: F, resamples: usize, seed: u64) -> (f64, f64)
where
    F: Fn(&[f64]) -> f64,
{
    if data.is_empty() || resamples == 0 {
        return (0.0, 0.0);
    }
    let point = statistic(data);
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut resample = vec![0.0; data.len()];
    let mut estimates = Vec::with_capacity(resamples);
    for _ in 0..resamples {
        for slot in &mut resample {
            *slot = data[rng.random_range(0..data.len())];
        }
        estimates.push(statistic(&resample));
    }
    (point, std_dev(&estimates))
}

/// Jackknife estimate of a statistic's bias-corrected standard error
///
/// Returns `(statistic on the full sample, jackknife standard error)`.
pub fn jackknife<F>(data: &[f64], statistic: F) -> (f64, f64)
where
    F: Fn(&[f64]) -> f64,
{
    let n = data.len();
    if n < 2 {
        return (if n == 1 { statistic(data) } else { 0.0 }, 0.0);
    }
    let point = statistic(data);
    let mut leave_one_out = Vec::with_capacity(n);
    let mut reduced = Vec::with_capacity(n - 1);
    for skip in 0..n {
        reduced.clear();
        reduced.extend(
            data.iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, v)| *v),
        );
        leave_one_out.push(statistic(&reduced));
    }
    let mean = leave_one_out.iter().sum::<f64>() / n as f64;
    let variance = leave_one_out
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        * (n as f64 - 1.0)
        / n as f64;
    (point, variance.sqrt())
}

/// Two-sample Kolmogorov-Smirnov test
///
/// Returns `(D statistic, asymptotic p-value)`.
pub fn ks_test(a: &[f64], b: &[f64]) -> (f64, f64) {
    if a.is_empty() || b.is_empty() {
        return (0.0, 1.0);
    }
    let mut sa = a.to_vec();
    let mut sb = b.to_vec();
    sa.sort_by(|p, q| p.partial_cmp(q).unwrap_or(std::cmp::Ordering::Equal));
    sb.sort_by(|p, q| p.partial_cmp(q).unwrap_or(std::cmp::Ordering::Equal));

    let (mut i, mut j) = (0usize, 0usize);
    let mut statistic: f64 = 0.0;
    while i < sa.len() && j < sb.len() {
        let va = sa[i];
        let vb = sb[j];
        // Ties advance both pointers so equal samples contribute no distance
        if va <= vb {
            i += 1;
        }
        if vb <= va {
            j += 1;
        }
        let fa = i as f64 / sa.len() as f64;
        let fb = j as f64 / sb.len() as f64;
        statistic = statistic.max((fa - fb).abs());
    }

    let n_eff = (sa.len() * sb.len()) as f64 / (sa.len() + sb.len()) as f64;
    let lambda = (n_eff.sqrt() + 0.12 + 0.11 / n_eff.sqrt()) * statistic;
    // The Kolmogorov series only converges for lambda away from zero;
    // tiny lambda means indistinguishable samples
    if lambda < 1e-3 {
        return (statistic, 1.0);
    }
    let mut p_value = 0.0;
    let mut converged = false;
    for k in 1..=100 {
        let k_f = f64::from(k);
        let term = 2.0 * (-1.0f64).powi(k + 1) * (-2.0 * k_f * k_f * lambda * lambda).exp();
        p_value += term;
        if term.abs() < 1e-10 {
            converged = true;
            break;
        }
    }
    if !converged {
        return (statistic, 1.0);
    }
    (statistic, p_value.clamp(0.0, 1.0))
}

/// Maximum-likelihood exponent of a power-law tail
///
/// Hill estimator: `alpha = 1 + n / sum(ln(x / xmin))` over samples at or
/// above `xmin`. Returns `None` when no usable samples exist.
pub fn power_law_mle(data: &[f64], xmin: f64) -> Option<f64> {
    if xmin <= 0.0 {
        return None;
    }
    let mut n = 0usize;
    let mut log_sum = 0.0;
    for &x in data {
        if x >= xmin && x.is_finite() {
            n += 1;
            log_sum += (x / xmin).ln();
        }
    }
    if n == 0 || log_sum <= 0.0 {
        return None;
    }
    Some(1.0 + n as f64 / log_sum)
}

/// Akaike information criterion
pub fn aic(log_likelihood: f64, parameter_count: usize) -> f64 {
    2.0 * parameter_count as f64 - 2.0 * log_likelihood
}

/// Bayesian information criterion
pub fn bic(log_likelihood: f64, parameter_count: usize, sample_count: usize) -> f64 {
    parameter_count as f64 * (sample_count as f64).ln() - 2.0 * log_likelihood
}

/// K-fold cross-validated mean squared error of a polynomial fit
///
/// Fits a degree-`degree` polynomial on each training fold by normal
/// equations and scores the held-out fold. Returns `None` when the data
/// cannot support the requested degree or fold count.
pub fn cross_validate_polynomial(
    x: &[f64],
    y: &[f64],
    degree: usize,
    folds: usize,
) -> Option<f64> {
    let n = x.len().min(y.len());
    if folds < 2 || n < folds || n <= degree + 1 {
        return None;
    }

    let mut total_error = 0.0;
    let mut scored = 0usize;
    for fold in 0..folds {
        let test: Vec<usize> = (0..n).filter(|i| i % folds == fold).collect();
        let train: Vec<usize> = (0..n).filter(|i| i % folds != fold).collect();
        if train.len() <= degree {
            continue;
        }
        let tx: Vec<f64> = train.iter().map(|&i| x[i]).collect();
        let ty: Vec<f64> = train.iter().map(|&i| y[i]).collect();
        let coefficients = fit_polynomial(&tx, &ty, degree)?;
        for &i in &test {
            let prediction = eval_polynomial(&coefficients, x[i]);
            total_error += (y[i] - prediction) * (y[i] - prediction);
            scored += 1;
        }
    }
    if scored == 0 {
        return None;
    }
    Some(total_error / scored as f64)
}

/// Polynomial least squares via normal equations with Gaussian elimination
fn fit_polynomial(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let terms = degree + 1;
    let samples = x.len();
    let mut normal = vec![vec![0.0f64; terms]; terms];
    let mut rhs = vec![0.0f64; terms];
    for i in 0..samples {
        let mut powers = vec![1.0; 2 * terms];
        for p in 1..2 * terms {
            powers[p] = powers[p - 1] * x[i];
        }
        for row in 0..terms {
            for col in 0..terms {
                normal[row][col] += powers[row + col];
            }
            rhs[row] += powers[row] * y[i];
        }
    }

    // Gaussian elimination with partial pivoting
    for col in 0..terms {
        let pivot = (col..terms).max_by(|&r1, &r2| {
            normal[r1][col]
                .abs()
                .partial_cmp(&normal[r2][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if normal[pivot][col].abs() < 1e-12 {
            return None;
        }
        normal.swap(col, pivot);
        rhs.swap(col, pivot);
        for row in (col + 1)..terms {
            let factor = normal[row][col] / normal[col][col];
            for c in col..terms {
                normal[row][c] -= factor * normal[col][c];
            }
            rhs[row] -= factor * rhs[col];
        }
    }
    let mut coefficients = vec![0.0; terms];
    for row in (0..terms).rev() {
        let mut sum = rhs[row];
        for col in (row + 1)..terms {
            sum -= normal[row][col] * coefficients[col];
        }
        coefficients[row] = sum / normal[row][row];
    }
    Some(coefficients)
}

fn eval_polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Blocking analysis of a correlated series
///
/// Repeatedly halves the series into block means and reports the naive
/// standard error at each blocking level. A plateau in the returned
/// errors estimates the true error of the mean.
pub fn blocking_analysis(series: &[f64]) -> Vec<(usize, f64)> {
    let mut levels = Vec::new();
    let mut current = series.to_vec();
    let mut block_size = 1usize;
    while current.len() >= 2 {
        let err = std_dev(&current) / (current.len() as f64).sqrt();
        levels.push((block_size, err));
        current = current
            .chunks_exact(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect();
        block_size *= 2;
    }
    levels
}

/// Sample standard deviation
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    (data.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0)).sqrt()
}

/// Sample mean, 0 for an empty slice
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        0.0
    } else {
        data.iter().sum::<f64>() / data.len() as f64
    }
}
