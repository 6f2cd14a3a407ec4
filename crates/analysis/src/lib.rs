//! Phase analysis for the alpine fire automaton
//!
//! Batch orchestration (ensembles, parameter sweeps, 2D phase diagrams)
//! and the observable machinery that turns raw runs into scientific
//! results: order parameters, phase classification, critical-point
//! estimation, finite-size scaling, critical exponents, universality
//! identification, and data-quality diagnostics.

pub mod critical;
pub mod curves;
pub mod ensemble;
pub mod exponents;
pub mod observables;
pub mod phase;
pub mod quality;
pub mod stats;
pub mod sweep;
pub mod universality;

// Re-export main types
pub use critical::{
    binder_crossing, binder_cumulant, bisection, data_collapse, estimate_critical_point,
    susceptibility_peak, CriticalPoint, CriticalPointMethod, EstimatorConfig,
};
pub use curves::{binder_curves, order_parameter_curve, per_size_curves, susceptibility_curve};
pub use ensemble::{EnsembleOutcome, EnsembleRunner, RunOutcome};
pub use exponents::{
    cluster_size_histogram, extract_beta, extract_gamma, extract_nu, extract_tau,
    CriticalExponents, ExponentEstimate,
};
pub use observables::{fire_front_length, susceptibility, OrderParameters};
pub use phase::{classify_ensemble, classify_state, Phase};
pub use quality::{
    autocorrelation_time, equilibration_report, finite_size_report, EquilibrationReport,
    FiniteSizeReport,
};
pub use stats::{
    aic, bic, blocking_analysis, bootstrap, cross_validate_polynomial, jackknife, ks_test,
    linear_regression, power_law_mle, weighted_least_squares, LinearFit,
};
pub use sweep::{Parameter, ParameterPoint};
pub use universality::{
    check_hyperscaling, classify, ClassMatch, HyperscalingReport, UniversalityClass,
};
