//! Universality-class identification and hyperscaling checks

use crate::exponents::CriticalExponents;
use serde::{Deserialize, Serialize};

/// Spatial dimensionality of the lattice
const DIMENSION: f64 = 2.0;

/// Tolerance for the hyperscaling relation residuals
const HYPERSCALING_TOLERANCE: f64 = 0.001;

/// Known critical universality classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniversalityClass {
    IsotropicPercolation,
    DirectedPercolation,
    DynamicPercolation,
    SelfOrganizedCriticality,
    MeanField,
}

impl UniversalityClass {
    pub fn all() -> [UniversalityClass; 5] {
        [
            UniversalityClass::IsotropicPercolation,
            UniversalityClass::DirectedPercolation,
            UniversalityClass::DynamicPercolation,
            UniversalityClass::SelfOrganizedCriticality,
            UniversalityClass::MeanField,
        ]
    }

    /// Reference `(beta, gamma, nu)` for the class in two dimensions
    pub fn reference_exponents(self) -> (f64, f64, f64) {
        match self {
            UniversalityClass::IsotropicPercolation => (0.139, 2.389, 1.333),
            UniversalityClass::DirectedPercolation => (0.276, 2.278, 1.097),
            UniversalityClass::DynamicPercolation => (0.139, 2.389, 1.506),
            UniversalityClass::SelfOrganizedCriticality => (0.220, 1.800, 1.000),
            UniversalityClass::MeanField => (1.0, 1.0, 0.5),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UniversalityClass::IsotropicPercolation => "isotropic percolation",
            UniversalityClass::DirectedPercolation => "directed percolation",
            UniversalityClass::DynamicPercolation => "dynamic percolation",
            UniversalityClass::SelfOrganizedCriticality => "self-organized criticality",
            UniversalityClass::MeanField => "mean-field",
        }
    }
}

/// Outcome of matching measured exponents against the known classes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMatch {
    pub class: UniversalityClass,
    /// RMS relative distance over `(beta, gamma, nu)`
    pub distance: f64,
    /// Whether the fallback rule replaced a poor, low-confidence match
    pub fell_back: bool,
}

/// RMS relative difference between measured and reference exponents
fn class_distance(measured: &CriticalExponents, class: UniversalityClass) -> f64 {
    let (beta, gamma, nu) = class.reference_exponents();
    let rel = |measured: f64, reference: f64| {
        if reference.abs() > f64::EPSILON {
            (measured - reference) / reference
        } else {
            measured
        }
    };
    let db = rel(measured.beta, beta);
    let dg = rel(measured.gamma, gamma);
    let dn = rel(measured.nu, nu);
    ((db * db + dg * dg + dn * dn) / 3.0).sqrt()
}

/// Pick the closest class
///
/// When the best distance exceeds 0.1 and the measurement confidence is
/// at most 0.8, the identification is unreliable and falls back to
/// isotropic percolation.
pub fn classify(measured: &CriticalExponents, confidence: f64) -> ClassMatch {
    let mut best = ClassMatch {
        class: UniversalityClass::IsotropicPercolation,
        distance: f64::MAX,
        fell_back: false,
    };
    for class in UniversalityClass::all() {
        let distance = class_distance(measured, class);
        if distance < best.distance {
            best = ClassMatch {
                class,
                distance,
                fell_back: false,
            };
        }
    }

    if best.distance > 0.1 && confidence <= 0.8 {
        ClassMatch {
            class: UniversalityClass::IsotropicPercolation,
            distance: best.distance,
            fell_back: true,
        }
    } else {
        best
    }
}

/// One scaling relation's check result
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelationCheck {
    pub name: &'static str,
    /// Absolute residual of the relation
    pub residual: f64,
    pub satisfied: bool,
}

/// Hyperscaling report over the four standard relations
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HyperscalingReport {
    pub rushbrooke: RelationCheck,
    pub widom: RelationCheck,
    pub fisher: RelationCheck,
    pub josephson: RelationCheck,
}

impl HyperscalingReport {
    pub fn all_satisfied(&self) -> bool {
        self.rushbrooke.satisfied
            && self.widom.satisfied
            && self.fisher.satisfied
            && self.josephson.satisfied
    }
}

/// Check the Fisher, Rushbrooke, Widom, and Josephson relations
pub fn check_hyperscaling(e: &CriticalExponents) -> HyperscalingReport {
    let check = |name: &'static str, residual: f64| RelationCheck {
        name,
        residual: residual.abs(),
        satisfied: residual.abs() <= HYPERSCALING_TOLERANCE,
    };
    HyperscalingReport {
        // alpha + 2 beta + gamma = 2
        rushbrooke: check("rushbrooke", e.alpha + 2.0 * e.beta + e.gamma - 2.0),
        // gamma = beta (delta - 1)
        widom: check("widom", e.gamma - e.beta * (e.delta - 1.0)),
        // gamma = nu (2 - eta)
        fisher: check("fisher", e.gamma - e.nu * (2.0 - e.eta)),
        // d nu = 2 - alpha
        josephson: check("josephson", DIMENSION * e.nu - (2.0 - e.alpha)),
    }
}
