//! Phase classification

use crate::observables::OrderParameters;
use serde::{Deserialize, Serialize};

/// Dynamical phase of the fire system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Fires die out locally; no large-scale structure
    SubCritical,
    /// Scale-free behavior near the percolation threshold
    Critical,
    /// System-spanning fires dominate
    SuperCritical,
}

/// Classify a single state from its order parameters
pub fn classify_state(params: &OrderParameters) -> Phase {
    if params.burnt_fraction > 0.4 && params.percolation_smooth > 0.5 {
        Phase::SuperCritical
    } else if params.burnt_fraction < 0.1 && params.largest_cluster_ratio < 0.05 {
        Phase::SubCritical
    } else {
        Phase::Critical
    }
}

/// Classify an ensemble from its aggregate burnt-fraction statistics
///
/// Large relative fluctuations at intermediate burnt fractions are the
/// ensemble signature of criticality even when the mean state would
/// classify otherwise.
pub fn classify_ensemble(
    mean_burnt: f64,
    std_dev_burnt: f64,
    mean_percolation: f64,
    mean_largest_ratio: f64,
) -> Phase {
    let normalized_variance = if mean_burnt > 0.0 {
        (std_dev_burnt * std_dev_burnt) / (mean_burnt * mean_burnt)
    } else {
        0.0
    };
    if normalized_variance > 2.0 && mean_burnt > 0.05 && mean_burnt < 0.5 {
        return Phase::Critical;
    }

    if mean_burnt > 0.4 && mean_percolation > 0.5 {
        Phase::SuperCritical
    } else if mean_burnt < 0.1 && mean_largest_ratio < 0.05 {
        Phase::SubCritical
    } else {
        Phase::Critical
    }
}
