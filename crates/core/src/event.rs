//! Fire lifecycle events emitted by the rules

use serde::{Deserialize, Serialize};

/// What happened to a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireEventKind {
    /// A tree caught fire
    Ignition,
    /// A fire went out with fuel remaining
    Extinction,
    /// A fire consumed its fuel
    Burnout,
}

/// A timestamped per-cell fire event
///
/// Events are stamped with the elapsed time of the state they appear in,
/// and ordered by the scan order of the update strategy that produced
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireEvent {
    pub kind: FireEventKind,
    pub time: f64,
    pub x: usize,
    pub y: usize,
}

impl FireEvent {
    pub fn new(kind: FireEventKind, x: usize, y: usize) -> Self {
        // The engine stamps the real time when the step is assembled
        FireEvent {
            kind,
            time: 0.0,
            x,
            y,
        }
    }

    pub fn stamped(mut self, time: f64) -> Self {
        self.time = time;
        self
    }
}
