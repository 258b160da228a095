//! Inter-cut period window.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Admissible inter-cut spacing, in seconds.
///
/// The next cut after a cut at `p` must land inside
/// `[p + min_s, p + max_s]`, ideally near `p + target_s`. When strict
/// selection fails the window may be expanded once by `grace_s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PeriodWindow {
    /// Minimum spacing between cuts.
    pub min_s: f64,
    /// Maximum spacing between cuts.
    pub max_s: f64,
    /// Preferred spacing between cuts.
    pub target_s: f64,
    /// One-shot window expansion applied when strict selection fails.
    pub grace_s: f64,
}

/// Errors produced by [`PeriodWindow::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("period minimum must be positive, got {0}")]
    NonPositiveMin(String),
    #[error("period target {target} outside [{min}, {max}]")]
    TargetOutsideRange {
        min: String,
        max: String,
        target: String,
    },
    #[error("grace must be non-negative, got {0}")]
    NegativeGrace(String),
}

impl PeriodWindow {
    /// Build a validated window: `0 < min ≤ target ≤ max`, `grace ≥ 0`.
    pub fn new(min_s: f64, max_s: f64, target_s: f64, grace_s: f64) -> Result<Self, WindowError> {
        if !(min_s > 0.0) {
            return Err(WindowError::NonPositiveMin(format!("{min_s}")));
        }
        if !(min_s <= target_s && target_s <= max_s) {
            return Err(WindowError::TargetOutsideRange {
                min: format!("{min_s}"),
                max: format!("{max_s}"),
                target: format!("{target_s}"),
            });
        }
        if !(grace_s >= 0.0) {
            return Err(WindowError::NegativeGrace(format!("{grace_s}")));
        }
        Ok(Self {
            min_s,
            max_s,
            target_s,
            grace_s,
        })
    }

    /// Window bounds for the cut following a cut at `p`.
    pub fn after(&self, p: f64) -> (f64, f64) {
        (p + self.min_s, p + self.max_s)
    }

    /// Preferred time for the cut following a cut at `p`.
    pub fn target_after(&self, p: f64) -> f64 {
        p + self.target_s
    }

    /// Half the window span; the downbeat strategy only accepts downbeats
    /// within this distance of the target.
    pub fn half_span(&self) -> f64 {
        (self.max_s - self.min_s) / 2.0
    }
}
