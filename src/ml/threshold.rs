//! Decision threshold applied to the "not safe" probability.
//!
//! The classifier's own cutoff is 0.5. Water is flagged at a lower bar so
//! fewer unsafe samples are missed, at the cost of flagging some safe ones.

use crate::error::{AppError, Result};
use crate::ml::models::Potability;
use serde::{Deserialize, Serialize};

/// Default cutoff on P(not safe)
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// A cutoff strictly inside (0, 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DecisionThreshold(f64);

impl DecisionThreshold {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 || value >= 1.0 {
            return Err(AppError::Configuration(format!(
                "decision threshold must lie in (0, 1), got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// NOT SAFE iff P(not safe) is strictly above the cutoff; the boundary
    /// itself is SAFE.
    pub fn decide(&self, prob_not_safe: f64) -> Potability {
        if prob_not_safe > self.0 {
            Potability::NotSafe
        } else {
            Potability::Safe
        }
    }
}

impl Default for DecisionThreshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl TryFrom<f64> for DecisionThreshold {
    type Error = AppError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DecisionThreshold> for f64 {
    fn from(threshold: DecisionThreshold) -> Self {
        threshold.0
    }
}
