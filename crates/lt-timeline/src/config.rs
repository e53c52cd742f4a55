//! Timeline Configuration
//!
//! Editing constraints a timeline is created with. Loadable from the same
//! JSON preference files the editor keeps its other settings in; missing
//! keys fall back to defaults.

use lt_core::{LtError, LtResult, TIME_EPSILON};
use serde::{Deserialize, Serialize};

/// Minimum unit duration for newly created timelines (seconds)
pub const DEFAULT_MIN_UNIT_DURATION: f64 = 0.010;

/// Minimum unit duration assumed for data saved before the value was stored
pub const LEGACY_MIN_UNIT_DURATION: f64 = 0.016;

/// Timeline editing constraints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Shortest duration any unit may be edited down to (seconds)
    pub min_unit_duration: f64,
    /// Tolerance for matching times against unit boundaries (seconds)
    pub boundary_epsilon: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_unit_duration: DEFAULT_MIN_UNIT_DURATION,
            boundary_epsilon: TIME_EPSILON,
        }
    }
}

impl TimelineConfig {
    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> LtResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LtError::Serialization(e.to_string()))?;
        config.validated()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> LtResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LtError::Serialization(e.to_string()))
    }

    /// Reject values the editing operations cannot work with
    pub fn validated(self) -> LtResult<Self> {
        if !self.min_unit_duration.is_finite() || self.min_unit_duration <= 0.0 {
            return Err(LtError::InvalidData(format!(
                "min_unit_duration must be positive, got {}",
                self.min_unit_duration
            )));
        }
        if !self.boundary_epsilon.is_finite() || self.boundary_epsilon < 0.0 {
            return Err(LtError::InvalidData(format!(
                "boundary_epsilon must be non-negative, got {}",
                self.boundary_epsilon
            )));
        }
        Ok(self)
    }

    /// Compare two times within the configured tolerance
    #[inline]
    pub fn same_time(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.boundary_epsilon
    }
}
