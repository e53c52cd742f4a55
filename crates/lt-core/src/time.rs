//! Time-related types for speech timelines
//!
//! All times are seconds from the start of the animation's audio.

use serde::{Deserialize, Serialize};

/// Tolerance used when two times are expected to be the same boundary
pub const TIME_EPSILON: f64 = 1e-6;

/// Compare two times within [`TIME_EPSILON`]
#[inline]
pub fn real_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_EPSILON
}

/// Half-open time interval `[start, end)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl TimeSpan {
    #[inline]
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True if `time` lies in `[start, end)`
    #[inline]
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Same span moved by `delta` seconds
    #[inline]
    pub fn shifted(self, delta: f64) -> Self {
        Self {
            start: self.start + delta,
            end: self.end + delta,
        }
    }
}
