//! lt-core: Shared types for LipTrack
//!
//! Vocabulary shared by the timeline engine and the subsystems that consume
//! its output (curve generation, acoustic analysis).

mod error;
mod time;

pub use error::*;
pub use time::*;

/// Category of a timed unit (a phoneme class, a silence, ...)
///
/// The timeline never interprets the value beyond equality.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct UnitKind(pub u16);

impl UnitKind {
    /// Conventional silence category
    pub const SILENCE: Self = Self(0);

    #[inline]
    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl From<u16> for UnitKind {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// Flat `(kind, start, end)` triple handed to analysis subsystems
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlainUnit {
    pub kind: UnitKind,
    pub start: f64,
    pub end: f64,
}

impl PlainUnit {
    #[inline]
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.end)
    }
}
