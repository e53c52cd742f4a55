//! lt-timeline: Phoneme/word timeline engine for LipTrack
//!
//! Editable, contiguous sequence of timed units with word labels on top,
//! plus its versioned persisted forms.

mod config;
mod persist;
mod selection;
mod timeline;
mod unit;

pub use config::*;
pub use persist::*;
pub use timeline::*;
pub use unit::*;

pub use lt_core::{LtError, LtResult, PlainUnit, TimeSpan, UnitKind};
