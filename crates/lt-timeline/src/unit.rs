//! Timeline records
//!
//! - Unit: one timed token (a phoneme) with a kind and a selection flag
//! - Word: a labeled, inclusive run of unit indices
//! - Endpoint: what a selection gesture landed on

use lt_core::{PlainUnit, TimeSpan, UnitKind};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// UNIT
// ═══════════════════════════════════════════════════════════════════════════════

/// A single timed unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Unit category
    pub kind: UnitKind,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Transient UI selection, never persisted
    #[serde(skip)]
    pub selected: bool,
}

impl Unit {
    pub fn new(kind: UnitKind, start: f64, end: f64) -> Self {
        Self {
            kind,
            start,
            end,
            selected: false,
        }
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    #[inline]
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.end)
    }

    /// Move both boundaries by `delta` seconds
    #[inline]
    pub fn shift(&mut self, delta: f64) {
        let span = self.span().shifted(delta);
        self.start = span.start;
        self.end = span.end;
    }

    pub fn to_plain(&self) -> PlainUnit {
        PlainUnit {
            kind: self.kind,
            start: self.start,
            end: self.end,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WORD
// ═══════════════════════════════════════════════════════════════════════════════

/// A label over the inclusive unit range `first..=last`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Display text
    pub text: String,
    /// Index of the first unit
    pub first: usize,
    /// Index of the last unit (inclusive)
    pub last: usize,
}

impl Word {
    pub fn new(text: impl Into<String>, first: usize, last: usize) -> Self {
        Self {
            text: text.into(),
            first,
            last,
        }
    }

    /// Number of units covered
    #[inline]
    pub fn unit_count(&self) -> usize {
        self.last - self.first + 1
    }

    #[inline]
    pub fn contains(&self, unit_index: usize) -> bool {
        self.first <= unit_index && unit_index <= self.last
    }

    /// True if the two words share at least one unit
    #[inline]
    pub fn overlaps(&self, other: &Word) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    /// Shift both indices to account for a unit inserted before `index`
    pub(crate) fn open_gap_at(&mut self, index: usize) {
        if self.first >= index {
            self.first += 1;
        }
        if self.last >= index {
            self.last += 1;
        }
    }

    /// Shift both indices to account for the unit at `index` going away
    pub(crate) fn close_gap_at(&mut self, index: usize) {
        if self.first >= index {
            self.first -= 1;
        }
        if self.last >= index {
            self.last -= 1;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EDIT OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// How `insert_unit` makes room for the new unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InsertionMethod {
    /// New unit gets the minimum duration, everything after moves later
    #[default]
    PushOut,
    /// New unit takes the first half of the unit it is inserted before
    SplitTime,
}

/// A selection gesture's target: a whole word or a bare unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Word(usize),
    Unit(usize),
}
