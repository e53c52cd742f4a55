//! Unit selection
//!
//! Selection lives on units; a word is selected when all of its units are.
//! Range selection is a two-step gesture: `start_selection` records an
//! anchor, `end_selection` selects the contiguous span covering the anchor
//! and the second endpoint.

use lt_core::UnitKind;

use crate::timeline::Timeline;
use crate::unit::Endpoint;

impl Timeline {
    /// Record a selection anchor and apply `selected` to the units it covers
    ///
    /// `None` clears the anchor.
    pub fn start_selection(&mut self, anchor: Option<Endpoint>, selected: bool) {
        self.anchor = anchor;
        match anchor {
            Some(Endpoint::Word(word)) => self.set_word_selected(word, selected),
            Some(Endpoint::Unit(unit)) => self.set_unit_selected(unit, selected),
            None => {}
        }
    }

    /// Select the contiguous span covering the anchor and `end`
    ///
    /// Any earlier selection is replaced. Returns `false`, clearing the
    /// anchor and leaving the selection untouched, if the endpoints do not
    /// resolve to units.
    pub fn end_selection(&mut self, end: Option<Endpoint>) -> bool {
        let anchor = self.anchor.and_then(|endpoint| self.endpoint_range(endpoint));
        let end = end.and_then(|endpoint| self.endpoint_range(endpoint));

        let Some((first, last)) = (match (anchor, end) {
            (Some((a0, a1)), Some((e0, e1))) => Some((a0.min(e0), a1.max(e1))),
            _ => None,
        }) else {
            log::debug!("Selection endpoints {:?} / {:?} unresolved, aborting", self.anchor, end);
            self.anchor = None;
            return false;
        };

        self.clear_selection();
        for unit in &mut self.units[first..=last] {
            unit.selected = true;
        }
        true
    }

    /// Deselect every unit
    pub fn clear_selection(&mut self) {
        for unit in &mut self.units {
            unit.selected = false;
        }
    }

    pub fn has_selection(&self) -> bool {
        self.units.iter().any(|unit| unit.selected)
    }

    /// First and last selected unit
    pub fn selected_range(&self) -> Option<(usize, usize)> {
        let first = self.units.iter().position(|unit| unit.selected)?;
        let last = self.units.iter().rposition(|unit| unit.selected)?;
        Some((first, last))
    }

    /// Remove every selected unit (see [`Timeline::remove_unit`])
    pub fn remove_selection(&mut self) {
        let mut index = 0;
        while index < self.units.len() {
            if self.units[index].selected {
                self.remove_unit(index);
            } else {
                index += 1;
            }
        }
    }

    /// Nuke every selected unit (see [`Timeline::nuke_unit`])
    pub fn nuke_selection(&mut self) {
        let mut index = 0;
        while index < self.units.len() {
            if self.units[index].selected {
                self.nuke_unit(index);
            } else {
                index += 1;
            }
        }
    }

    /// Replace the selected run with a single unit of `kind` spanning it
    ///
    /// The unit after the run keeps its duration. No-op without a selection.
    pub fn change_selection(&mut self, kind: UnitKind) {
        let Some((first, last)) = self.selected_range() else {
            log::debug!("No selection to change");
            return;
        };

        let selection_start = self.units[first].start;
        let selection_end = self.units[last].end;
        let at_end = last + 1 == self.units.len();
        let following_duration = if at_end { 0.0 } else { self.units[last + 1].duration() };

        self.remove_selection();
        if !at_end {
            let start = self.units[first].start;
            self.push_unit_end(first, start + following_duration);
        } else if first > 0 {
            self.push_unit_end(first - 1, selection_start);
        }
        self.insert_unit_with_duration(kind, selection_end - selection_start, first);
    }

    /// Inclusive unit range an endpoint stands for
    fn endpoint_range(&self, endpoint: Endpoint) -> Option<(usize, usize)> {
        match endpoint {
            Endpoint::Word(index) => self.words.get(index).map(|word| (word.first, word.last)),
            Endpoint::Unit(index) => (index < self.units.len()).then_some((index, index)),
        }
    }
}
