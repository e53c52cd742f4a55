//! Phoneme/Word Timeline
//!
//! Ordered, gap-free sequence of timed units with labeled words laid over
//! index ranges of it:
//! - Units are contiguous: `units[i].end == units[i + 1].start`
//! - Every unit lasts at least `min_unit_duration`
//! - Words reference inclusive, non-overlapping unit ranges
//! - Word selection is derived from the selection of its units
//!
//! Every operation that changes the unit count renumbers word indices
//! before returning.
//!
//! ## Failure policy
//! - Out-of-range indices are caller bugs and panic
//! - Boundary edits clamp silently and return the applied time
//! - Requests that resolve to nothing are no-ops

use lt_core::{PlainUnit, TimeSpan, UnitKind};

use crate::config::TimelineConfig;
use crate::unit::{Endpoint, InsertionMethod, Unit, Word};

// ═══════════════════════════════════════════════════════════════════════════════
// TIMELINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Units and words of one animation
#[derive(Debug)]
pub struct Timeline {
    pub(crate) units: Vec<Unit>,
    pub(crate) words: Vec<Word>,
    pub(crate) config: TimelineConfig,
    pub(crate) dirty: bool,
    /// Pending selection anchor (see `start_selection`)
    pub(crate) anchor: Option<Endpoint>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Timeline {
    fn clone(&self) -> Self {
        Self {
            units: self.units.clone(),
            words: self.words.clone(),
            config: self.config,
            dirty: self.dirty,
            anchor: None,
        }
    }
}

impl Timeline {
    /// Empty timeline with default constraints
    pub fn new() -> Self {
        Self::with_config(TimelineConfig::default())
    }

    /// Empty timeline with explicit constraints
    pub fn with_config(config: TimelineConfig) -> Self {
        Self {
            units: Vec::new(),
            words: Vec::new(),
            config,
            dirty: false,
            anchor: None,
        }
    }

    pub(crate) fn from_parts(units: Vec<Unit>, words: Vec<Word>, config: TimelineConfig) -> Self {
        Self {
            units,
            words,
            config,
            dirty: false,
            anchor: None,
        }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    #[inline]
    pub fn min_unit_duration(&self) -> f64 {
        self.config.min_unit_duration
    }

    /// Change the minimum duration used by subsequent edits
    ///
    /// Existing units are left as they are.
    pub fn set_min_unit_duration(&mut self, duration: f64) {
        assert!(
            duration.is_finite() && duration > 0.0,
            "minimum unit duration must be positive, got {duration}"
        );
        self.config.min_unit_duration = duration;
        self.dirty = true;
    }

    // ---- Dirty flag ----

    /// True if anything changed since the last `clear_dirty_flag`
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty_flag(&mut self) {
        self.dirty = false;
    }

    // ---- Unit queries ----

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit(&self, index: usize) -> &Unit {
        &self.units[index]
    }

    pub fn unit_kind(&self, index: usize) -> UnitKind {
        self.units[index].kind
    }

    pub fn unit_start(&self, index: usize) -> f64 {
        self.units[index].start
    }

    pub fn unit_end(&self, index: usize) -> f64 {
        self.units[index].end
    }

    pub fn unit_duration(&self, index: usize) -> f64 {
        self.units[index].duration()
    }

    pub fn unit_selected(&self, index: usize) -> bool {
        self.units[index].selected
    }

    /// End of the last unit, 0 when empty
    pub fn end_time(&self) -> f64 {
        self.units.last().map_or(0.0, |unit| unit.end)
    }

    /// Index of the word containing a unit
    pub fn unit_word(&self, unit_index: usize) -> Option<usize> {
        self.words.iter().position(|word| word.contains(unit_index))
    }

    /// Index of the unit whose `[start, end)` contains `time`
    pub fn find_unit_at(&self, time: f64) -> Option<usize> {
        self.units.iter().position(|unit| unit.span().contains(time))
    }

    /// Flatten to `(kind, start, end)` triples
    pub fn to_plain_sequence(&self) -> Vec<PlainUnit> {
        self.units.iter().map(Unit::to_plain).collect()
    }

    // ---- Word queries ----

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn word(&self, index: usize) -> &Word {
        &self.words[index]
    }

    pub fn word_text(&self, index: usize) -> &str {
        &self.words[index].text
    }

    pub fn word_first_unit(&self, index: usize) -> usize {
        self.words[index].first
    }

    pub fn word_last_unit(&self, index: usize) -> usize {
        self.words[index].last
    }

    pub fn word_start(&self, index: usize) -> f64 {
        self.units[self.words[index].first].start
    }

    pub fn word_end(&self, index: usize) -> f64 {
        self.units[self.words[index].last].end
    }

    pub fn word_span(&self, index: usize) -> TimeSpan {
        TimeSpan::new(self.word_start(index), self.word_end(index))
    }

    pub fn word_duration(&self, index: usize) -> f64 {
        self.word_span(index).duration()
    }

    /// A word is selected when every one of its units is
    pub fn word_selected(&self, index: usize) -> bool {
        let word = &self.words[index];
        self.units[word.first..=word.last]
            .iter()
            .all(|unit| unit.selected)
    }

    // ---- Simple setters ----

    pub fn set_unit_selected(&mut self, index: usize, selected: bool) {
        self.units[index].selected = selected;
    }

    /// Select or deselect every unit of a word
    pub fn set_word_selected(&mut self, index: usize, selected: bool) {
        let (first, last) = (self.words[index].first, self.words[index].last);
        for unit in &mut self.units[first..=last] {
            unit.selected = selected;
        }
    }

    pub fn set_unit_kind(&mut self, index: usize, kind: UnitKind) {
        self.units[index].kind = kind;
        self.dirty = true;
    }

    // ---- Clearing ----

    /// Drop every unit, and with them every word
    pub fn clear_units(&mut self) {
        self.words.clear();
        self.units.clear();
        self.dirty = true;
    }

    /// Drop every word, keep the units
    pub fn clear_words(&mut self) {
        self.words.clear();
        self.dirty = true;
    }

    pub fn clear(&mut self) {
        self.clear_units();
        self.anchor = None;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // UNIT REMOVAL / INSERTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Remove one unit, handing its time to the following unit
    ///
    /// A word that loses its only unit is deleted; a word that loses its
    /// first or last unit shrinks by one.
    pub fn remove_unit(&mut self, index: usize) {
        self.check_unit_index(index);

        if let Some(w) = self.words.iter().rposition(|word| word.contains(index)) {
            let (first, last) = (self.words[w].first, self.words[w].last);
            if first == last {
                self.words.remove(w);
            } else if last == index {
                self.words[w].last -= 1;
            } else if first == index {
                self.words[w].first += 1;
            }
        }
        for word in &mut self.words {
            word.close_gap_at(index);
        }

        let removed = self.units[index];
        let len = self.units.len();
        if index == 0 {
            // New first unit reaches back to zero, or further if the timeline already did
            if len > 1 {
                self.units[1].start = removed.start.min(0.0);
            }
        } else if index == len - 1 {
            self.units[index - 1].end = removed.end;
        } else {
            self.units[index - 1].end = removed.start;
            self.units[index + 1].start = removed.start;
        }
        self.units.remove(index);
        self.dirty = true;
    }

    /// Remove one unit and pull everything after it earlier by its duration
    pub fn nuke_unit(&mut self, index: usize) {
        self.check_unit_index(index);
        let removed = self.units[index];
        let duration = removed.duration();
        self.remove_unit(index);

        if index < self.units.len() {
            // Undo remove_unit's stretch, then move the rest rigidly
            self.units[index].start = removed.end;
            for unit in &mut self.units[index..] {
                unit.shift(-duration);
            }
        } else if let Some(last) = self.units.last_mut() {
            last.end -= duration;
        }
    }

    /// Insert a new, selected unit before `index`
    ///
    /// Clears the previous selection. Inserting at or past the end appends
    /// a minimum-duration unit.
    pub fn insert_unit(&mut self, kind: UnitKind, index: usize, method: InsertionMethod) {
        self.clear_selection();
        let min = self.min_unit_duration();

        if index >= self.units.len() {
            let start = self.end_time();
            self.push_selected(Unit::new(kind, start, start + min));
            return;
        }

        for word in &mut self.words {
            word.open_gap_at(index);
        }

        let target = self.units[index].span();
        let method = if method == InsertionMethod::SplitTime && target.duration() < 2.0 * min {
            log::debug!(
                "Unit {} too short to split ({:.4}s), pushing out instead",
                index,
                target.duration()
            );
            InsertionMethod::PushOut
        } else {
            method
        };

        let mut unit = match method {
            InsertionMethod::PushOut => {
                for later in &mut self.units[index..] {
                    later.shift(min);
                }
                Unit::new(kind, target.start, target.start + min)
            }
            InsertionMethod::SplitTime => {
                let midpoint = (target.start + target.end) / 2.0;
                self.units[index].start = midpoint;
                Unit::new(kind, target.start, midpoint)
            }
        };
        unit.selected = true;
        self.units.insert(index, unit);
        self.dirty = true;
    }

    /// Insert a selected unit of `duration` before `index`, pushing later
    /// units out by that duration
    pub fn insert_unit_with_duration(&mut self, kind: UnitKind, duration: f64, index: usize) {
        let duration = duration.max(self.min_unit_duration());

        if index >= self.units.len() {
            let start = self.end_time();
            self.push_selected(Unit::new(kind, start, start + duration));
            return;
        }

        for word in &mut self.words {
            word.open_gap_at(index);
        }
        let start = self.units[index].start;
        for later in &mut self.units[index..] {
            later.shift(duration);
        }
        let mut unit = Unit::new(kind, start, start + duration);
        unit.selected = true;
        self.units.insert(index, unit);
        self.dirty = true;
    }

    /// Append a unit verbatim; the caller keeps the sequence contiguous
    pub fn append_unit(&mut self, kind: UnitKind, start: f64, end: f64) {
        self.append_unit_record(Unit::new(kind, start, end));
    }

    pub fn append_unit_record(&mut self, unit: Unit) {
        self.units.push(unit);
        self.dirty = true;
    }

    fn push_selected(&mut self, mut unit: Unit) {
        unit.selected = true;
        self.units.push(unit);
        self.dirty = true;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // UNIT BOUNDARIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Move a unit's start, and the previous unit's end with it
    ///
    /// Returns the start actually applied after clamping both units to the
    /// minimum duration.
    pub fn modify_unit_start(&mut self, index: usize, proposed_start: f64) -> f64 {
        let min = self.min_unit_duration();
        let mut start = proposed_start.min(self.units[index].end - min);
        if index > 0 {
            start = start.max(self.units[index - 1].start + min);
            self.units[index - 1].end = start;
        }
        self.units[index].start = start;
        self.dirty = true;
        start
    }

    /// Move a unit's end, and the next unit's start with it
    ///
    /// Returns the end actually applied.
    pub fn modify_unit_end(&mut self, index: usize, proposed_end: f64) -> f64 {
        let min = self.min_unit_duration();
        let mut end = proposed_end.max(self.units[index].start + min);
        if index + 1 < self.units.len() {
            end = end.min(self.units[index + 1].end - min);
            self.units[index + 1].start = end;
        }
        self.units[index].end = end;
        self.dirty = true;
        end
    }

    /// Move a unit's start, carrying every earlier unit along rigidly
    pub fn push_unit_start(&mut self, index: usize, proposed_start: f64) -> f64 {
        let unit = self.units[index];
        let start = proposed_start.min(unit.end - self.min_unit_duration());
        let delta = start - unit.start;
        for earlier in &mut self.units[..index] {
            earlier.shift(delta);
        }
        self.units[index].start = start;
        self.dirty = true;
        start
    }

    /// Move a unit's end, carrying every later unit along rigidly
    pub fn push_unit_end(&mut self, index: usize, proposed_end: f64) -> f64 {
        let unit = self.units[index];
        let end = proposed_end.max(unit.start + self.min_unit_duration());
        let delta = end - unit.end;
        for later in &mut self.units[index + 1..] {
            later.shift(delta);
        }
        self.units[index].end = end;
        self.dirty = true;
        end
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SWAPS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Exchange two neighboring units, keeping the pair's overall span
    ///
    /// Each unit keeps its own duration; returns `secondary`.
    pub fn swap_adjacent_units(&mut self, primary: usize, secondary: usize) -> usize {
        assert!(
            primary + 1 == secondary || secondary + 1 == primary,
            "units {primary} and {secondary} are not adjacent"
        );
        let left = primary.min(secondary);
        let right = primary.max(secondary);
        let (left_unit, right_unit) = (self.units[left], self.units[right]);

        let mut moved_left = right_unit;
        moved_left.start = left_unit.start;
        moved_left.end = left_unit.start + right_unit.duration();

        let mut moved_right = left_unit;
        moved_right.start = moved_left.end;
        moved_right.end = right_unit.end;

        self.units[left] = moved_left;
        self.units[right] = moved_right;
        self.dirty = true;
        secondary
    }

    /// Swap two neighboring unit ranges and the words that exactly cover them
    ///
    /// The ranges must be adjacent. The later range is walked leftward past
    /// the earlier one unit by unit.
    /// Returns the word considered selected afterwards when both ranges
    /// were words, `None` otherwise.
    pub fn swap_unit_ranges(
        &mut self,
        primary_start: usize,
        primary_end: usize,
        secondary_start: usize,
        secondary_end: usize,
    ) -> Option<usize> {
        let left_start = primary_start.min(secondary_start);
        let left_end = primary_end.min(secondary_end);
        let right_start = primary_start.max(secondary_start);
        let right_end = primary_end.max(secondary_end);
        assert!(
            left_start <= left_end && left_end + 1 == right_start && right_start <= right_end,
            "unit ranges {primary_start}..={primary_end} and {secondary_start}..={secondary_end} are not adjacent"
        );
        self.check_unit_index(right_end);

        let left_word = self
            .words
            .iter()
            .rposition(|w| w.first == left_start && w.last == left_end);
        let right_word = self
            .words
            .iter()
            .rposition(|w| w.first == right_start && w.last == right_end);

        let steps = left_end - left_start + 1;
        for index in right_start..=right_end {
            let mut current = index;
            for _ in 0..steps {
                current = self.swap_adjacent_units(current, current - 1);
            }
        }

        match (left_word, right_word) {
            (Some(l), Some(r)) => {
                let left = self.words[l].clone();
                let right = self.words[r].clone();
                let new_left = Word::new(right.text, left.first, left.first + right.last - right.first);
                let new_right_first = new_left.last + 1;
                let new_right = Word::new(
                    left.text,
                    new_right_first,
                    new_right_first + left.last - left.first,
                );
                self.words[l] = new_left;
                self.words[r] = new_right;
                return Some(if self.word_selected(l) { l } else { r });
            }
            (None, Some(r)) => {
                let span = self.words[r].unit_count() - 1;
                self.words[r].first = left_start;
                self.words[r].last = left_start + span;
            }
            (Some(l), None) => {
                // The bare side is a single unit that now sits at left_start
                let span = self.words[l].unit_count() - 1;
                self.words[l].first = left_start + 1;
                self.words[l].last = left_start + 1 + span;
            }
            (None, None) => {}
        }
        None
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // WORD GROUPING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Label the units `first..=last` as a word
    ///
    /// Words already intersecting the range are ungrouped first.
    pub fn group_units_as_word(&mut self, text: impl Into<String>, first: usize, last: usize) {
        assert!(first <= last, "word range {first}..={last} is reversed");
        self.check_unit_index(last);

        self.ungroup(first, last);
        let place = self.words.iter().take_while(|w| w.first <= last).count();
        self.words.insert(place, Word::new(text, first, last));
        self.dirty = true;
    }

    /// Label the units between two existing boundaries as a word
    ///
    /// Both times must match a unit boundary; otherwise nothing changes and
    /// `false` is returned.
    pub fn group_units_as_word_by_time(&mut self, text: impl Into<String>, start_time: f64, end_time: f64) -> bool {
        let config = self.config;
        let first = self
            .units
            .iter()
            .rposition(|unit| config.same_time(unit.start, start_time));
        let last = self
            .units
            .iter()
            .rposition(|unit| config.same_time(unit.end, end_time));

        match (first, last) {
            (Some(first), Some(last)) if first <= last => {
                self.group_units_as_word(text, first, last);
                true
            }
            _ => {
                log::debug!(
                    "No unit boundaries at {:.4}s..{:.4}s, word not grouped",
                    start_time,
                    end_time
                );
                false
            }
        }
    }

    /// Remove word labels from the units `first..=last`
    ///
    /// Words inside the range (or enclosing it) are deleted; words hanging
    /// over one edge are trimmed back to that edge.
    pub fn ungroup(&mut self, first: usize, last: usize) {
        self.words.retain(|w| {
            let inside = w.first >= first && w.last <= last;
            let enclosing = w.first < first && w.last > last;
            !(inside || enclosing)
        });
        for word in &mut self.words {
            if word.first >= first && word.first <= last && word.last > last {
                word.first = last + 1;
            } else if word.first < first && word.last >= first && word.last <= last {
                word.last = first - 1;
            }
        }
        self.dirty = true;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // WORD TIMING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Move a word's start, rescaling its units proportionally
    ///
    /// A directly preceding word is resized with it unless
    /// `dont_touch_predecessor`; a preceding bare unit only limits the move.
    /// Returns the start actually applied.
    pub fn modify_word_start(&mut self, word_index: usize, proposed_start: f64, dont_touch_predecessor: bool) -> f64 {
        let (first, last) = (self.words[word_index].first, self.words[word_index].last);
        let start = self.units[first].start;
        let end = self.units[last].end;
        let proportions = self.proportions(first, last);

        if self.all_at_minimum(first, last) && proposed_start > start {
            return start;
        }

        let mut new_start = proposed_start;
        if self.preceded_by_word(word_index) {
            if !dont_touch_predecessor {
                new_start = self.modify_word_end(word_index - 1, new_start, true);
            }
        } else if first != 0 && new_start < start {
            new_start = self.modify_unit_end(first - 1, new_start);
        }

        if new_start < start {
            // Growing: the first boundary moves furthest, so set it first
            let applied = self.modify_unit_start(first, new_start);
            let duration = end - applied;
            let mut boundary = applied;
            for (offset, unit) in (first..last).enumerate() {
                boundary += duration * proportions[offset];
                self.modify_unit_start(unit + 1, boundary);
            }
        } else {
            let duration = end - new_start;
            for unit in (first..=last).rev() {
                let unit_start = self.units[unit].end - duration * proportions[unit - first];
                self.modify_unit_start(unit, unit_start);
            }
        }
        self.units[first].start
    }

    /// Move a word's end, rescaling its units proportionally
    ///
    /// Mirror of [`Timeline::modify_word_start`]. Returns the end actually
    /// applied.
    pub fn modify_word_end(&mut self, word_index: usize, proposed_end: f64, dont_touch_successor: bool) -> f64 {
        let (first, last) = (self.words[word_index].first, self.words[word_index].last);
        let start = self.units[first].start;
        let end = self.units[last].end;
        let proportions = self.proportions(first, last);

        if self.all_at_minimum(first, last) && proposed_end < end {
            return end;
        }

        let mut new_end = proposed_end;
        if self.followed_by_word(word_index) {
            if !dont_touch_successor {
                new_end = self.modify_word_start(word_index + 1, new_end, true);
            }
        } else if last + 1 != self.units.len() && new_end > end {
            new_end = self.modify_unit_start(last + 1, new_end);
        }

        if new_end > end {
            // Growing: the last boundary moves furthest, so set it first
            let applied = self.modify_unit_end(last, new_end);
            let duration = applied - start;
            let mut boundary = applied;
            for unit in (first..last).rev() {
                boundary -= duration * proportions[unit + 1 - first];
                self.modify_unit_end(unit, boundary);
            }
        } else {
            let duration = new_end - start;
            for unit in first..=last {
                let unit_end = self.units[unit].start + duration * proportions[unit - first];
                self.modify_unit_end(unit, unit_end);
            }
        }
        self.units[last].end
    }

    /// Each unit's share of the total duration of `first..=last`
    fn proportions(&self, first: usize, last: usize) -> Vec<f64> {
        let units = &self.units[first..=last];
        let total = units[units.len() - 1].end - units[0].start;
        if total <= 0.0 {
            return vec![1.0 / units.len() as f64; units.len()];
        }
        units.iter().map(|unit| unit.duration() / total).collect()
    }

    fn all_at_minimum(&self, first: usize, last: usize) -> bool {
        let limit = self.min_unit_duration() + self.config.boundary_epsilon;
        self.units[first..=last]
            .iter()
            .all(|unit| unit.duration() <= limit)
    }

    fn preceded_by_word(&self, word_index: usize) -> bool {
        word_index > 0 && self.words[word_index - 1].last + 1 == self.words[word_index].first
    }

    fn followed_by_word(&self, word_index: usize) -> bool {
        word_index + 1 < self.words.len()
            && self.words[word_index].last + 1 == self.words[word_index + 1].first
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPLICE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Merge another timeline into this one
    ///
    /// With no range, `other` is appended after the current end. With a
    /// range, units `start..=end` (`end` defaults to the last unit) are
    /// replaced by all of `other`; `other`'s times are offset to begin where
    /// the kept prefix ends and the kept suffix is moved to follow them.
    /// Words overlapping the replaced range are dropped.
    pub fn splice(&mut self, other: &Timeline, start: Option<usize>, end: Option<usize>) {
        if start.is_none() && end.is_none() {
            self.append_timeline(other);
            return;
        }

        assert!(!other.units.is_empty(), "cannot splice an empty timeline into a range");
        assert!(!self.units.is_empty(), "cannot replace a range of an empty timeline");
        let len = self.units.len();
        let start = start.unwrap_or(0);
        let end = end.unwrap_or(len - 1);
        assert!(start <= end, "splice range {start}..={end} is reversed");
        self.check_unit_index(end);

        let offset = if start > 0 { self.units[start - 1].end } else { 0.0 };
        let mut units = Vec::with_capacity(len - (end - start + 1) + other.units.len());
        units.extend_from_slice(&self.units[..start]);
        for (i, incoming) in other.units.iter().enumerate() {
            let mut unit = *incoming;
            unit.shift(offset);
            if i == 0 {
                unit.start = offset;
            }
            units.push(unit);
        }
        if end + 1 < len {
            let content_end = units.last().map_or(offset, |unit| unit.end);
            let delta = content_end - self.units[end + 1].start;
            units.extend(self.units[end + 1..].iter().map(|kept| {
                let mut unit = *kept;
                unit.shift(delta);
                unit
            }));
        }

        let removed = end - start + 1;
        let added = other.units.len();
        let mut words: Vec<Word> = self.words.iter().filter(|w| w.last < start).cloned().collect();
        words.extend(
            other
                .words
                .iter()
                .map(|w| Word::new(w.text.clone(), w.first + start, w.last + start)),
        );
        words.extend(
            self.words
                .iter()
                .filter(|w| w.first > end)
                .map(|w| Word::new(w.text.clone(), w.first - removed + added, w.last - removed + added)),
        );

        log::debug!(
            "Spliced {} units over {}..={} ({} units now)",
            added,
            start,
            end,
            units.len()
        );
        self.units = units;
        self.words = words;
        self.dirty = true;
    }

    fn append_timeline(&mut self, other: &Timeline) {
        let offset = self.end_time();
        let base = self.units.len();
        self.units.extend(other.units.iter().map(|incoming| {
            let mut unit = *incoming;
            unit.shift(offset);
            unit
        }));
        self.words.extend(
            other
                .words
                .iter()
                .map(|w| Word::new(w.text.clone(), w.first + base, w.last + base)),
        );
        self.dirty = true;
    }

    #[inline]
    pub(crate) fn check_unit_index(&self, index: usize) {
        assert!(
            index < self.units.len(),
            "unit index {index} out of range ({} units)",
            self.units.len()
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const A: UnitKind = UnitKind(1);
    const B: UnitKind = UnitKind(2);
    const C: UnitKind = UnitKind(3);

    fn timeline(durations: &[f64]) -> Timeline {
        let mut timeline = Timeline::new();
        let mut t = 0.0;
        for (i, d) in durations.iter().enumerate() {
            timeline.append_unit(UnitKind(i as u16 + 1), t, t + d);
            t += d;
        }
        timeline.clear_dirty_flag();
        timeline
    }

    fn spans(timeline: &Timeline) -> Vec<(f64, f64)> {
        timeline.units().iter().map(|u| (u.start, u.end)).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_remove_middle_unit_absorbed_by_successor() {
        let mut tl = timeline(&[1.0, 1.0, 1.0]);
        tl.remove_unit(1);
        assert_eq!(spans(&tl), vec![(0.0, 1.0), (1.0, 3.0)]);
        assert!(tl.is_dirty());
    }

    #[test]
    fn test_remove_first_and_last_unit() {
        let mut tl = timeline(&[1.0, 1.0, 1.0]);
        tl.remove_unit(0);
        assert_eq!(spans(&tl), vec![(0.0, 2.0), (2.0, 3.0)]);
        tl.remove_unit(1);
        assert_eq!(spans(&tl), vec![(0.0, 3.0)]);
    }

    #[test]
    fn test_remove_unit_updates_words() {
        let mut tl = timeline(&[0.1; 6]);
        tl.group_units_as_word("solo", 0, 0);
        tl.group_units_as_word("pair", 1, 2);
        tl.group_units_as_word("tail", 3, 5);

        tl.remove_unit(3);
        assert_eq!((tl.word(2).first, tl.word(2).last), (3, 4));

        tl.remove_unit(2);
        assert_eq!((tl.word(1).first, tl.word(1).last), (1, 1));
        assert_eq!((tl.word(2).first, tl.word(2).last), (2, 3));

        tl.remove_unit(0);
        assert_eq!(tl.word_count(), 2);
        assert_eq!(tl.word_text(0), "pair");
        assert_eq!((tl.word(0).first, tl.word(0).last), (0, 0));
        assert_eq!((tl.word(1).first, tl.word(1).last), (1, 2));
    }

    #[test]
    fn test_nuke_unit_shrinks_timeline() {
        let mut tl = timeline(&[1.0, 1.0, 1.0]);
        tl.nuke_unit(1);
        assert_eq!(spans(&tl), vec![(0.0, 1.0), (1.0, 2.0)]);

        let mut tl = timeline(&[1.0, 1.0, 1.0]);
        tl.nuke_unit(2);
        assert_eq!(spans(&tl), vec![(0.0, 1.0), (1.0, 2.0)]);

        let mut tl = timeline(&[1.0, 2.0]);
        tl.nuke_unit(0);
        assert_eq!(spans(&tl), vec![(0.0, 2.0)]);
    }

    #[test]
    fn test_insert_push_out() {
        let mut tl = timeline(&[1.0, 1.0]);
        tl.insert_unit(C, 1, InsertionMethod::PushOut);
        let s = spans(&tl);
        assert_eq!(s.len(), 3);
        assert!(close(s[1].0, 1.0) && close(s[1].1, 1.01));
        assert!(close(s[2].0, 1.01) && close(s[2].1, 2.01));
        assert_eq!(tl.unit_kind(1), C);
        assert!(tl.unit_selected(1));
    }

    #[test]
    fn test_insert_split_time() {
        let mut tl = timeline(&[1.0, 1.0]);
        tl.set_unit_selected(0, true);
        tl.insert_unit(C, 1, InsertionMethod::SplitTime);
        assert_eq!(spans(&tl), vec![(0.0, 1.0), (1.0, 1.5), (1.5, 2.0)]);
        assert!(!tl.unit_selected(0));
        assert!(tl.unit_selected(1));
    }

    #[test]
    fn test_insert_split_falls_back_on_short_unit() {
        let mut tl = timeline(&[1.0, 0.015]);
        tl.insert_unit(C, 1, InsertionMethod::SplitTime);
        assert!(close(tl.unit_duration(1), 0.01));
        assert!(close(tl.unit_duration(2), 0.015));
    }

    #[test]
    fn test_insert_at_end_and_into_empty() {
        let mut tl = Timeline::new();
        tl.insert_unit(A, 0, InsertionMethod::PushOut);
        assert_eq!(tl.unit_count(), 1);
        assert!(close(tl.unit_end(0), 0.01));

        tl.insert_unit_with_duration(B, 0.5, 7);
        assert!(close(tl.unit_start(1), 0.01));
        assert!(close(tl.unit_end(1), 0.51));
    }

    #[test]
    fn test_insert_shifts_word_indices() {
        let mut tl = timeline(&[0.2, 0.2, 0.2, 0.2]);
        tl.group_units_as_word("ab", 0, 1);
        tl.group_units_as_word("cd", 2, 3);

        tl.insert_unit_with_duration(C, 0.1, 1);
        assert_eq!((tl.word(0).first, tl.word(0).last), (0, 2));
        assert_eq!((tl.word(1).first, tl.word(1).last), (3, 4));
        assert!(close(tl.end_time(), 0.9));
    }

    #[test]
    fn test_modify_unit_boundaries_clamp() {
        let mut tl = timeline(&[1.0, 1.0]);
        let applied = tl.modify_unit_start(1, 5.0);
        assert!(close(applied, 1.99));
        assert!(close(tl.unit_end(0), 1.99));

        let applied = tl.modify_unit_end(0, -3.0);
        assert!(close(applied, 0.01));
        assert!(close(tl.unit_start(1), 0.01));

        let again = tl.modify_unit_end(0, applied);
        assert!(close(again, applied));
    }

    #[test]
    fn test_modify_unit_start_is_idempotent() {
        let mut tl = timeline(&[1.0, 1.0, 1.0]);
        let first = tl.modify_unit_start(1, -4.0);
        assert!(close(first, 0.01));
        let second = tl.modify_unit_start(1, -4.0);
        assert!(close(second, first));
        assert!(close(tl.unit_end(0), first));

        let first = tl.modify_unit_start(0, 9.0);
        assert!(close(first, tl.unit_end(0) - 0.01));
        let second = tl.modify_unit_start(0, 9.0);
        assert!(close(second, first));
        assert!(close(tl.unit_duration(0), 0.01));
    }

    #[test]
    fn test_nuke_first_unit_keeps_timeline_start() {
        let mut tl = Timeline::new();
        tl.append_unit(A, 0.5, 1.5);
        tl.append_unit(B, 1.5, 2.5);
        tl.append_unit(C, 2.5, 3.0);

        tl.nuke_unit(0);
        assert_eq!(tl.unit_count(), 2);
        assert!(close(tl.unit_start(0), 0.5));
        assert!(close(tl.unit_end(0), 1.5));
        assert!(close(tl.unit_end(1), 2.0));
    }

    #[test]
    fn test_push_unit_end_moves_following_units() {
        let mut tl = timeline(&[1.0, 1.0, 1.0]);
        let applied = tl.push_unit_end(0, 1.5);
        assert!(close(applied, 1.5));
        assert_eq!(spans(&tl), vec![(0.0, 1.5), (1.5, 2.5), (2.5, 3.5)]);
    }

    #[test]
    fn test_push_unit_start_moves_preceding_units() {
        let mut tl = timeline(&[1.0, 1.0, 1.0]);
        let applied = tl.push_unit_start(2, 2.5);
        assert!(close(applied, 2.5));
        assert_eq!(spans(&tl), vec![(0.5, 1.5), (1.5, 2.5), (2.5, 3.0)]);

        let clamped = tl.push_unit_start(2, 10.0);
        assert!(close(clamped, 2.99));
    }

    #[test]
    fn test_swap_adjacent_units() {
        let mut tl = timeline(&[1.0, 2.0]);
        assert_eq!(tl.swap_adjacent_units(0, 1), 1);
        assert_eq!(spans(&tl), vec![(0.0, 2.0), (2.0, 3.0)]);
        assert_eq!(tl.unit_kind(0), B);
        assert_eq!(tl.unit_kind(1), A);

        tl.swap_adjacent_units(1, 0);
        assert_eq!(spans(&tl), vec![(0.0, 1.0), (1.0, 3.0)]);
        assert_eq!(tl.unit_kind(0), A);
    }

    #[test]
    fn test_swap_word_ranges() {
        let mut tl = timeline(&[0.1, 0.2, 0.3, 0.4, 0.5]);
        tl.group_units_as_word("first", 0, 1);
        tl.group_units_as_word("second", 2, 4);
        tl.set_word_selected(1, true);

        let selected = tl.swap_unit_ranges(0, 1, 2, 4);
        assert_eq!(tl.word_text(0), "second");
        assert_eq!((tl.word(0).first, tl.word(0).last), (0, 2));
        assert_eq!(tl.word_text(1), "first");
        assert_eq!((tl.word(1).first, tl.word(1).last), (3, 4));
        assert_eq!(selected, Some(0));

        let kinds: Vec<u16> = tl.units().iter().map(|u| u.kind.0).collect();
        assert_eq!(kinds, vec![3, 4, 5, 1, 2]);
        assert!(close(tl.end_time(), 1.5));
    }

    #[test]
    fn test_swap_word_with_bare_unit() {
        let mut tl = timeline(&[0.1, 0.2, 0.3]);
        tl.group_units_as_word("word", 0, 1);
        assert_eq!(tl.swap_unit_ranges(0, 1, 2, 2), None);
        assert_eq!((tl.word(0).first, tl.word(0).last), (1, 2));
        assert_eq!(tl.unit_kind(0), C);

        let mut tl = timeline(&[0.1, 0.2, 0.3]);
        tl.group_units_as_word("word", 1, 2);
        assert_eq!(tl.swap_unit_ranges(1, 2, 0, 0), None);
        assert_eq!((tl.word(0).first, tl.word(0).last), (0, 1));
    }

    #[test]
    #[should_panic(expected = "not adjacent")]
    fn test_swap_unit_ranges_rejects_gap() {
        let mut tl = timeline(&[0.1, 0.2, 0.3]);
        tl.group_units_as_word("a", 0, 0);
        tl.group_units_as_word("b", 2, 2);
        tl.swap_unit_ranges(0, 0, 2, 2);
    }

    #[test]
    fn test_find_unit_at() {
        let tl = timeline(&[1.0, 1.0]);
        assert_eq!(tl.find_unit_at(0.0), Some(0));
        assert_eq!(tl.find_unit_at(1.0), Some(1));
        assert_eq!(tl.find_unit_at(2.0), None);
        assert_eq!(tl.find_unit_at(-0.1), None);
    }

    #[test]
    fn test_group_keeps_words_ordered() {
        let mut tl = timeline(&[0.1; 8]);
        tl.group_units_as_word("late", 5, 6);
        tl.group_units_as_word("early", 0, 1);
        tl.group_units_as_word("middle", 2, 3);
        let texts: Vec<&str> = tl.words().iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_group_ungroups_intersecting_words() {
        let mut tl = timeline(&[0.1; 8]);
        tl.group_units_as_word("left", 0, 2);
        tl.group_units_as_word("right", 4, 6);
        tl.group_units_as_word("inside", 3, 3);

        tl.group_units_as_word("new", 2, 4);
        let ranges: Vec<(&str, usize, usize)> =
            tl.words().iter().map(|w| (w.text.as_str(), w.first, w.last)).collect();
        assert_eq!(ranges, vec![("left", 0, 1), ("new", 2, 4), ("right", 5, 6)]);
    }

    #[test]
    fn test_group_inside_word_replaces_it() {
        let mut tl = timeline(&[0.1; 5]);
        tl.group_units_as_word("long", 0, 4);
        tl.group_units_as_word("short", 1, 2);
        assert_eq!(tl.word_count(), 1);
        assert_eq!(tl.word_text(0), "short");
    }

    #[test]
    fn test_group_by_time() {
        let mut tl = timeline(&[0.25, 0.25, 0.5]);
        assert!(tl.group_units_as_word_by_time("hi", 0.25, 1.0));
        assert_eq!((tl.word(0).first, tl.word(0).last), (1, 2));

        assert!(!tl.group_units_as_word_by_time("miss", 0.3, 1.0));
        assert!(!tl.group_units_as_word_by_time("reversed", 0.5, 0.25));
        assert_eq!(tl.word_count(), 1);
    }

    #[test]
    fn test_modify_word_end_grows_proportionally() {
        let mut tl = timeline(&[0.5, 1.5]);
        tl.group_units_as_word("w", 0, 1);
        let applied = tl.modify_word_end(0, 2.4, false);
        assert!(close(applied, 2.4));
        assert!(close(tl.unit_duration(0), 0.6));
        assert!(close(tl.unit_duration(1), 1.8));
    }

    #[test]
    fn test_modify_word_end_large_growth_keeps_proportions() {
        let mut tl = timeline(&[1.9, 0.1]);
        tl.group_units_as_word("w", 0, 1);
        tl.modify_word_end(0, 4.0, false);
        assert!(close(tl.unit_duration(0), 3.8));
        assert!(close(tl.unit_duration(1), 0.2));
    }

    #[test]
    fn test_modify_word_start_shrinks_proportionally() {
        let mut tl = timeline(&[1.0, 1.0, 3.0]);
        tl.group_units_as_word("w", 1, 2);
        let applied = tl.modify_word_start(0, 3.0, false);
        assert!(close(applied, 3.0));
        assert!(close(tl.unit_duration(0), 3.0));
        assert!(close(tl.unit_duration(1), 0.5));
        assert!(close(tl.unit_duration(2), 1.5));
    }

    #[test]
    fn test_modify_word_start_limited_by_bare_predecessor() {
        let mut tl = timeline(&[1.0, 1.0]);
        tl.group_units_as_word("w", 1, 1);
        let applied = tl.modify_word_start(0, -5.0, false);
        assert!(close(applied, 0.01));
        assert!(close(tl.unit_duration(0), 0.01));
    }

    #[test]
    fn test_modify_word_start_at_minimum_is_noop() {
        let mut tl = timeline(&[1.0, 0.01, 0.01]);
        tl.group_units_as_word("w", 1, 2);
        let applied = tl.modify_word_start(0, 1.005, false);
        assert!(close(applied, 1.0));
        assert!(close(tl.unit_start(1), 1.0));
        assert!(close(tl.unit_end(2), 1.02));
    }

    #[test]
    fn test_modify_word_end_moves_successor_word() {
        let mut tl = timeline(&[1.0, 1.0, 1.0, 1.0]);
        tl.group_units_as_word("one", 0, 1);
        tl.group_units_as_word("two", 2, 3);

        let applied = tl.modify_word_end(0, 3.0, false);
        assert!(close(applied, 3.0));
        assert!(close(tl.word_start(1), 3.0));
        assert!(close(tl.unit_duration(0), 1.5));
        assert!(close(tl.unit_duration(1), 1.5));
        assert!(close(tl.unit_duration(2), 0.5));
        assert!(close(tl.unit_duration(3), 0.5));
        assert!(close(tl.end_time(), 4.0));
    }

    #[test]
    fn test_splice_append() {
        let mut tl = timeline(&[1.0, 1.0]);
        tl.group_units_as_word("a", 0, 1);
        let mut other = timeline(&[0.5, 0.5]);
        other.group_units_as_word("b", 0, 1);

        tl.splice(&other, None, None);
        assert_eq!(spans(&tl), vec![(0.0, 1.0), (1.0, 2.0), (2.0, 2.5), (2.5, 3.0)]);
        assert_eq!((tl.word(1).first, tl.word(1).last), (2, 3));
    }

    #[test]
    fn test_splice_range_replaces_middle() {
        let mut tl = timeline(&[1.0, 1.0, 1.0, 1.0]);
        tl.group_units_as_word("head", 0, 0);
        tl.group_units_as_word("gone", 1, 2);
        tl.group_units_as_word("tail", 3, 3);
        let mut other = timeline(&[0.25, 0.25, 0.25]);
        other.group_units_as_word("new", 0, 2);

        tl.splice(&other, Some(1), Some(2));
        assert_eq!(
            spans(&tl),
            vec![(0.0, 1.0), (1.0, 1.25), (1.25, 1.5), (1.5, 1.75), (1.75, 2.75)]
        );
        let ranges: Vec<(&str, usize, usize)> =
            tl.words().iter().map(|w| (w.text.as_str(), w.first, w.last)).collect();
        assert_eq!(ranges, vec![("head", 0, 0), ("new", 1, 3), ("tail", 4, 4)]);
    }

    #[test]
    fn test_splice_range_to_end() {
        let mut tl = timeline(&[1.0, 1.0, 1.0]);
        let other = timeline(&[0.5]);
        tl.splice(&other, Some(1), None);
        assert_eq!(spans(&tl), vec![(0.0, 1.0), (1.0, 1.5)]);
    }

    #[test]
    fn test_plain_sequence() {
        let tl = timeline(&[0.5, 0.25]);
        let plain = tl.to_plain_sequence();
        assert_eq!(plain.len(), 2);
        assert_eq!(plain[1].kind, B);
        assert!(close(plain[1].start, 0.5));
        assert!(close(plain[1].end, 0.75));
    }

    #[test]
    fn test_clone_drops_anchor() {
        let mut tl = timeline(&[1.0, 1.0]);
        tl.start_selection(Some(Endpoint::Unit(0)), true);
        let copy = tl.clone();
        assert!(copy.anchor.is_none());
        assert!(copy.unit_selected(0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_remove_out_of_range_panics() {
        let mut tl = timeline(&[1.0]);
        tl.remove_unit(1);
    }
}
