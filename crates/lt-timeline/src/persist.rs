//! Timeline persistence
//!
//! Two persisted forms share one version history:
//! - Binary: little-endian, written by `write_to` / read by `read_from`
//! - JSON: `TimelineDocument`, for tooling and debugging
//!
//! Format history:
//! - v0: units, words (single-byte text)
//! - v1: adds `min_unit_duration`
//! - v2: word text stored as UTF-8
//!
//! Binary layout (v2):
//! ```text
//! u16 version
//! u16 array version, u32 count, count × { u16 kind, f64 start, f64 end }
//! u16 array version, u32 count, count × { u32 len, len × u8 text, u32 first, u32 last }
//! f64 min_unit_duration            (v1+)
//! ```
//!
//! Selection is never persisted.

use std::io::{Read, Write};

use lt_core::{LtError, LtResult, UnitKind, real_eq};
use serde::{Deserialize, Serialize};

use crate::config::{LEGACY_MIN_UNIT_DURATION, TimelineConfig};
use crate::timeline::Timeline;
use crate::unit::{Unit, Word};

/// Version written by this build
pub const CURRENT_VERSION: u16 = 2;

/// First version that stores `min_unit_duration`
const MIN_DURATION_VERSION: u16 = 1;

/// First version that stores word text as UTF-8
const UTF8_TEXT_VERSION: u16 = 2;

/// Layout version of the array headers
const ARRAY_VERSION: u16 = 1;

/// Maximum number of units accepted on load
pub const MAX_UNITS: usize = 1_000_000;
/// Maximum number of words accepted on load
pub const MAX_WORDS: usize = 250_000;
/// Maximum encoded length of one word's text
pub const MAX_WORD_TEXT_BYTES: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════════
// BINARY FORM
// ═══════════════════════════════════════════════════════════════════════════════

impl Timeline {
    /// Write the current binary form
    pub fn write_to<W: Write>(&self, writer: &mut W) -> LtResult<()> {
        write_with_version(self, writer, CURRENT_VERSION)
    }

    /// Read any supported binary version, migrating it to the current one
    pub fn read_from<R: Read>(reader: &mut R) -> LtResult<Self> {
        let version = read_u16(reader)?;
        if version > CURRENT_VERSION {
            return Err(LtError::FutureVersion(version));
        }

        let unit_count = read_array_header(reader, "units", MAX_UNITS)?;
        let mut units = Vec::with_capacity(unit_count);
        for _ in 0..unit_count {
            let kind = UnitKind::from(read_u16(reader)?);
            let start = read_f64(reader)?;
            let end = read_f64(reader)?;
            units.push(Unit::new(kind, start, end));
        }

        let word_count = read_array_header(reader, "words", MAX_WORDS)?;
        let mut words = Vec::with_capacity(word_count);
        for _ in 0..word_count {
            let text = read_text(reader, version)?;
            let first = read_u32(reader)? as usize;
            let last = read_u32(reader)? as usize;
            words.push(Word::new(text, first, last));
        }

        let stored_min = if version >= MIN_DURATION_VERSION {
            Some(read_f64(reader)?)
        } else {
            None
        };

        validate_and_migrate(version, units, words, stored_min)
    }

    /// Binary form in a fresh buffer
    pub fn to_bytes(&self) -> LtResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn from_bytes(mut bytes: &[u8]) -> LtResult<Self> {
        Self::read_from(&mut bytes)
    }
}

fn write_with_version<W: Write>(timeline: &Timeline, writer: &mut W, version: u16) -> LtResult<()> {
    writer.write_all(&version.to_le_bytes())?;

    write_array_header(writer, timeline.units.len())?;
    for unit in &timeline.units {
        writer.write_all(&unit.kind.as_u16().to_le_bytes())?;
        writer.write_all(&unit.start.to_le_bytes())?;
        writer.write_all(&unit.end.to_le_bytes())?;
    }

    write_array_header(writer, timeline.words.len())?;
    for word in &timeline.words {
        let text = encode_text(&word.text, version);
        writer.write_all(&(text.len() as u32).to_le_bytes())?;
        writer.write_all(&text)?;
        writer.write_all(&(word.first as u32).to_le_bytes())?;
        writer.write_all(&(word.last as u32).to_le_bytes())?;
    }

    if version >= MIN_DURATION_VERSION {
        writer.write_all(&timeline.min_unit_duration().to_le_bytes())?;
    }
    Ok(())
}

fn write_array_header<W: Write>(writer: &mut W, count: usize) -> LtResult<()> {
    writer.write_all(&ARRAY_VERSION.to_le_bytes())?;
    writer.write_all(&(count as u32).to_le_bytes())?;
    Ok(())
}

fn read_array_header<R: Read>(reader: &mut R, what: &'static str, max: usize) -> LtResult<usize> {
    let array_version = read_u16(reader)?;
    if array_version > ARRAY_VERSION {
        return Err(LtError::FutureVersion(array_version));
    }
    let count = read_u32(reader)? as usize;
    if count > max {
        return Err(LtError::LimitExceeded { what, count, max });
    }
    Ok(count)
}

/// Word text bytes; single-byte versions replace anything outside Latin-1
fn encode_text(text: &str, version: u16) -> Vec<u8> {
    if version >= UTF8_TEXT_VERSION {
        return text.as_bytes().to_vec();
    }
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn read_text<R: Read>(reader: &mut R, version: u16) -> LtResult<String> {
    let len = read_u32(reader)? as usize;
    if len > MAX_WORD_TEXT_BYTES {
        return Err(LtError::LimitExceeded {
            what: "word text bytes",
            count: len,
            max: MAX_WORD_TEXT_BYTES,
        });
    }
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;

    if version >= UTF8_TEXT_VERSION {
        String::from_utf8(bytes).map_err(|_| LtError::InvalidData("Invalid UTF-8 in word text".to_string()))
    } else {
        Ok(bytes.into_iter().map(char::from).collect())
    }
}

fn read_u16<R: Read>(reader: &mut R) -> LtResult<u16> {
    let mut bytes = [0u8; 2];
    reader.read_exact(&mut bytes)?;
    Ok(u16::from_le_bytes(bytes))
}

fn read_u32<R: Read>(reader: &mut R) -> LtResult<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_f64<R: Read>(reader: &mut R) -> LtResult<f64> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok(f64::from_le_bytes(bytes))
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON FORM
// ═══════════════════════════════════════════════════════════════════════════════

/// Serializable snapshot of a timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDocument {
    pub version: u16,
    pub units: Vec<Unit>,
    #[serde(default)]
    pub words: Vec<Word>,
    /// Absent in v0 documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_unit_duration: Option<f64>,
}

impl TimelineDocument {
    pub fn to_json(&self) -> LtResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LtError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> LtResult<Self> {
        serde_json::from_str(json).map_err(|e| LtError::Serialization(e.to_string()))
    }
}

impl Timeline {
    /// Snapshot in the current version
    pub fn to_document(&self) -> TimelineDocument {
        TimelineDocument {
            version: CURRENT_VERSION,
            units: self.units.iter().map(|unit| Unit::new(unit.kind, unit.start, unit.end)).collect(),
            words: self.words.clone(),
            min_unit_duration: Some(self.min_unit_duration()),
        }
    }

    /// Rebuild from a document of any supported version
    pub fn from_document(document: TimelineDocument) -> LtResult<Self> {
        if document.version > CURRENT_VERSION {
            return Err(LtError::FutureVersion(document.version));
        }
        if document.units.len() > MAX_UNITS {
            return Err(LtError::LimitExceeded {
                what: "units",
                count: document.units.len(),
                max: MAX_UNITS,
            });
        }
        if document.words.len() > MAX_WORDS {
            return Err(LtError::LimitExceeded {
                what: "words",
                count: document.words.len(),
                max: MAX_WORDS,
            });
        }
        let stored_min = if document.version >= MIN_DURATION_VERSION {
            document.min_unit_duration
        } else {
            None
        };
        validate_and_migrate(document.version, document.units, document.words, stored_min)
    }

    pub fn to_json(&self) -> LtResult<String> {
        self.to_document().to_json()
    }

    pub fn from_json(json: &str) -> LtResult<Self> {
        Self::from_document(TimelineDocument::from_json(json)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION / MIGRATION
// ═══════════════════════════════════════════════════════════════════════════════

fn validate_and_migrate(
    version: u16,
    mut units: Vec<Unit>,
    words: Vec<Word>,
    stored_min: Option<f64>,
) -> LtResult<Timeline> {
    for (index, unit) in units.iter_mut().enumerate() {
        if !unit.start.is_finite() || !unit.end.is_finite() || unit.end <= unit.start {
            return Err(LtError::InvalidData(format!(
                "Unit {} has invalid span {}..{}",
                index, unit.start, unit.end
            )));
        }
        unit.selected = false;
    }

    let gaps = units
        .windows(2)
        .filter(|pair| !real_eq(pair[0].end, pair[1].start))
        .count();
    if gaps > 0 {
        log::warn!("Loaded timeline has {} non-contiguous unit boundaries", gaps);
    }

    for (index, word) in words.iter().enumerate() {
        if word.first > word.last || word.last >= units.len() {
            return Err(LtError::InvalidData(format!(
                "Word {} ({:?}) has invalid unit range {}..={} ({} units)",
                index,
                word.text,
                word.first,
                word.last,
                units.len()
            )));
        }
    }
    for (index, pair) in words.windows(2).enumerate() {
        if pair[0].overlaps(&pair[1]) || pair[1].first < pair[0].first {
            return Err(LtError::InvalidData(format!(
                "Word {} ({:?}) overlaps or precedes the previous word",
                index + 1,
                pair[1].text
            )));
        }
    }

    let min_unit_duration = migrate_min_unit_duration(version, stored_min);
    let config = TimelineConfig {
        min_unit_duration,
        ..TimelineConfig::default()
    }
    .validated()?;

    Ok(Timeline::from_parts(units, words, config))
}

fn migrate_min_unit_duration(version: u16, stored: Option<f64>) -> f64 {
    match stored {
        Some(min) => min,
        None => {
            log::info!(
                "Migrating timeline from v{} to v{}: min_unit_duration defaults to {}",
                version,
                CURRENT_VERSION,
                LEGACY_MIN_UNIT_DURATION
            );
            LEGACY_MIN_UNIT_DURATION
        }
    }
}
