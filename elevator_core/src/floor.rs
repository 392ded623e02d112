//! Floor table, floor codes and the current-floor estimator.

use std::collections::HashSet;
use std::fmt;

use crate::error::BuildError;

/// Wire byte identifying a physical floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FloorCode(pub u8);

impl FloorCode {
    pub const fn byte(self) -> u8 {
        self.0
    }
}

impl fmt::Display for FloorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

pub const FLOOR1: FloorCode = FloorCode(0x05);
pub const FLOOR2: FloorCode = FloorCode(0x06);
pub const FLOOR3: FloorCode = FloorCode(0x07);

pub const FLOOR1_SP: u16 = 100;
pub const FLOOR2_SP: u16 = 300;
pub const FLOOR3_SP: u16 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorEntry {
    pub code: FloorCode,
    pub setpoint_mm: u16,
    pub label: String,
}

impl FloorEntry {
    pub fn new(code: u8, setpoint_mm: u16, label: impl Into<String>) -> Self {
        Self {
            code: FloorCode(code),
            setpoint_mm,
            label: label.into(),
        }
    }
}

/// Ordered, non-empty list of floors. Table order is the estimator's priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorTable {
    entries: Vec<FloorEntry>,
    default_index: usize,
}

impl Default for FloorTable {
    fn default() -> Self {
        Self {
            entries: vec![
                FloorEntry::new(FLOOR1.0, FLOOR1_SP, "Floor 1"),
                FloorEntry::new(FLOOR2.0, FLOOR2_SP, "Floor 2"),
                FloorEntry::new(FLOOR3.0, FLOOR3_SP, "Floor 3"),
            ],
            default_index: 0,
        }
    }
}

impl FloorTable {
    /// Build a table; the first entry is the default floor.
    ///
    /// Codes must be non-zero (0x00 is reserved for "unknown" on the wire) and unique.
    pub fn new(entries: Vec<FloorEntry>) -> Result<Self, BuildError> {
        if entries.is_empty() {
            return Err(BuildError::InvalidConfig("floor table must not be empty"));
        }
        let mut seen = HashSet::with_capacity(entries.len());
        for e in &entries {
            if e.code.0 == 0 {
                return Err(BuildError::InvalidConfig("floor code 0x00 is reserved"));
            }
            if !seen.insert(e.code) {
                return Err(BuildError::InvalidConfig("duplicate floor code"));
            }
            if e.label.trim().is_empty() {
                return Err(BuildError::InvalidConfig("floor label must not be empty"));
            }
        }
        Ok(Self {
            entries,
            default_index: 0,
        })
    }

    /// Select which floor the car starts at.
    pub fn with_default(mut self, code: FloorCode) -> Result<Self, BuildError> {
        self.default_index = self
            .entries
            .iter()
            .position(|e| e.code == code)
            .ok_or(BuildError::InvalidConfig("default floor is not in the table"))?;
        Ok(self)
    }

    pub fn entries(&self) -> &[FloorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn default_entry(&self) -> &FloorEntry {
        &self.entries[self.default_index]
    }

    pub fn get(&self, code: FloorCode) -> Option<&FloorEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    /// Map a received payload byte to a floor. Unknown bytes yield `None`.
    pub fn interpret(&self, payload: u8) -> Option<&FloorEntry> {
        self.get(FloorCode(payload))
    }

    /// Whether `mm` is one of the table setpoints.
    pub fn contains_setpoint(&self, mm: u16) -> bool {
        self.entries.iter().any(|e| e.setpoint_mm == mm)
    }
}

/// Last floor the car was seen at. Sticky: once known it never returns to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurrentFloor {
    #[default]
    Unknown,
    At(FloorCode),
}

impl CurrentFloor {
    /// Status payload; `Unknown` is sent as 0x00.
    pub fn wire_byte(self) -> u8 {
        match self {
            Self::Unknown => 0x00,
            Self::At(code) => code.0,
        }
    }

    pub fn code(self) -> Option<FloorCode> {
        match self {
            Self::Unknown => None,
            Self::At(code) => Some(code),
        }
    }
}

impl fmt::Display for CurrentFloor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::At(code) => write!(f, "{code}"),
        }
    }
}

/// Re-estimate the current floor from a distance reading.
///
/// The first entry (in table order) whose setpoint is within `band_mm` of the
/// reading wins. Readings between floors keep `previous`.
pub fn estimate(
    table: &FloorTable,
    distance_mm: u16,
    previous: CurrentFloor,
    band_mm: u16,
) -> CurrentFloor {
    table
        .entries()
        .iter()
        .find(|e| distance_mm.abs_diff(e.setpoint_mm) <= band_mm)
        .map_or(previous, |e| CurrentFloor::At(e.code))
}
