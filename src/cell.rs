//! Cell identifiers - the fixed (mission, variant) space of a results sheet
//!
//! A results sheet holds one thumbnail per mission per medal tier. Cells are
//! never stored; they are enumerated in a fixed order on every run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of missions on the sheet (grid rows).
pub const MISSION_COUNT: u32 = 15;

/// Number of result variants per mission (grid columns).
pub const VARIANT_COUNT: u32 = 4;

/// Total number of cells in one run.
pub const CELL_COUNT: usize = (MISSION_COUNT * VARIANT_COUNT) as usize;

/// Result tier shown on a mission thumbnail.
///
/// Declaration order is the column order on the sheet and the enumeration
/// order of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Fail,
    Bronze,
    Silver,
    Gold,
}

impl Variant {
    /// All variants in column order.
    pub const ALL: [Variant; 4] = [Variant::Fail, Variant::Bronze, Variant::Silver, Variant::Gold];

    /// The variant written without a suffix (`{id}.webp`).
    pub const DEFAULT: Variant = Variant::Bronze;

    /// Lowercase name used in atlas keys and filenames.
    pub fn name(self) -> &'static str {
        match self {
            Variant::Fail => "fail",
            Variant::Bronze => "bronze",
            Variant::Silver => "silver",
            Variant::Gold => "gold",
        }
    }

    /// Column index on the sheet (0-based).
    pub fn column(self) -> u32 {
        match self {
            Variant::Fail => 0,
            Variant::Bronze => 1,
            Variant::Silver => 2,
            Variant::Gold => 3,
        }
    }

    /// Map a medal code to a variant.
    ///
    /// Codes are clamped to `0..=3` (0=fail, 1=bronze, 2=silver, 3=gold), so
    /// out-of-range values land on the nearest tier.
    pub fn from_medal_code(code: i32) -> Variant {
        Variant::ALL[code.clamp(0, 3) as usize]
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One logical slot on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    /// Mission number, `1..=MISSION_COUNT`
    pub mission_id: u32,
    pub variant: Variant,
}

impl CellId {
    /// Create a cell id, rejecting mission numbers outside `1..=MISSION_COUNT`.
    pub fn new(mission_id: u32, variant: Variant) -> Option<Self> {
        if (1..=MISSION_COUNT).contains(&mission_id) {
            Some(Self { mission_id, variant })
        } else {
            None
        }
    }

    /// Grid row (0-based).
    pub fn row(&self) -> u32 {
        self.mission_id - 1
    }

    /// Grid column (0-based).
    pub fn column(&self) -> u32 {
        self.variant.column()
    }

    /// Atlas frame key, `"{mission_id}_{variant}"`.
    pub fn frame_key(&self) -> String {
        format!("{}_{}", self.mission_id, self.variant.name())
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.mission_id, self.variant)
    }
}

/// Enumerate every cell: missions ascending, variants in column order.
pub fn all_cells() -> impl Iterator<Item = CellId> {
    (1..=MISSION_COUNT).flat_map(mission_cells)
}

/// The four cells of one mission, in column order.
pub fn mission_cells(mission_id: u32) -> impl Iterator<Item = CellId> {
    Variant::ALL.into_iter().map(move |variant| CellId { mission_id, variant })
}
