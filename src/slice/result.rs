//! Slice result types.
//!
//! Contains types for representing the outcome of a slicing run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cell::{CellId, CELL_COUNT};
use crate::extract::ExtractError;
use crate::region::Strategy;
use crate::source::SourceOrigin;

/// Why a cell produced no thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The atlas has no frame for this cell
    MissingEntry { key: String },
    /// The resolved rectangle could not be cropped
    InvalidRect(ExtractError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingEntry { key } => write!(f, "no atlas frame '{}'", key),
            SkipReason::InvalidRect(err) => write!(f, "{}", err),
        }
    }
}

/// Outcome of a single cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellOutcome {
    Written(PathBuf),
    Skipped(SkipReason),
}

impl CellOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, CellOutcome::Written(_))
    }
}

/// A cell paired with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellResult {
    pub cell: CellId,
    pub outcome: CellOutcome,
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct SliceReport {
    /// One entry per cell, in enumeration order
    pub cells: Vec<CellResult>,
    pub strategy: Strategy,
    pub out_dir: PathBuf,
    pub source_origin: SourceOrigin,
    pub duration: Duration,
}

impl SliceReport {
    /// Number of thumbnails written.
    pub fn written_count(&self) -> usize {
        self.cells.iter().filter(|c| c.outcome.is_written()).count()
    }

    /// Number of cells a complete run writes.
    pub fn expected_count(&self) -> usize {
        CELL_COUNT
    }

    /// Whether every cell was written.
    pub fn is_complete(&self) -> bool {
        self.written_count() == self.expected_count()
    }

    /// Paths of written thumbnails, in enumeration order.
    pub fn written_paths(&self) -> Vec<&Path> {
        self.cells
            .iter()
            .filter_map(|c| match &c.outcome {
                CellOutcome::Written(path) => Some(path.as_path()),
                CellOutcome::Skipped(_) => None,
            })
            .collect()
    }

    /// Skipped cells with their reasons.
    pub fn skipped(&self) -> Vec<(CellId, &SkipReason)> {
        self.cells
            .iter()
            .filter_map(|c| match &c.outcome {
                CellOutcome::Skipped(reason) => Some((c.cell, reason)),
                CellOutcome::Written(_) => None,
            })
            .collect()
    }
}
