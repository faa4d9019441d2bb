//! Region resolution - map a cell to a pixel rectangle on the actual sheet
//!
//! Two strategies share the [`RegionResolver`] trait:
//!
//! - [`AtlasResolver`] scales named reference rectangles to the sheet size.
//! - [`GridResolver`] divides the sheet evenly into 15 rows x 4 columns.
//!
//! All coordinates are truncated toward zero, never rounded, so the same
//! sheet always yields the same rectangles.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::atlas::ReferenceMeta;
use crate::cell::{CellId, MISSION_COUNT, VARIANT_COUNT};

/// Default canonical thumbnail size for atlas mode (one reference frame).
pub const DEFAULT_THUMB_SIZE: (u32, u32) = (800, 597);

/// Which resolver a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Named rectangles from atlas metadata
    #[default]
    Atlas,
    /// Even 15x4 grid over the whole sheet
    Grid,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Atlas => write!(f, "atlas"),
            Strategy::Grid => write!(f, "grid"),
        }
    }
}

/// Pixel rectangle in source-image space, `[x1, x2) x [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Width, zero when the rectangle is inverted.
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    /// Height, zero when the rectangle is inverted.
    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Whether the rectangle is non-empty and lies inside a `width x height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        !self.is_empty() && self.x2 <= width && self.y2 <= height
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Resolve cells to pixel rectangles on a sheet of a given size.
pub trait RegionResolver: Send + Sync {
    /// Rectangle for `cell`, or `None` if this resolver has nothing for it.
    fn resolve_rect(&self, cell: CellId, source_width: u32, source_height: u32)
        -> Option<PixelRect>;

    /// Size every extracted cell is resampled to, if any.
    fn target_size(&self) -> Option<(u32, u32)> {
        None
    }

    /// Which strategy this is.
    fn strategy(&self) -> Strategy;
}

/// Truncate a real coordinate to a pixel index.
///
/// `None` for negative or non-finite values: such a coordinate lies off the
/// sheet and the rectangle cannot be cropped as authored.
fn truncate(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 {
        None
    } else {
        Some(value.floor().min(u32::MAX as f64) as u32)
    }
}

/// Atlas-driven resolver.
#[derive(Debug, Clone)]
pub struct AtlasResolver {
    meta: ReferenceMeta,
    target_size: Option<(u32, u32)>,
}

impl AtlasResolver {
    /// Create a resolver that resamples every cell to [`DEFAULT_THUMB_SIZE`].
    pub fn new(meta: ReferenceMeta) -> Self {
        Self { meta, target_size: Some(DEFAULT_THUMB_SIZE) }
    }

    /// Set the canonical output size. `None` keeps native crop sizes.
    pub fn with_target_size(mut self, target_size: Option<(u32, u32)>) -> Self {
        self.target_size = target_size;
        self
    }

}

impl RegionResolver for AtlasResolver {
    fn resolve_rect(
        &self,
        cell: CellId,
        source_width: u32,
        source_height: u32,
    ) -> Option<PixelRect> {
        let frame = self.meta.frame(&cell.frame_key())?;
        let (ref_w, ref_h) = self.meta.reference_size_or(source_width, source_height);
        let scale_x = source_width as f64 / ref_w;
        let scale_y = source_height as f64 / ref_h;

        let edges = (
            truncate(frame.x * scale_x),
            truncate(frame.y * scale_y),
            truncate((frame.x + frame.w) * scale_x),
            truncate((frame.y + frame.h) * scale_y),
        );
        match edges {
            (Some(x1), Some(y1), Some(x2), Some(y2)) => Some(PixelRect { x1, y1, x2, y2 }),
            // Off-sheet origin: an empty rect, which extraction rejects
            _ => Some(PixelRect::default()),
        }
    }

    fn target_size(&self) -> Option<(u32, u32)> {
        self.target_size
    }

    fn strategy(&self) -> Strategy {
        Strategy::Atlas
    }
}

/// Fixed-grid resolver: rows are missions, columns are variants.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridResolver;

impl GridResolver {
    pub fn new() -> Self {
        Self
    }

    /// Cell size as real values (`width / 4`, `height / 15`).
    pub fn cell_size(source_width: u32, source_height: u32) -> (f64, f64) {
        (
            source_width as f64 / VARIANT_COUNT as f64,
            source_height as f64 / MISSION_COUNT as f64,
        )
    }
}

/// `floor(index * extent / count)`, exact for shared edges between cells.
fn grid_edge(index: u32, extent: u32, count: u32) -> u32 {
    (index as u64 * extent as u64 / count as u64) as u32
}

impl RegionResolver for GridResolver {
    fn resolve_rect(
        &self,
        cell: CellId,
        source_width: u32,
        source_height: u32,
    ) -> Option<PixelRect> {
        let row = cell.row();
        let col = cell.column();

        Some(PixelRect {
            x1: grid_edge(col, source_width, VARIANT_COUNT),
            y1: grid_edge(row, source_height, MISSION_COUNT),
            x2: grid_edge(col + 1, source_width, VARIANT_COUNT),
            y2: grid_edge(row + 1, source_height, MISSION_COUNT),
        })
    }

    fn strategy(&self) -> Strategy {
        Strategy::Grid
    }
}
