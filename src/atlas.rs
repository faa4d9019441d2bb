//! Atlas metadata - named reference rectangles on a results sheet
//!
//! The atlas is authored against a reference resolution. Rectangles are kept
//! in reference space here; scaling to the actual sheet happens in
//! [`crate::region::AtlasResolver`].
//!
//! On disk the atlas is JSON:
//!
//! ```json
//! {
//!   "meta": { "width": 3200, "height": 8955 },
//!   "frames": {
//!     "1_fail": { "x": 0, "y": 0, "w": 800, "h": 597 },
//!     "1_gold": { "x": 2400, "y": 0, "w": 800, "h": 597 }
//!   }
//! }
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cell::all_cells;

/// Error loading atlas metadata
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AtlasError {
    /// The atlas file could not be read
    #[error("Failed to read atlas '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The atlas file is not valid atlas JSON
    #[error("Failed to parse atlas '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// `meta.width` / `meta.height` missing or not positive
    #[error("Atlas '{}' has no usable reference size (meta.width/meta.height)", path.display())]
    MissingReferenceSize { path: PathBuf },
}

/// A rectangle in reference space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl ReferenceRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// `meta` section of the atlas document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtlasMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Raw atlas document as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtlasDocument {
    #[serde(default)]
    pub meta: AtlasMeta,
    /// `null` and `{}` entries are dropped on load and treated as missing
    #[serde(default, deserialize_with = "deserialize_frames")]
    pub frames: HashMap<String, ReferenceRect>,
}

fn deserialize_frames<'de, D>(deserializer: D) -> Result<HashMap<String, ReferenceRect>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, serde_json::Value> = HashMap::deserialize(deserializer)?;
    let mut frames = HashMap::with_capacity(raw.len());

    for (key, value) in raw {
        let blank = match &value {
            serde_json::Value::Null => true,
            serde_json::Value::Object(fields) => fields.is_empty(),
            _ => false,
        };
        if blank {
            continue;
        }
        let rect = ReferenceRect::deserialize(value)
            .map_err(|e| D::Error::custom(format!("frame '{}': {}", key, e)))?;
        frames.insert(key, rect);
    }

    Ok(frames)
}

/// Loaded reference metadata. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceMeta {
    width: Option<f64>,
    height: Option<f64>,
    frames: HashMap<String, ReferenceRect>,
}

/// Keep a dimension only if it is a usable positive number.
fn usable_dimension(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

impl ReferenceMeta {
    /// Build metadata in memory.
    ///
    /// `reference_size` of `None` means the atlas does not say which resolution
    /// it was authored against.
    pub fn new(reference_size: Option<(f64, f64)>, frames: HashMap<String, ReferenceRect>) -> Self {
        Self {
            width: usable_dimension(reference_size.map(|s| s.0)),
            height: usable_dimension(reference_size.map(|s| s.1)),
            frames,
        }
    }

    /// Build metadata from a parsed document.
    pub fn from_document(doc: AtlasDocument) -> Self {
        Self {
            width: usable_dimension(doc.meta.width),
            height: usable_dimension(doc.meta.height),
            frames: doc.frames,
        }
    }

    /// Load an atlas file.
    ///
    /// Unless `allow_implicit_reference` is set, an atlas without a usable
    /// reference size is rejected instead of silently scaling by 1.0.
    pub fn load(path: &Path, allow_implicit_reference: bool) -> Result<Self, AtlasError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| AtlasError::Io { path: path.to_path_buf(), source })?;
        Self::parse(&contents, path, allow_implicit_reference)
    }

    /// Parse atlas JSON. `origin` is only used for error messages.
    pub fn parse(
        contents: &str,
        origin: &Path,
        allow_implicit_reference: bool,
    ) -> Result<Self, AtlasError> {
        let doc: AtlasDocument = serde_json::from_str(contents)
            .map_err(|source| AtlasError::Parse { path: origin.to_path_buf(), source })?;
        let meta = Self::from_document(doc);

        if !allow_implicit_reference && !meta.has_reference_size() {
            return Err(AtlasError::MissingReferenceSize { path: origin.to_path_buf() });
        }
        Ok(meta)
    }

    /// Whether both reference dimensions are known.
    pub fn has_reference_size(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    /// Reference size, with missing axes taken from the actual sheet size.
    pub fn reference_size_or(&self, source_width: u32, source_height: u32) -> (f64, f64) {
        (
            self.width.unwrap_or(source_width as f64),
            self.height.unwrap_or(source_height as f64),
        )
    }

    /// Look up a frame by key.
    pub fn frame(&self, key: &str) -> Option<&ReferenceRect> {
        self.frames.get(key)
    }

    /// Number of frames in the atlas.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Check frames against the reference bounds.
    ///
    /// Returns one message per problem, ordered by frame key. Problems are not
    /// fatal: a bad frame later fails extraction and its cell is skipped.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let sorted: BTreeMap<&String, &ReferenceRect> = self.frames.iter().collect();

        for (key, rect) in sorted {
            let values = [rect.x, rect.y, rect.w, rect.h];
            if values.iter().any(|v| !v.is_finite()) {
                problems.push(format!("frame '{}' has a non-finite coordinate", key));
                continue;
            }
            if rect.x < 0.0 || rect.y < 0.0 {
                problems.push(format!(
                    "frame '{}' starts outside the sheet at ({}, {})",
                    key, rect.x, rect.y
                ));
            }
            if rect.w <= 0.0 || rect.h <= 0.0 {
                problems.push(format!("frame '{}' is empty ({}x{})", key, rect.w, rect.h));
            }
            if let Some(width) = self.width {
                if rect.x + rect.w > width {
                    problems.push(format!(
                        "frame '{}' extends past reference width {} (x + w = {})",
                        key,
                        width,
                        rect.x + rect.w
                    ));
                }
            }
            if let Some(height) = self.height {
                if rect.y + rect.h > height {
                    problems.push(format!(
                        "frame '{}' extends past reference height {} (y + h = {})",
                        key,
                        height,
                        rect.y + rect.h
                    ));
                }
            }
        }

        problems
    }

    /// Frame keys that do not correspond to any cell on the sheet.
    pub fn unknown_keys(&self) -> Vec<&str> {
        let known: Vec<String> = all_cells().map(|c| c.frame_key()).collect();
        let mut unknown: Vec<&str> = self
            .frames
            .keys()
            .filter(|k| !known.contains(k))
            .map(String::as_str)
            .collect();
        unknown.sort_unstable();
        unknown
    }
}
