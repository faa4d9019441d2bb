//! WebP output and thumbnail file naming

use image::codecs::webp::{WebPEncoder, WebPQuality};
use image::{ColorType, RgbaImage};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cell::Variant;

/// Canonical extension of the output codec.
pub const OUTPUT_EXTENSION: &str = "webp";

/// Default lossy quality (0-100).
pub const DEFAULT_QUALITY: u8 = 85;

/// Error type for output operations
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Image encoding error
    #[error("Image error at '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl OutputError {
    fn io(path: &Path, source: io::Error) -> Self {
        OutputError::Io { path: path.to_path_buf(), source }
    }
}

/// Generate the thumbnail filename for a cell.
///
/// # Naming Rules
///
/// | Variant | Output |
/// |---------|--------|
/// | bronze (default) | `{id}.webp` |
/// | fail / silver / gold | `{id}_{variant}.webp` |
pub fn thumbnail_filename(mission_id: u32, variant: Variant) -> String {
    if variant == Variant::DEFAULT {
        format!("{}.{}", mission_id, OUTPUT_EXTENSION)
    } else {
        format!("{}_{}.{}", mission_id, variant.name(), OUTPUT_EXTENSION)
    }
}

/// Create the output directory (and parents) if it does not exist.
pub fn ensure_output_dir(dir: &Path) -> Result<(), OutputError> {
    fs::create_dir_all(dir).map_err(|e| OutputError::io(dir, e))
}

/// Encode an RGBA image as lossy WebP at `quality` and write it to `path`.
///
/// Any existing file at `path` is replaced.
#[allow(deprecated)]
pub fn save_webp(image: &RgbaImage, path: &Path, quality: u8) -> Result<(), OutputError> {
    let file = File::create(path).map_err(|e| OutputError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let encoder = WebPEncoder::new_with_quality(&mut writer, WebPQuality::lossy(quality));
    encoder
        .encode(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)
        .map_err(|source| OutputError::Image { path: path.to_path_buf(), source })?;

    writer.flush().map_err(|e| OutputError::io(path, e))
}

/// Writes cell thumbnails into one output directory.
#[derive(Debug, Clone)]
pub struct ThumbnailWriter {
    out_dir: PathBuf,
    quality: u8,
}

impl ThumbnailWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into(), quality: DEFAULT_QUALITY }
    }

    /// Set lossy quality, clamped to 1-100.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Create the output directory. Safe to call repeatedly.
    pub fn prepare(&self) -> Result<(), OutputError> {
        ensure_output_dir(&self.out_dir)
    }

    /// Path a cell's thumbnail is written to.
    pub fn path_for(&self, mission_id: u32, variant: Variant) -> PathBuf {
        self.out_dir.join(thumbnail_filename(mission_id, variant))
    }

    /// Write one thumbnail, returning its path.
    pub fn write(
        &self,
        image: &RgbaImage,
        mission_id: u32,
        variant: Variant,
    ) -> Result<PathBuf, OutputError> {
        let path = self.path_for(mission_id, variant);
        save_webp(image, &path, self.quality)?;
        Ok(path)
    }
}
