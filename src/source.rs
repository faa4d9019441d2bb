//! Source sheet resolution - find, materialize and decode the sprite sheet

use image::io::Reader as ImageReader;
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error resolving the source sheet
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    /// Neither the primary nor the fallback path exists
    #[error("Sprite sheet not found at '{}' or '{}'", primary.display(), fallback.display())]
    NotFound { primary: PathBuf, fallback: PathBuf },
    /// Reading or copying failed
    #[error("Failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exists but is not a decodable image
    #[error("Failed to decode '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Where the sheet was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    /// Loaded from the primary path
    Primary,
    /// Copied from the fallback path into the primary path
    CopiedFromFallback,
}

/// A decoded sheet plus how it was located.
#[derive(Debug)]
pub struct ResolvedSource {
    pub image: RgbaImage,
    pub path: PathBuf,
    pub origin: SourceOrigin,
}

/// Locate the sheet, copying `fallback` to `primary` if only the fallback
/// exists, then decode it.
pub fn resolve_source(primary: &Path, fallback: &Path) -> Result<ResolvedSource, SourceError> {
    let origin = if primary.is_file() {
        SourceOrigin::Primary
    } else if fallback.is_file() {
        copy_fallback(primary, fallback)?;
        SourceOrigin::CopiedFromFallback
    } else {
        return Err(SourceError::NotFound {
            primary: primary.to_path_buf(),
            fallback: fallback.to_path_buf(),
        });
    };

    let image = load_image(primary)?;
    Ok(ResolvedSource { image, path: primary.to_path_buf(), origin })
}

fn copy_fallback(primary: &Path, fallback: &Path) -> Result<(), SourceError> {
    if let Some(parent) = primary.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|source| SourceError::Io { path: parent.to_path_buf(), source })?;
        }
    }
    fs::copy(fallback, primary)
        .map_err(|source| SourceError::Io { path: primary.to_path_buf(), source })?;
    Ok(())
}

/// Decode an image to RGBA, detecting the format from its contents.
pub fn load_image(path: &Path) -> Result<RgbaImage, SourceError> {
    let reader = ImageReader::open(path)
        .map_err(|source| SourceError::Io { path: path.to_path_buf(), source })?
        .with_guessed_format()
        .map_err(|source| SourceError::Io { path: path.to_path_buf(), source })?;
    let image = reader
        .decode()
        .map_err(|source| SourceError::Decode { path: path.to_path_buf(), source })?;
    Ok(image.to_rgba8())
}
