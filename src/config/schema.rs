//! Configuration schema types for `thumbslice.toml`
//!
//! Defines the structure and validation rules for a slicing run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::output::DEFAULT_QUALITY;
use crate::region::{Strategy, DEFAULT_THUMB_SIZE};

/// Input and output locations, relative to the project root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Primary sprite sheet location
    #[serde(default = "default_sprite")]
    pub sprite: PathBuf,
    /// Copied to `sprite` when the primary is missing
    #[serde(default = "default_fallback")]
    pub fallback: PathBuf,
    /// Atlas metadata (atlas strategy only)
    #[serde(default = "default_atlas")]
    pub atlas: PathBuf,
    /// Thumbnail output directory
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sprite: default_sprite(),
            fallback: default_fallback(),
            atlas: default_atlas(),
            out: default_out(),
        }
    }
}

fn default_sprite() -> PathBuf {
    PathBuf::from("public/mission_results_sprite.webp")
}

fn default_fallback() -> PathBuf {
    PathBuf::from("src/data/mission_results_sprite.webp")
}

fn default_atlas() -> PathBuf {
    PathBuf::from("src/data/mission_results_atlas.json")
}

fn default_out() -> PathBuf {
    PathBuf::from("public/mission_thumbnails")
}

/// Slicing behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceConfig {
    /// Region strategy
    #[serde(default)]
    pub strategy: Strategy,
    /// Canonical thumbnail size [width, height] (atlas strategy only)
    #[serde(default = "default_thumb_size")]
    pub thumb_size: [u32; 2],
    /// Lossy WebP quality (1-100)
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Worker threads; 1 processes cells sequentially
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            thumb_size: default_thumb_size(),
            quality: default_quality(),
            jobs: default_jobs(),
        }
    }
}

fn default_thumb_size() -> [u32; 2] {
    [DEFAULT_THUMB_SIZE.0, DEFAULT_THUMB_SIZE.1]
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_jobs() -> usize {
    1
}

/// Atlas metadata handling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtlasSection {
    /// Accept an atlas without `meta.width`/`meta.height`, scaling by 1.0
    #[serde(default)]
    pub allow_implicit_reference: bool,
}

/// Complete `thumbslice.toml` configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlicerConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub slice: SliceConfig,
    #[serde(default)]
    pub atlas: AtlasSection,
}

/// A single validation problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted field path, e.g. `slice.quality`
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl SlicerConfig {
    /// Canonical thumbnail size as a tuple.
    pub fn thumb_size(&self) -> (u32, u32) {
        (self.slice.thumb_size[0], self.slice.thumb_size[1])
    }

    /// Validate the configuration, returning every problem found.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let mut push = |field: &str, message: &str| {
            issues.push(ConfigIssue { field: field.to_string(), message: message.to_string() });
        };

        if self.slice.thumb_size.contains(&0) {
            push("slice.thumb_size", "dimensions must be greater than 0");
        }
        if !(1..=100).contains(&self.slice.quality) {
            push("slice.quality", "must be between 1 and 100");
        }
        if self.slice.jobs == 0 {
            push("slice.jobs", "must be at least 1");
        }
        if self.paths.sprite.as_os_str().is_empty() {
            push("paths.sprite", "must not be empty");
        }
        if self.paths.out.as_os_str().is_empty() {
            push("paths.out", "must not be empty");
        }
        if self.paths.sprite == self.paths.fallback {
            push("paths.fallback", "must differ from paths.sprite");
        }

        issues
    }
}
