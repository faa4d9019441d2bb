//! Slice context containing configuration and resolved paths for a run.

use crate::config::{LoadedConfig, SlicerConfig};
use crate::region::Strategy;
use std::path::{Path, PathBuf};

/// Configuration plus the root its relative paths resolve against.
#[derive(Debug, Clone)]
pub struct SliceContext {
    config: SlicerConfig,
    /// Project root directory (where thumbslice.toml is located)
    project_root: PathBuf,
}

impl SliceContext {
    pub fn new(config: SlicerConfig, project_root: PathBuf) -> Self {
        Self { config, project_root }
    }

    /// Build a context from a loaded config.
    pub fn from_loaded(loaded: LoadedConfig) -> Self {
        Self::new(loaded.config, loaded.root)
    }

    pub fn config(&self) -> &SlicerConfig {
        &self.config
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Primary sprite sheet path.
    pub fn sprite_path(&self) -> PathBuf {
        self.resolve_path(&self.config.paths.sprite)
    }

    /// Fallback sprite sheet path.
    pub fn fallback_path(&self) -> PathBuf {
        self.resolve_path(&self.config.paths.fallback)
    }

    /// Atlas metadata path.
    pub fn atlas_path(&self) -> PathBuf {
        self.resolve_path(&self.config.paths.atlas)
    }

    /// Thumbnail output directory.
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.paths.out)
    }

    pub fn strategy(&self) -> Strategy {
        self.config.slice.strategy
    }

    pub fn jobs(&self) -> usize {
        self.config.slice.jobs.max(1)
    }

    /// Resolve a path relative to the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}
