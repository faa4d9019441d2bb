//! Configuration loading and discovery for `thumbslice.toml`
//!
//! Provides functions to find, load, and override configuration.

use super::schema::SlicerConfig;
use crate::region::Strategy;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file searched for.
pub const CONFIG_FILE_NAME: &str = "thumbslice.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse thumbslice.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override region strategy
    pub strategy: Option<Strategy>,
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Override worker count
    pub jobs: Option<usize>,
}

/// A loaded configuration and the directory its relative paths resolve against.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SlicerConfig,
    /// Directory containing the config file, or the starting directory
    pub root: PathBuf,
    /// Config file that was read, if any
    pub source: Option<PathBuf>,
}

/// Find `thumbslice.toml` by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration.
///
/// With an explicit `path` that file must exist. Otherwise the file is
/// discovered by walking up from `start`; when none is found the defaults are
/// used with `start` as the root.
pub fn load_config(path: Option<&Path>, start: &Path) -> Result<LoadedConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config_from(start.to_path_buf()),
    };

    match config_path {
        Some(p) => {
            let config = load_config_file(&p)?;
            let root = p
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start.to_path_buf());
            Ok(LoadedConfig { config, root, source: Some(p) })
        }
        None => Ok(LoadedConfig {
            config: SlicerConfig::default(),
            root: start.to_path_buf(),
            source: None,
        }),
    }
}

/// Load configuration starting from the current working directory.
pub fn load_config_from_cwd(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let cwd = env::current_dir()?;
    load_config(path, &cwd)
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<SlicerConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: SlicerConfig = toml::from_str(&contents)?;
    check(&config)?;
    Ok(config)
}

fn check(config: &SlicerConfig) -> Result<(), ConfigError> {
    let errors = config.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()))
    }
}

/// Apply CLI overrides and re-validate.
pub fn apply_overrides(
    mut config: SlicerConfig,
    overrides: &CliOverrides,
) -> Result<SlicerConfig, ConfigError> {
    if let Some(strategy) = overrides.strategy {
        config.slice.strategy = strategy;
    }
    if let Some(out) = &overrides.out {
        config.paths.out = out.clone();
    }
    if let Some(jobs) = overrides.jobs {
        config.slice.jobs = jobs;
    }
    check(&config)?;
    Ok(config)
}
