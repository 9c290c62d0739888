use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::paths::{env_override, AppPaths, ENV_DATA_PATH};

/// User settings persisted in `settings.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the game installation's data directory.
    pub data_path: Option<PathBuf>,
    /// Directory `//`-prefixed custom shader paths are relative to.
    pub project_dir: Option<PathBuf>,
}

impl Settings {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file; using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file at {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse settings file at {}", path.display()))
    }

    /// Settings file, then environment, then command-line flags.
    pub fn resolve(
        paths: &AppPaths,
        data_path: Option<PathBuf>,
        project_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let mut settings = Self::load_or_default(&paths.settings_file())?;
        if let Some(value) = env_override(ENV_DATA_PATH) {
            settings.data_path = Some(value);
        }
        if data_path.is_some() {
            settings.data_path = data_path;
        }
        if project_dir.is_some() {
            settings.project_dir = project_dir;
        }
        Ok(settings)
    }
}
