use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use material::MaterialShader;
use serde::{Deserialize, Serialize};

/// TOML file holding the shader state of a set of materials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialStore {
    pub materials: Vec<MaterialShader>,
}

impl MaterialStore {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read material file at {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse material file at {}", path.display()))
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| {
                format!(
                    "failed to prepare directory for material file at {}",
                    dir.display()
                )
            })?;
        }
        let serialized = toml::to_string_pretty(self)
            .with_context(|| "failed to serialize materials to TOML".to_string())?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write material file to {}", path.display()))
    }

    /// Existing material named `name`, or a fresh one appended to the store.
    pub fn get_or_insert(&mut self, name: &str) -> &mut MaterialShader {
        let index = match self.materials.iter().position(|material| material.name == name) {
            Some(index) => index,
            None => {
                self.materials.push(MaterialShader::new(name));
                self.materials.len() - 1
            }
        };
        &mut self.materials[index]
    }
}
