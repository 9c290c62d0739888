//! Moves materials saved by older releases, which stored a raw shader file
//! path, onto the shader picker while keeping the values artists already set.
//!
//! Types:
//!
//! - `MigrationError` aborts the whole run when the game data layout is not
//!   usable.
//! - `MigrationReport` lists which materials were moved and which were skipped.
//!
//! Functions:
//!
//! - `migrate_materials` resolves each legacy path against the shader catalog,
//!   then the legacy support directory, then the old path itself.
use std::path::{Path, PathBuf};

use catalog::{ShaderCatalog, DESCRIPTOR_EXTENSION};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::binding::ShaderEnvironment;
use crate::state::{MaterialShader, ShaderChoice};

/// Shader directory of the previous game generation, relative to the data path.
pub const LEGACY_SUPPORT_DIR: &str = "fs19Support/shaders";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("the game data path is not set or does not exist")]
    InvalidDataPath,

    #[error("legacy shader directory not found at {0}")]
    MissingLegacyDir(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigratedMaterial {
    pub material: String,
    pub shader: ShaderChoice,
    pub custom_shader: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMaterial {
    pub material: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub migrated: Vec<MigratedMaterial>,
    pub skipped: Vec<SkippedMaterial>,
}

pub fn migrate_materials(
    materials: &mut [MaterialShader],
    env: &ShaderEnvironment,
    catalog: Option<&ShaderCatalog>,
) -> Result<MigrationReport, MigrationError> {
    let data_path = env
        .data_path()
        .filter(|path| path.exists())
        .ok_or(MigrationError::InvalidDataPath)?;
    let legacy_dir = data_path.join(LEGACY_SUPPORT_DIR);
    if !legacy_dir.is_dir() {
        return Err(MigrationError::MissingLegacyDir(legacy_dir));
    }

    let mut report = MigrationReport::default();
    for material in materials.iter_mut() {
        let Some(source) = material
            .legacy_source
            .clone()
            .filter(|source| !source.trim().is_empty())
        else {
            continue;
        };

        match migrate_one(material, &source, env, catalog, &legacy_dir) {
            Ok(()) => report.migrated.push(MigratedMaterial {
                material: material.name.clone(),
                shader: material.shader.clone(),
                custom_shader: material.custom_shader.clone(),
            }),
            Err(reason) => {
                warn!(material = %material.name, %reason, "skipping shader migration");
                report.skipped.push(SkippedMaterial {
                    material: material.name.clone(),
                    reason,
                });
            }
        }
    }

    info!(
        migrated = report.migrated.len(),
        skipped = report.skipped.len(),
        "shader migration complete"
    );
    Ok(report)
}

fn migrate_one(
    material: &mut MaterialShader,
    source: &str,
    env: &ShaderEnvironment,
    catalog: Option<&ShaderCatalog>,
    legacy_dir: &Path,
) -> Result<(), String> {
    let old_path = PathBuf::from(source);
    let stem = old_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| format!("cannot derive a shader name from '{source}'"))?
        .to_string();

    let legacy_candidate = legacy_dir.join(format!("{stem}.{DESCRIPTOR_EXTENSION}"));
    let (shader, custom_shader) = if catalog.is_some_and(|catalog| catalog.contains(&stem)) {
        (ShaderChoice::Named(stem), String::new())
    } else if legacy_candidate.is_file() {
        (
            ShaderChoice::Custom,
            legacy_candidate.to_string_lossy().into_owned(),
        )
    } else {
        let exists = env
            .resolver()
            .resolve(source)
            .map(|resolved| resolved.exists())
            .unwrap_or(false);
        if !exists {
            return Err(format!("could not find the shader file {source}"));
        }
        (ShaderChoice::Custom, source.to_string())
    };

    let variation = material.variation.take();
    let parameters = std::mem::take(&mut material.parameters);
    let textures = std::mem::take(&mut material.textures);

    material.shader = shader;
    material.custom_shader = custom_shader;
    if let Err(err) = material.refresh_variations(env) {
        warn!(material = %material.name, error = %err, "migrated shader could not be read");
        material.variations.clear();
    }
    material.variation = variation;
    material.parameters = parameters;
    material.textures = textures;

    info!(
        material = %material.name,
        shader = %material.shader,
        "migrated legacy shader source"
    );
    Ok(())
}
