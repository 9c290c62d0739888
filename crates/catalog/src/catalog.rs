//! Discovers the shader descriptors shipped in the game data directory and
//! keeps one snapshot of them for the rest of the session.
//!
//! Types:
//!
//! - `ShaderCatalog` lists every `*.xml` descriptor under `<data>/shaders`,
//!   keyed by file stem.
//! - `SessionCache` holds the first successful scan; later lookups never touch
//!   the filesystem again.
//! - `CatalogItem` / `CatalogItemKind` are the picker entries a host shows for
//!   the shader field.
//!
//! Functions:
//!
//! - `ShaderCatalog::scan` walks the shader directory.
//! - `SessionCache::get_or_scan` returns the cached catalog or scans once.
//! - `catalog_items` builds the picker entries with the fixed "select" and
//!   "custom" choices in front.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub const SHADER_SUBDIR: &str = "shaders";
pub const DESCRIPTOR_EXTENSION: &str = "xml";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no game data path configured")]
    DataPathUnset,

    #[error("shader directory not found at {0}")]
    MissingShaderDir(PathBuf),

    #[error("failed to list shaders in {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShaderCatalog {
    shader_dir: PathBuf,
    entries: Vec<CatalogEntry>,
}

impl ShaderCatalog {
    pub fn scan(data_path: Option<&Path>) -> Result<Self, CatalogError> {
        let data_path = data_path
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(CatalogError::DataPathUnset)?;
        let shader_dir = data_path.join(SHADER_SUBDIR);
        if !shader_dir.is_dir() {
            return Err(CatalogError::MissingShaderDir(shader_dir));
        }

        let io_error = |source| CatalogError::Io {
            path: shader_dir.clone(),
            source,
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(&shader_dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if !path.is_file() || !has_descriptor_extension(&path) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                debug!(path = %path.display(), "skipping descriptor with non UTF-8 name");
                continue;
            };
            entries.push(CatalogEntry {
                name: name.to_string(),
                path: path.clone(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        info!(dir = %shader_dir.display(), shaders = entries.len(), "scanned shader catalog");
        Ok(Self {
            shader_dir,
            entries,
        })
    }

    pub fn shader_dir(&self) -> &Path {
        &self.shader_dir
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn descriptor_path(&self, name: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.path.as_path())
    }
}

fn has_descriptor_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DESCRIPTOR_EXTENSION))
}

/// First successful catalog scan of the session.
#[derive(Debug, Default)]
pub struct SessionCache {
    catalog: OnceLock<ShaderCatalog>,
}

impl SessionCache {
    pub const fn new() -> Self {
        Self {
            catalog: OnceLock::new(),
        }
    }

    pub fn global() -> &'static SessionCache {
        static CACHE: SessionCache = SessionCache::new();
        &CACHE
    }

    pub fn get(&self) -> Option<&ShaderCatalog> {
        self.catalog.get()
    }

    /// Returns the cached catalog, scanning `data_path` when nothing is cached
    /// yet. Failed scans are not cached.
    pub fn get_or_scan(&self, data_path: Option<&Path>) -> Result<&ShaderCatalog, CatalogError> {
        if let Some(catalog) = self.catalog.get() {
            return Ok(catalog);
        }
        let scanned = ShaderCatalog::scan(data_path)?;
        Ok(self.catalog.get_or_init(|| scanned))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogItemKind {
    Unselected,
    Custom,
    Shader,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    pub id: String,
    pub label: String,
    pub kind: CatalogItemKind,
}

pub const UNSELECTED_ID: &str = "None";
pub const CUSTOM_ID: &str = "Custom";

impl CatalogItem {
    fn new(id: &str, label: &str, kind: CatalogItemKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
        }
    }
}

/// Picker entries for the shader field.
pub fn catalog_items(catalog: Option<&ShaderCatalog>) -> Vec<CatalogItem> {
    let Some(catalog) = catalog else {
        return vec![CatalogItem::new(
            "No shaders found",
            "No shaders found",
            CatalogItemKind::Unavailable,
        )];
    };

    let mut items = vec![
        CatalogItem::new(UNSELECTED_ID, "Select a shader", CatalogItemKind::Unselected),
        CatalogItem::new(CUSTOM_ID, "Load Custom Shader", CatalogItemKind::Custom),
    ];
    items.extend(
        catalog
            .names()
            .map(|name| CatalogItem::new(name, name, CatalogItemKind::Shader)),
    );
    items
}
