//! Resolves user-entered custom shader paths so every caller agrees on what a
//! typed path means before the descriptor is read from disk.
//!
//! Types:
//!
//! - `CustomPathResolver` remembers the project directory that `//`-prefixed
//!   paths are relative to.
//! - `PathError` reports expansion failures (unset variables, missing home,
//!   project-relative paths without a project).
//!
//! Functions:
//!
//! - `CustomPathResolver::resolve` expands `$VAR`/`${VAR}`, then `~`, then the
//!   `//` project prefix, in that order.
//! - Internal helpers `expand_env_vars`, `expand_home`, and `is_env_name_char`
//!   do the actual parsing.
use std::env;
use std::path::{Path, PathBuf};

use directories_next::BaseDirs;
use thiserror::Error;
use tracing::debug;

/// Prefix marking a path relative to the current project file.
pub const PROJECT_RELATIVE_PREFIX: &str = "//";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("shader path must not be empty")]
    Empty,
    #[error("environment variable '{0}' is not set")]
    UnsetVariable(String),
    #[error("environment variable name must not be empty")]
    EmptyVariable,
    #[error("missing closing '}}' in environment variable reference")]
    UnclosedVariable,
    #[error("unable to determine home directory for '~' expansion")]
    NoHome,
    #[error("user-specific home expansion ('{0}') is not supported")]
    UserHome(String),
    #[error("'{0}' is relative to the project but no project directory is known")]
    NoProjectDir(String),
}

#[derive(Debug, Clone, Default)]
pub struct CustomPathResolver {
    project_dir: Option<PathBuf>,
}

impl CustomPathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_dir<P: Into<PathBuf>>(project_dir: P) -> Self {
        Self {
            project_dir: Some(project_dir.into()),
        }
    }

    pub fn project_dir(&self) -> Option<&Path> {
        self.project_dir.as_deref()
    }

    pub fn resolve(&self, input: &str) -> Result<PathBuf, PathError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let expanded = expand_home(&expand_env_vars(trimmed)?)?;
        let resolved = match expanded.strip_prefix(PROJECT_RELATIVE_PREFIX) {
            Some(rest) => {
                let project = self
                    .project_dir
                    .as_ref()
                    .ok_or_else(|| PathError::NoProjectDir(input.to_string()))?;
                project.join(rest)
            }
            None => PathBuf::from(expanded),
        };
        debug!(original = %input, resolved = %resolved.display(), "resolved custom shader path");
        Ok(resolved)
    }
}

fn expand_home(input: &str) -> Result<String, PathError> {
    if !input.starts_with('~') {
        return Ok(input.to_string());
    }

    let base_dirs = BaseDirs::new().ok_or(PathError::NoHome)?;
    let home_dir = base_dirs.home_dir();

    if input == "~" {
        return Ok(home_dir.to_string_lossy().into_owned());
    }

    if let Some(rest) = input.strip_prefix("~/") {
        return Ok(home_dir.join(rest).to_string_lossy().into_owned());
    }

    Err(PathError::UserHome(input.to_string()))
}

fn expand_env_vars(input: &str) -> Result<String, PathError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            output.push(ch);
            continue;
        }

        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(PathError::UnclosedVariable);
                }
                if name.is_empty() {
                    return Err(PathError::EmptyVariable);
                }
                output.push_str(&lookup(&name)?);
            }
            Some(&c) if is_env_name_char(c) => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_env_name_char(c) {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                output.push_str(&lookup(&name)?);
            }
            _ => output.push('$'),
        }
    }

    Ok(output)
}

fn lookup(name: &str) -> Result<String, PathError> {
    env::var(name).map_err(|_| PathError::UnsetVariable(name.to_string()))
}

fn is_env_name_char(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}
