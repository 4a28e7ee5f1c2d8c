use crate::error::Result;
use crate::paths;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// One directory contributing content to a composition: the shared base or a
/// named stack. A layer is a *view* over a directory — nothing is read until
/// an accessor is called, and every attribute is optional (a layer missing a
/// role directory, settings, instructions, or dependency list is normal).
#[derive(Debug, Clone)]
pub struct Layer {
    name: Option<String>,
    dir: PathBuf,
}

impl Layer {
    pub fn base(dir: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            dir: dir.into(),
        }
    }

    pub fn stack(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: Some(name.into()),
            dir: dir.into(),
        }
    }

    /// The stack name, or `None` for the base layer.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Human-readable name used in logs and document annotations.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("base")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn role_dir(&self, role: &str) -> PathBuf {
        self.dir.join(role)
    }

    /// The layer's structured settings document, if it contributes one.
    /// A missing file is `None`; an empty object is `Some({})` — the two are
    /// deliberately distinct states.
    pub fn settings(&self) -> Result<Option<Value>> {
        let path = self.dir.join(paths::SETTINGS_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// The layer's free-text instructions document, if it contributes one.
    pub fn instructions(&self) -> Result<Option<String>> {
        let path = self.dir.join(paths::INSTRUCTIONS_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    /// Declared dependencies, in file order. Missing file means no
    /// dependencies.
    pub fn dependencies(&self) -> Result<Vec<String>> {
        let path = self.dir.join(paths::DEPS_FILE);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(parse_deps(&data))
    }

    /// Top-level passthrough files: everything directly in the layer
    /// directory that is a file and not one of the specially handled
    /// documents. Sorted by name for deterministic copy order.
    pub fn passthrough_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if paths::is_reserved_file(&name.to_string_lossy()) {
                continue;
            }
            files.push(entry.path());
        }
        files.sort();
        Ok(files)
    }
}

/// Parse a dependency list: one stack name per line, `#` starts a comment,
/// surrounding whitespace is trimmed, blank lines are skipped.
pub fn parse_deps(data: &str) -> Vec<String> {
    data.lines()
        .map(|line| {
            let line = line.split('#').next().unwrap_or("");
            line.trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
