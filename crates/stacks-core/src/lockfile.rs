//! Install lockfile.
//!
//! `.claude/stacks.lock` records which stacks were installed, when, by which
//! tool version, and the checksums of every installed file — enough for
//! `status` to tell which files a user has edited since install.

use crate::error::Result;
use crate::io;
use crate::paths;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lock {
    pub version: String,
    pub installed_at: String,
    /// Installed stacks, in request order.
    pub stacks: Vec<String>,
    /// Relative path -> SHA-256 of the file as installed.
    #[serde(default)]
    pub file_checksums: BTreeMap<String, String>,
}

impl Lock {
    pub fn new(stacks: &[String]) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            installed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            stacks: stacks.to_vec(),
            file_checksums: BTreeMap::new(),
        }
    }

    /// Load the lockfile for a target project, or `None` if nothing was
    /// installed there.
    pub fn load(target: &Path) -> Result<Option<Lock>> {
        let path = paths::lock_path(target);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(Some(serde_yaml::from_str(&data)?))
    }

    pub fn save(&self, target: &Path) -> Result<()> {
        let path = paths::lock_path(target);
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(&path, data.as_bytes())
    }

    /// Files whose current checksum differs from the recorded one.
    /// Deleted files are not reported as modified.
    pub fn modified_files(&self, target: &Path) -> Result<Vec<String>> {
        let mut modified = Vec::new();
        for (rel_path, recorded) in &self.file_checksums {
            let full = target.join(rel_path);
            if !full.is_file() {
                continue;
            }
            if &file_checksum(&full)? != recorded {
                modified.push(rel_path.clone());
            }
        }
        Ok(modified)
    }
}

pub fn file_checksum(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&data)))
}

/// Checksum `files` (paths relative to `target`); missing files are skipped.
pub fn compute_checksums(target: &Path, files: &[String]) -> Result<BTreeMap<String, String>> {
    let mut checksums = BTreeMap::new();
    for rel_path in files {
        let full = target.join(rel_path);
        if full.is_file() {
            checksums.insert(rel_path.clone(), file_checksum(&full)?);
        }
    }
    Ok(checksums)
}
