//! Place a composed output tree under a target project root.
//!
//! Everything lands under `target/.claude/` except the instructions
//! document, which goes to the project root where the agent runtime reads
//! it. The composed tree itself is never mutated.

use crate::error::{Result, StacksError};
use crate::io;
use crate::lockfile::{self, Lock};
use crate::paths;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Runtime files and local overrides the target project should not commit.
const GITIGNORE_ENTRIES: &[&str] = &[
    ".claude/settings.local.json",
    ".claude/context/agent-activity.log",
    ".claude/context/session-summary.md",
];

const SETTINGS_LOCAL_TEMPLATE: &str = r#"{
  "permissions": {
    "allow": [],
    "deny": []
  }
}
"#;

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Overwrite an existing `.claude/` directory.
    pub force: bool,
    /// With `force`, keep the existing `context/` directory.
    pub preserve_context: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub target: PathBuf,
    pub stacks: Vec<String>,
    pub role_counts: BTreeMap<String, usize>,
    pub files_installed: usize,
    pub lock: Lock,
}

pub fn install(
    composed: &Path,
    target: &Path,
    stacks: &[String],
    opts: &InstallOptions,
) -> Result<InstallReport> {
    if !target.exists() {
        return Err(StacksError::TargetNotFound(target.to_path_buf()));
    }
    if !target.is_dir() {
        return Err(StacksError::TargetNotADirectory(target.to_path_buf()));
    }

    let claude_dir = paths::claude_dir(target);
    if claude_dir.exists() {
        if !opts.force {
            return Err(StacksError::AlreadyInstalled(claude_dir));
        }
        if opts.preserve_context {
            for entry in std::fs::read_dir(&claude_dir)? {
                let entry = entry?;
                if entry.file_name() != paths::CONTEXT_DIR {
                    io::remove_entry(&entry.path())?;
                }
            }
        } else {
            io::remove_entry(&claude_dir)?;
        }
    }
    io::ensure_dir(&claude_dir)?;

    // Copy the composed tree: instructions to the project root, everything
    // else under .claude/. Track what was installed for the lockfile.
    let mut installed: Vec<String> = Vec::new();
    let mut files_installed = 0;

    let mut entries = std::fs::read_dir(composed)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in &entries {
        let name = entry.file_name();
        if name == paths::INSTRUCTIONS_FILE {
            files_installed += io::replace_entry(&entry.path(), &target.join(&name))?;
            installed.push(paths::INSTRUCTIONS_FILE.to_string());
        } else {
            files_installed += io::replace_entry(&entry.path(), &claude_dir.join(&name))?;
            for file in WalkDir::new(entry.path()).sort_by_file_name() {
                let file = file.map_err(std::io::Error::from)?;
                if file.file_type().is_file() {
                    let rel = file
                        .path()
                        .strip_prefix(composed)
                        .expect("walkdir yields paths under its root");
                    installed.push(format!("{}/{}", paths::CLAUDE_DIR, rel.display()));
                }
            }
        }
    }

    // Hooks ship as shell scripts; they must be runnable in place.
    for entry in WalkDir::new(&claude_dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "sh") {
            io::make_executable(entry.path())?;
        }
    }

    io::write_if_missing(
        &claude_dir.join(paths::SETTINGS_LOCAL_FILE),
        SETTINGS_LOCAL_TEMPLATE.as_bytes(),
    )?;

    for entry in GITIGNORE_ENTRIES {
        io::ensure_gitignore_entry(target, entry)?;
    }

    let mut lock = Lock::new(stacks);
    lock.file_checksums = lockfile::compute_checksums(target, &installed)?;
    lock.save(target)?;

    let mut role_counts = BTreeMap::new();
    for role in paths::NAMED_ITEM_DIRS.iter().chain(paths::OPAQUE_DIRS) {
        let dir = claude_dir.join(role);
        if dir.is_dir() {
            role_counts.insert(role.to_string(), std::fs::read_dir(&dir)?.count());
        }
    }

    Ok(InstallReport {
        target: target.to_path_buf(),
        stacks: stacks.to_vec(),
        role_counts,
        files_installed,
        lock,
    })
}
