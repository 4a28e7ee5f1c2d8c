use crate::error::{Result, StacksError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Layer directory roles
// ---------------------------------------------------------------------------

/// Directory roles whose children are independently named, individually
/// replaceable units: a later layer's `agents/pm.md` fully replaces an
/// earlier layer's `agents/pm.md`.
pub const NAMED_ITEM_DIRS: &[&str] = &["agents", "skills", "hooks"];

/// Directory roles copied as flat reference bundles. Collisions are rare in
/// practice; same-name entries are replaced just like named items.
pub const OPAQUE_DIRS: &[&str] = &["patterns", "styles"];

/// The single structured (JSON) document a layer may contribute.
pub const SETTINGS_FILE: &str = "settings.json";

/// The single free-text instructions document a layer may contribute.
pub const INSTRUCTIONS_FILE: &str = "CLAUDE.md";

/// Per-stack dependency list: one stack name per line, `#` comments.
pub const DEPS_FILE: &str = "stack.deps";

// ---------------------------------------------------------------------------
// Stacks-root layout
// ---------------------------------------------------------------------------

pub const BASE_DIR: &str = "base";
pub const STACKS_DIR: &str = "stacks";

// ---------------------------------------------------------------------------
// Composed output / install targets
// ---------------------------------------------------------------------------

pub const CONTEXT_DIR: &str = "context";
pub const CONTEXT_FEATURES_DIR: &str = "context/features";

pub const CLAUDE_DIR: &str = ".claude";
pub const LOCK_FILE: &str = ".claude/stacks.lock";
pub const SETTINGS_LOCAL_FILE: &str = "settings.local.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn base_dir(root: &Path) -> PathBuf {
    root.join(BASE_DIR)
}

pub fn stacks_dir(root: &Path) -> PathBuf {
    root.join(STACKS_DIR)
}

pub fn stack_dir(root: &Path, name: &str) -> PathBuf {
    stacks_dir(root).join(name)
}

pub fn claude_dir(target: &Path) -> PathBuf {
    target.join(CLAUDE_DIR)
}

pub fn lock_path(target: &Path) -> PathBuf {
    target.join(LOCK_FILE)
}

/// True for the top-level files the composer handles specially: everything
/// else at a layer's top level is a passthrough file.
pub fn is_reserved_file(name: &str) -> bool {
    name == SETTINGS_FILE || name == INSTRUCTIONS_FILE || name == DEPS_FILE
}

// ---------------------------------------------------------------------------
// Stack name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Stack names double as path components under the stacks root, so reject
/// anything that could escape it (separators, dots, uppercase).
pub fn validate_stack_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(StacksError::InvalidStackName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
