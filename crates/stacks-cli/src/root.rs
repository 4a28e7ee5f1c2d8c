use stacks_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the stacks root directory.
///
/// Priority:
/// 1. `--root` flag / `STACKS_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for a directory containing both
///    `base/` and `stacks/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut dir = cwd.clone();
    loop {
        if paths::base_dir(&dir).is_dir() && paths::stacks_dir(&dir).is_dir() {
            return dir;
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }

    cwd
}
