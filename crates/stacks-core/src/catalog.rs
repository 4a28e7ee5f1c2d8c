use crate::error::Result;
use crate::layer::Layer;
use crate::paths;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// Summary of one installable stack, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct StackInfo {
    pub name: String,
    pub dependencies: Vec<String>,
    pub agents: usize,
    pub skills: usize,
}

/// Enumerate the stacks available under the stacks root, sorted by name.
/// Directories whose names are not valid stack names are skipped with a
/// warning (they could never be requested anyway).
pub fn list_stacks(stacks_root: &Path) -> Result<Vec<StackInfo>> {
    if !stacks_root.is_dir() {
        return Ok(Vec::new());
    }
    let mut infos = Vec::new();
    for entry in std::fs::read_dir(stacks_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if paths::validate_stack_name(&name).is_err() {
            warn!("ignoring directory with invalid stack name: {name}");
            continue;
        }
        let layer = Layer::stack(name.as_str(), entry.path());
        infos.push(StackInfo {
            dependencies: layer.dependencies()?,
            agents: count_items(&layer, "agents")?,
            skills: count_items(&layer, "skills")?,
            name,
        });
    }
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(infos)
}

fn count_items(layer: &Layer, role: &str) -> Result<usize> {
    let dir = layer.role_dir(role);
    if !dir.is_dir() {
        return Ok(0);
    }
    Ok(std::fs::read_dir(&dir)?.count())
}
