use crate::error::{Result, StacksError};
use crate::layer::Layer;
use crate::paths;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Resolves a composition request into the flat, order-preserving layer
/// sequence the composer applies:
///
/// `[base, deps(stack1)…, stack1, deps(stack2)…, stack2, …]`
///
/// A requested stack that does not exist is fatal; a dependency that does
/// not exist is skipped with a warning. The final sequence is deduplicated
/// by name (first occurrence wins its position) so a dependency shared by
/// two requested stacks is applied once.
pub struct Resolver {
    base_dir: PathBuf,
    stacks_root: PathBuf,
}

impl Resolver {
    pub fn new(base_dir: impl Into<PathBuf>, stacks_root: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            stacks_root: stacks_root.into(),
        }
    }

    pub fn resolve(&self, requested: &[String]) -> Result<Vec<Layer>> {
        let mut sequence = vec![Layer::base(&self.base_dir)];

        for name in requested {
            paths::validate_stack_name(name)?;
            let dir = self.stacks_root.join(name);
            if !dir.is_dir() {
                return Err(StacksError::StackNotFound(name.clone()));
            }
            let mut resolving = Vec::new();
            self.expand(name, &dir, &mut resolving, &mut sequence)?;
        }

        Ok(dedup_by_name(sequence))
    }

    /// Append `name`'s dependencies (depth-first, declaration order), then
    /// `name` itself. `resolving` is the chain of stacks currently being
    /// expanded; revisiting one means the dependency files form a cycle.
    fn expand(
        &self,
        name: &str,
        dir: &Path,
        resolving: &mut Vec<String>,
        sequence: &mut Vec<Layer>,
    ) -> Result<()> {
        if resolving.iter().any(|n| n == name) {
            let chain = resolving.join(" -> ");
            return Err(StacksError::DependencyCycle(format!("{chain} -> {name}")));
        }
        resolving.push(name.to_string());

        let layer = Layer::stack(name, dir);
        for dep in layer.dependencies()? {
            if paths::validate_stack_name(&dep).is_err() {
                warn!("skipping invalid dependency name '{dep}' of stack '{name}'");
                continue;
            }
            let dep_dir = self.stacks_root.join(&dep);
            if !dep_dir.is_dir() {
                warn!("skipping unknown dependency '{dep}' of stack '{name}'");
                continue;
            }
            self.expand(&dep, &dep_dir, resolving, sequence)?;
        }
        sequence.push(layer);

        resolving.pop();
        Ok(())
    }
}

fn dedup_by_name(sequence: Vec<Layer>) -> Vec<Layer> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(sequence.len());
    for layer in sequence {
        match layer.name() {
            Some(name) => {
                if seen.insert(name.to_string()) {
                    out.push(layer);
                }
            }
            // Base appears exactly once, unconditionally first.
            None => out.push(layer),
        }
    }
    out
}

/// Parse a composition request: `rails+nextjs` or `rails,nextjs`, ordered.
pub fn parse_stack_list(arg: &str) -> Vec<String> {
    let sep = if arg.contains('+') { '+' } else { ',' };
    arg.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
