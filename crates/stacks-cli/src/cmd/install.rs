use crate::output;
use anyhow::{bail, Context};
use stacks_core::compose::{compose, ComposeOptions};
use stacks_core::installer::{install, InstallOptions};
use stacks_core::paths;
use stacks_core::resolver::{parse_stack_list, Resolver};
use std::path::Path;

pub fn run(
    root: &Path,
    stacks_arg: &str,
    target: &Path,
    force: bool,
    preserve_context: bool,
    json: bool,
) -> anyhow::Result<()> {
    let names = parse_stack_list(stacks_arg);
    if names.is_empty() {
        bail!("no stacks specified (try: stacks install rails+nextjs ./my-app)");
    }

    let resolver = Resolver::new(paths::base_dir(root), paths::stacks_dir(root));
    let layers = resolver
        .resolve(&names)
        .context("failed to resolve stacks")?;

    // Compose into a scratch directory; nothing touches the target until
    // the whole composition has succeeded.
    let staging = tempfile::TempDir::new().context("failed to create staging directory")?;
    compose(&layers, staging.path(), &ComposeOptions::default())
        .context("failed to compose stacks")?;

    let report = install(
        staging.path(),
        target,
        &names,
        &InstallOptions {
            force,
            preserve_context,
        },
    )
    .context("failed to install composed output")?;

    if json {
        return output::print_json(&report);
    }

    println!("Installed: {}", report.stacks.join(", "));
    println!("Target:    {}", report.target.display());
    println!();
    for (role, count) in &report.role_counts {
        println!("  {role:<9} {count}");
    }
    println!();
    println!("Next: review CLAUDE.md and .claude/settings.json in the target.");
    Ok(())
}
