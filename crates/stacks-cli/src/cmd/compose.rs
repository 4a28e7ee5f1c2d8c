use crate::output;
use anyhow::{bail, Context};
use stacks_core::compose::{compose, ComposeOptions, SettingsMergeMode};
use stacks_core::paths;
use stacks_core::resolver::{parse_stack_list, Resolver};
use stacks_core::StacksError;
use std::path::Path;

pub fn run(
    root: &Path,
    stacks_arg: &str,
    out: &Path,
    no_settings_merge: bool,
    json: bool,
) -> anyhow::Result<()> {
    let names = parse_stack_list(stacks_arg);
    if names.is_empty() {
        bail!("no stacks specified (try: stacks compose rails --out ./composed)");
    }

    // The output directory must be fresh: composition assumes it owns the
    // tree it writes into.
    if out.exists() && std::fs::read_dir(out)?.next().is_some() {
        return Err(StacksError::OutputNotEmpty(out.to_path_buf()).into());
    }

    let resolver = Resolver::new(paths::base_dir(root), paths::stacks_dir(root));
    let layers = resolver
        .resolve(&names)
        .context("failed to resolve stacks")?;

    let opts = ComposeOptions {
        settings_mode: if no_settings_merge {
            SettingsMergeMode::LastLayerWins
        } else {
            SettingsMergeMode::Deep
        },
    };
    let report = compose(&layers, out, &opts).context("failed to compose stacks")?;

    if json {
        return output::print_json(&report);
    }

    println!("Composed: {}", report.layers.join(" -> "));
    println!("Output:   {}", out.display());
    for (role, count) in &report.role_counts {
        println!("  {role:<9} {count}");
    }
    Ok(())
}
