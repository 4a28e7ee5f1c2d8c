use crate::output;
use stacks_core::catalog;
use stacks_core::paths;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let stacks_dir = paths::stacks_dir(root);
    let infos = catalog::list_stacks(&stacks_dir)?;

    if json {
        return output::print_json(&infos);
    }

    if infos.is_empty() {
        println!("No stacks found under {}", stacks_dir.display());
        return Ok(());
    }

    let rows: Vec<Vec<String>> = infos
        .iter()
        .map(|info| {
            vec![
                info.name.clone(),
                info.agents.to_string(),
                info.skills.to_string(),
                info.dependencies.join(", "),
            ]
        })
        .collect();
    output::print_table(&["NAME", "AGENTS", "SKILLS", "DEPENDS ON"], &rows);
    Ok(())
}
