use crate::output;
use serde::Serialize;
use stacks_core::lockfile::Lock;
use stacks_core::StacksError;
use std::path::Path;

#[derive(Serialize)]
struct Status {
    #[serde(flatten)]
    lock: Lock,
    modified_files: Vec<String>,
}

pub fn run(target: &Path, json: bool) -> anyhow::Result<()> {
    let lock = Lock::load(target)?
        .ok_or_else(|| StacksError::NotInstalled(target.to_path_buf()))?;
    let modified_files = lock.modified_files(target)?;

    if json {
        return output::print_json(&Status {
            lock,
            modified_files,
        });
    }

    println!("Stacks:       {}", lock.stacks.join(", "));
    println!("Version:      {}", lock.version);
    println!("Installed at: {}", lock.installed_at);
    if modified_files.is_empty() {
        println!("No files modified since install.");
    } else {
        println!("Modified since install:");
        for file in &modified_files {
            println!("  {file}");
        }
    }
    Ok(())
}
