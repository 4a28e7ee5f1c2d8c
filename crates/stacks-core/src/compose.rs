use crate::error::Result;
use crate::io;
use crate::layer::Layer;
use crate::merge;
use crate::paths;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// How per-layer `settings.json` documents are combined.
///
/// `LastLayerWins` is a degraded mode for callers that cannot run the deep
/// merge: the last contributing layer's document is taken verbatim, which
/// silently drops base/dependency/earlier-stack settings — composing in this
/// mode emits a warning so the loss is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsMergeMode {
    #[default]
    Deep,
    LastLayerWins,
}

#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    pub settings_mode: SettingsMergeMode,
}

/// What one composition run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ComposeReport {
    /// Applied layers, in order.
    pub layers: Vec<String>,
    /// Final item count per role directory present in the output.
    pub role_counts: BTreeMap<String, usize>,
    pub has_instructions: bool,
    pub has_settings: bool,
}

/// Apply `layers` in sequence order into `out_dir`, producing one merged
/// configuration tree.
///
/// `out_dir` is caller-owned and expected to be freshly created; on error
/// the partially written tree is the caller's to discard. Every step writes
/// only under `out_dir` — there is no other shared state between layers.
pub fn compose(layers: &[Layer], out_dir: &Path, opts: &ComposeOptions) -> Result<ComposeReport> {
    io::ensure_dir(out_dir)?;

    if opts.settings_mode == SettingsMergeMode::LastLayerWins {
        warn!(
            "settings deep-merge disabled: taking the last contributing stack's \
             settings.json verbatim; earlier layers' settings are dropped"
        );
    }

    let mut instructions: Option<String> = None;
    let mut settings: Option<Value> = None;

    for layer in layers {
        debug!("applying layer '{}'", layer.display_name());

        for role in paths::NAMED_ITEM_DIRS.iter().chain(paths::OPAQUE_DIRS) {
            overlay_role(layer, role, out_dir)?;
        }

        if let Some(text) = layer.instructions()? {
            append_instructions(&mut instructions, layer, text);
        }

        if let Some(doc) = layer.settings()? {
            settings = Some(match (opts.settings_mode, settings.take()) {
                (SettingsMergeMode::Deep, Some(acc)) => merge::deep_merge(acc, doc),
                _ => doc,
            });
        }

        for file in layer.passthrough_files()? {
            let name = file.file_name().expect("read_dir entries have names");
            io::replace_entry(&file, &out_dir.join(name))?;
        }
    }

    if let Some(text) = &instructions {
        io::atomic_write(&out_dir.join(paths::INSTRUCTIONS_FILE), text.as_bytes())?;
    }
    if let Some(doc) = &settings {
        let mut data = serde_json::to_string_pretty(doc)?;
        data.push('\n');
        io::atomic_write(&out_dir.join(paths::SETTINGS_FILE), data.as_bytes())?;
    }

    // Always present for downstream consumers, even when empty.
    io::ensure_dir(&out_dir.join(paths::CONTEXT_DIR))?;
    io::ensure_dir(&out_dir.join(paths::CONTEXT_FEATURES_DIR))?;

    let mut role_counts = BTreeMap::new();
    for role in paths::NAMED_ITEM_DIRS.iter().chain(paths::OPAQUE_DIRS) {
        let dir = out_dir.join(role);
        if dir.is_dir() {
            role_counts.insert(role.to_string(), std::fs::read_dir(&dir)?.count());
        }
    }

    Ok(ComposeReport {
        layers: layers.iter().map(|l| l.display_name().to_string()).collect(),
        role_counts,
        has_instructions: instructions.is_some(),
        has_settings: settings.is_some(),
    })
}

/// Overlay one role directory of one layer onto the output: each item
/// directly inside the layer's `role/` replaces any same-named item already
/// in `out/role/`, or is added. A missing or empty role directory is a
/// no-op (the output role directory is not even created).
fn overlay_role(layer: &Layer, role: &str, out_dir: &Path) -> Result<usize> {
    let src = layer.role_dir(role);
    if !src.is_dir() {
        return Ok(0);
    }
    let mut entries = std::fs::read_dir(&src)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());
    if entries.is_empty() {
        return Ok(0);
    }

    let dst_role = out_dir.join(role);
    io::ensure_dir(&dst_role)?;
    let mut count = 0;
    for entry in &entries {
        let dst = dst_role.join(entry.file_name());
        io::replace_entry(&entry.path(), &dst)?;
        count += 1;
    }
    Ok(count)
}

fn append_instructions(acc: &mut Option<String>, layer: &Layer, text: String) {
    match acc {
        Some(buf) => {
            buf.push_str("\n\n---\n\n<!-- stack: ");
            buf.push_str(layer.display_name());
            buf.push_str(" -->\n\n");
            buf.push_str(&text);
        }
        None => *acc = Some(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn layer_dir(&self, name: &str) -> PathBuf {
            let p = self.dir.path().join("layers").join(name);
            std::fs::create_dir_all(&p).unwrap();
            p
        }

        fn write(&self, layer: &str, rel: &str, content: &str) {
            let path = self.layer_dir(layer).join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        fn base(&self) -> Layer {
            Layer::base(self.layer_dir("base"))
        }

        fn stack(&self, name: &str) -> Layer {
            Layer::stack(name, self.layer_dir(name))
        }

        fn out(&self, tag: &str) -> PathBuf {
            self.dir.path().join("out").join(tag)
        }
    }

    fn compose_default(layers: &[Layer], out: &Path) -> ComposeReport {
        compose(layers, out, &ComposeOptions::default()).unwrap()
    }

    #[test]
    fn named_item_from_later_layer_wins() {
        let fx = Fixture::new();
        fx.write("base", "agents/pm.md", "base pm");
        fx.write("rails", "agents/pm.md", "rails pm");
        fx.write("rails", "agents/rails-expert.md", "expert");

        let out = fx.out("a");
        compose_default(&[fx.base(), fx.stack("rails")], &out);

        assert_eq!(
            std::fs::read_to_string(out.join("agents/pm.md")).unwrap(),
            "rails pm"
        );
        assert_eq!(
            std::fs::read_to_string(out.join("agents/rails-expert.md")).unwrap(),
            "expert"
        );
    }

    #[test]
    fn reapplying_a_layer_is_idempotent() {
        let fx = Fixture::new();
        fx.write("rails", "agents/pm.md", "rails pm");
        fx.write("rails", "skills/tdd/SKILL.md", "tdd");

        let once = fx.out("once");
        let twice = fx.out("twice");
        compose_default(&[fx.base(), fx.stack("rails")], &once);
        compose_default(&[fx.base(), fx.stack("rails"), fx.stack("rails")], &twice);

        assert_eq!(
            std::fs::read_to_string(once.join("agents/pm.md")).unwrap(),
            std::fs::read_to_string(twice.join("agents/pm.md")).unwrap()
        );
        assert_eq!(
            std::fs::read_to_string(once.join("skills/tdd/SKILL.md")).unwrap(),
            std::fs::read_to_string(twice.join("skills/tdd/SKILL.md")).unwrap()
        );
    }

    #[test]
    fn item_directories_are_replaced_not_merged() {
        let fx = Fixture::new();
        fx.write("base", "skills/review/SKILL.md", "base skill");
        fx.write("base", "skills/review/checklist.md", "base checklist");
        fx.write("rails", "skills/review/SKILL.md", "rails skill");

        let out = fx.out("a");
        compose_default(&[fx.base(), fx.stack("rails")], &out);

        assert_eq!(
            std::fs::read_to_string(out.join("skills/review/SKILL.md")).unwrap(),
            "rails skill"
        );
        assert!(
            !out.join("skills/review/checklist.md").exists(),
            "stale file from the replaced directory survived"
        );
    }

    #[test]
    fn empty_role_directory_is_a_noop() {
        let fx = Fixture::new();
        std::fs::create_dir_all(fx.layer_dir("rails").join("agents")).unwrap();

        let out = fx.out("a");
        compose_default(&[fx.base(), fx.stack("rails")], &out);
        assert!(!out.join("agents").exists());
    }

    #[test]
    fn opaque_directories_merge_at_file_level() {
        let fx = Fixture::new();
        fx.write("base", "patterns/service-objects.md", "base version");
        fx.write("rails", "patterns/service-objects.md", "rails version");
        fx.write("rails", "patterns/active-record.md", "ar");

        let out = fx.out("a");
        compose_default(&[fx.base(), fx.stack("rails")], &out);

        assert_eq!(
            std::fs::read_to_string(out.join("patterns/service-objects.md")).unwrap(),
            "rails version"
        );
        assert_eq!(
            std::fs::read_to_string(out.join("patterns/active-record.md")).unwrap(),
            "ar"
        );
    }

    #[test]
    fn instructions_concatenate_with_separator_block() {
        let fx = Fixture::new();
        fx.write("base", "CLAUDE.md", "A");
        fx.write("rails", "CLAUDE.md", "B");

        let out = fx.out("a");
        compose_default(&[fx.base(), fx.stack("rails")], &out);

        assert_eq!(
            std::fs::read_to_string(out.join("CLAUDE.md")).unwrap(),
            "A\n\n---\n\n<!-- stack: rails -->\n\nB"
        );
    }

    #[test]
    fn missing_base_instructions_contribute_nothing() {
        let fx = Fixture::new();
        fx.write("rails", "CLAUDE.md", "B");

        let out = fx.out("a");
        compose_default(&[fx.base(), fx.stack("rails")], &out);

        assert_eq!(std::fs::read_to_string(out.join("CLAUDE.md")).unwrap(), "B");
    }

    #[test]
    fn layer_without_instructions_does_not_leave_separator() {
        let fx = Fixture::new();
        fx.write("base", "CLAUDE.md", "A");
        fx.write("nextjs", "CLAUDE.md", "C");
        // rails contributes no CLAUDE.md

        let out = fx.out("a");
        compose_default(&[fx.base(), fx.stack("rails"), fx.stack("nextjs")], &out);

        assert_eq!(
            std::fs::read_to_string(out.join("CLAUDE.md")).unwrap(),
            "A\n\n---\n\n<!-- stack: nextjs -->\n\nC"
        );
    }

    #[test]
    fn no_instructions_means_no_file() {
        let fx = Fixture::new();
        fx.write("rails", "agents/pm.md", "pm");

        let out = fx.out("a");
        let report = compose_default(&[fx.base(), fx.stack("rails")], &out);
        assert!(!out.join("CLAUDE.md").exists());
        assert!(!report.has_instructions);
    }

    #[test]
    fn settings_deep_merge_across_layers() {
        let fx = Fixture::new();
        fx.write(
            "base",
            "settings.json",
            r#"{"permissions": {"allow": ["Read"]}, "model": "sonnet"}"#,
        );
        fx.write(
            "rails",
            "settings.json",
            r#"{"permissions": {"allow": ["Read", "Bash"]}, "model": "opus"}"#,
        );

        let out = fx.out("a");
        let report = compose_default(&[fx.base(), fx.stack("rails")], &out);
        assert!(report.has_settings);

        let merged: Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("settings.json")).unwrap())
                .unwrap();
        assert_eq!(merged["permissions"]["allow"], json!(["Read", "Bash"]));
        assert_eq!(merged["model"], "opus");
    }

    #[test]
    fn no_settings_means_no_file() {
        let fx = Fixture::new();
        fx.write("rails", "CLAUDE.md", "B");

        let out = fx.out("a");
        let report = compose_default(&[fx.base(), fx.stack("rails")], &out);
        assert!(!out.join("settings.json").exists());
        assert!(!report.has_settings);
    }

    #[test]
    fn degraded_mode_takes_last_settings_verbatim() {
        let fx = Fixture::new();
        fx.write("base", "settings.json", r#"{"model": "sonnet", "keep": true}"#);
        fx.write("rails", "settings.json", r#"{"model": "opus"}"#);

        let out = fx.out("a");
        let opts = ComposeOptions {
            settings_mode: SettingsMergeMode::LastLayerWins,
        };
        compose(&[fx.base(), fx.stack("rails")], &out, &opts).unwrap();

        let doc: Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("settings.json")).unwrap())
                .unwrap();
        assert_eq!(doc, json!({"model": "opus"}));
    }

    #[test]
    fn passthrough_files_copy_with_overwrite() {
        let fx = Fixture::new();
        fx.write("base", "README.md", "base readme");
        fx.write("base", "VERSION", "1");
        fx.write("rails", "README.md", "rails readme");

        let out = fx.out("a");
        compose_default(&[fx.base(), fx.stack("rails")], &out);

        assert_eq!(
            std::fs::read_to_string(out.join("README.md")).unwrap(),
            "rails readme"
        );
        assert_eq!(std::fs::read_to_string(out.join("VERSION")).unwrap(), "1");
    }

    #[test]
    fn dependency_list_is_not_copied_to_output() {
        let fx = Fixture::new();
        fx.write("fullstack", "stack.deps", "rails\n");
        fx.write("fullstack", "agents/pm.md", "pm");

        let out = fx.out("a");
        compose_default(&[fx.base(), fx.stack("fullstack")], &out);
        assert!(!out.join("stack.deps").exists());
    }

    #[test]
    fn context_directories_always_created() {
        let fx = Fixture::new();
        let out = fx.out("a");
        compose_default(&[fx.base()], &out);
        assert!(out.join("context").is_dir());
        assert!(out.join("context/features").is_dir());
    }

    #[test]
    fn report_counts_final_items() {
        let fx = Fixture::new();
        fx.write("base", "agents/pm.md", "base pm");
        fx.write("rails", "agents/pm.md", "rails pm");
        fx.write("rails", "agents/rails-expert.md", "expert");
        fx.write("rails", "patterns/ar.md", "ar");

        let out = fx.out("a");
        let report = compose_default(&[fx.base(), fx.stack("rails")], &out);
        assert_eq!(report.role_counts.get("agents"), Some(&2));
        assert_eq!(report.role_counts.get("patterns"), Some(&1));
        assert_eq!(report.role_counts.get("hooks"), None);
        assert_eq!(report.layers, vec!["base", "rails"]);
    }
}
