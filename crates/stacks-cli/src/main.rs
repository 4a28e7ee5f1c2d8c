mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stacks",
    about = "Compose layered agent configuration stacks into a project's .claude/ directory",
    version,
    propagate_version = true
)]
struct Cli {
    /// Stacks root containing base/ and stacks/ (default: auto-detect)
    #[arg(long, global = true, env = "STACKS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose stacks and install them into a target project
    Install {
        /// Ordered stack names: "rails+nextjs" or "rails,nextjs"
        stacks: String,

        /// Target project directory
        target: PathBuf,

        /// Overwrite an existing .claude/ directory
        #[arg(long)]
        force: bool,

        /// Keep the existing context/ directory when using --force
        #[arg(long)]
        preserve_context: bool,
    },

    /// Compose stacks into a directory without installing
    Compose {
        /// Ordered stack names: "rails+nextjs" or "rails,nextjs"
        stacks: String,

        /// Output directory (created; must be empty if it exists)
        #[arg(long)]
        out: PathBuf,

        /// Skip the settings deep-merge: take the last stack's settings.json
        /// verbatim (drops earlier layers' settings — a warning is emitted)
        #[arg(long)]
        no_settings_merge: bool,
    },

    /// List available stacks
    List,

    /// Show what is installed in a target project
    Status {
        /// Target project directory
        target: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Diagnostics go to stderr so --json output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Install {
            stacks,
            target,
            force,
            preserve_context,
        } => cmd::install::run(&root, &stacks, &target, force, preserve_context, cli.json),
        Commands::Compose {
            stacks,
            out,
            no_settings_merge,
        } => cmd::compose::run(&root, &stacks, &out, no_settings_merge, cli.json),
        Commands::List => cmd::list::run(&root, cli.json),
        Commands::Status { target } => cmd::status::run(&target, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
