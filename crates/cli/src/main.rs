use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use forgeline_core::{Engine, Intent, PluginRegistry, ProjectOptions};
use std::env;
use std::path::PathBuf;
use tracing::debug;

/// Plugin-driven build orchestration for generated-source projects
#[derive(Parser)]
#[command(name = "forgeline", version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new project at the given path
    New {
        /// Directory to create the project in
        path: PathBuf,
    },
    /// Resolve plugins and generate sources without building
    Prepare {
        /// Project root (defaults to the nearest forgeline.json)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
    /// Prepare, then run the build phases
    Build {
        /// Project root (defaults to the nearest forgeline.json)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::New { path } => run_new(path),
        Commands::Prepare { root } => {
            let mut engine = engine_for(root)?;
            engine.set_intent(Intent::Prepare);
            engine.prepare()?;
            engine.set_intent(Intent::Finalize);
            engine.finalize()?;
            println!("prepared {} plugin(s)", engine.context().plugin_names.len());
            Ok(())
        }
        Commands::Build { root } => {
            let mut engine = engine_for(root)?;
            engine.set_intent(Intent::Prepare);
            engine.prepare()?;
            engine.set_intent(Intent::Build);
            engine.build()?;
            engine.set_intent(Intent::Finalize);
            engine.finalize()?;
            println!("build finished");
            Ok(())
        }
    }
}

fn run_new(path: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let options = ProjectOptions::new(&path);
    options.save_to_file(&path.join("forgeline.json"))?;

    let registry = PluginRegistry::with_builtins();
    let mut engine = Engine::new(options, &registry)?;
    engine.set_intent(Intent::New);
    engine.new_project()?;
    engine.set_intent(Intent::Finalize);
    engine.finalize()?;

    println!("created project at {}", path.display());
    Ok(())
}

fn engine_for(root: Option<PathBuf>) -> Result<Engine> {
    let start = match root {
        Some(root) => root,
        None => env::current_dir()?,
    };
    let options_file = ProjectOptions::find_options_file(&start)
        .with_context(|| format!("no forgeline.json found from {}", start.display()))?;
    debug!("loading options from {:?}", options_file);

    let mut options = ProjectOptions::load_from_file(&options_file)?;
    if options.root.as_os_str().is_empty() || options.root.is_relative() {
        // Options files usually declare "." for root; anchor it.
        let base = options_file.parent().unwrap_or(&start);
        options.root = base.join(&options.root);
    }

    let registry = PluginRegistry::with_builtins();
    Ok(Engine::new(options, &registry)?)
}
