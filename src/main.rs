//! `paralabel` CLI - Inspect paragraph task data the way the engine sees it

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use paralabel::config::default_config_path;
use paralabel::{AnnotationEngine, EngineFlags, HttpRowFetcher, ParagraphsConfig, SimulatedClock, ValueType};

#[derive(Parser)]
#[command(name = "paralabel")]
#[command(about = "Load, index and time-sync dialogue paragraph data")]
#[command(version)]
struct Cli {
    /// Component config (TOML); defaults to the user config file if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data reference when no config file is used
    #[arg(long, global = true, default_value = "$dialogue")]
    value: String,

    /// Treat the data reference as a URL to fetch
    #[arg(long, global = true)]
    url: bool,

    /// Secure mode (changes value type and text-saving defaults)
    #[arg(long, global = true)]
    secure: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load task data and report rows, authors and errors
    Load {
        /// Task JSON file
        task: PathBuf,
    },

    /// Print the row index active at a playback time (-1 if none)
    At {
        /// Task JSON file
        task: PathBuf,

        /// Time in seconds
        time: f64,
    },

    /// Print each row's playback window for a given media duration
    Windows {
        /// Task JSON file
        task: PathBuf,

        /// Media duration in seconds
        #[arg(short, long)]
        duration: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = load_config(&cli)?;
    let flags = EngineFlags {
        secure_mode: cli.secure,
        ..EngineFlags::default()
    };

    match cli.command {
        Commands::Load { task } => {
            let engine = load_engine(&config, flags, &task).await?;
            cmd_load(&engine);
        }
        Commands::At { task, time } => {
            let engine = load_engine(&config, flags, &task).await?;
            print_errors(&engine);
            let index = engine
                .region_at(time)
                .map_or(-1, |i| i64::try_from(i).unwrap_or(i64::MAX));
            println!("{index}");
        }
        Commands::Windows { task, duration } => {
            let mut engine = load_engine(&config, flags, &task)
                .await?
                .with_clock(Box::new(SimulatedClock::new(Some(duration))));
            print_errors(&engine);
            cmd_windows(&mut engine);
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ParagraphsConfig> {
    if let Some(path) = &cli.config {
        return ParagraphsConfig::load(path);
    }

    let default_path = default_config_path();
    let mut config = if default_path.exists() {
        ParagraphsConfig::load(&default_path)?
    } else {
        ParagraphsConfig::new(cli.value.clone())
    };
    if cli.url {
        config = config.with_value_type(ValueType::Url);
    }
    Ok(config)
}

async fn load_engine(
    config: &ParagraphsConfig,
    flags: EngineFlags,
    task_path: &Path,
) -> Result<AnnotationEngine> {
    let content = tokio::fs::read_to_string(task_path)
        .await
        .with_context(|| format!("failed to read {}", task_path.display()))?;
    let task: Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in {}", task_path.display()))?;

    let fetcher = Arc::new(HttpRowFetcher::new()?);
    let mut engine = AnnotationEngine::new(config, flags, fetcher);
    engine.set_value(&task).await;
    Ok(engine)
}

fn cmd_load(engine: &AnnotationEngine) {
    println!("version: {}", engine.version());
    println!("rows: {}", engine.rows().len());
    println!("authors: {}", engine.authors().join(", "));
    print_errors(engine);
}

fn cmd_windows(engine: &mut AnnotationEngine) {
    for index in 0..engine.rows().len() {
        match engine.current_window(index) {
            Some(window) => println!("{index}\t{:.3}\t{:.3}", window.start, window.end),
            None => println!("{index}\t-\t-"),
        }
    }
}

fn print_errors(engine: &AnnotationEngine) {
    for error in engine.errors() {
        println!("error: {}", error.message);
    }
}
