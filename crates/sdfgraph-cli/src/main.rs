//! `sdfgraph` – frame-semantics checker for robot and world descriptions.
//!
//! This binary:
//!
//! 1. Loads `~/.sdfgraph/config.toml` (or `--config PATH`) plus `SDFGRAPH_*`
//!    environment overrides and installs structured logging.
//! 2. Loads a `.toml` or `.json` scene document.
//! 3. Runs one command: `check`, `body`, `pose`, `show`, `schema`, or the
//!    interactive `shell` (Ctrl-C leaves the shell).

mod commands;
mod config;
mod document;
mod repl;
mod report;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use crate::config::{Config, LogFormat};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "sdfgraph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build, validate and query the frame graphs of scene descriptions", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.sdfgraph/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and validate every graph of every world and model.
    Check { file: PathBuf },

    /// Print the body (link or world) a frame is attached to.
    Body {
        file: PathBuf,
        frame: String,
        /// World or model to query (default: first world, else first model).
        #[arg(long)]
        scope: Option<String>,
    },

    /// Print the pose of a frame relative to the scope root or another frame.
    Pose {
        file: PathBuf,
        frame: String,
        #[arg(long)]
        relative_to: Option<String>,
        /// World or model to query (default: first world, else first model).
        #[arg(long)]
        scope: Option<String>,
    },

    /// Print a summary of the document tree.
    Show { file: PathBuf },

    /// Print the JSON schema of the document format.
    Schema,

    /// Interactive shell with slash-commands.
    Shell { file: Option<PathBuf> },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cfg = match config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };
    init_logging(&cfg);

    match run(cli.cmd, cfg) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

/// Initialise tracing-subscriber.  `RUST_LOG` wins over the configured
/// level; `log_format = "json"` emits newline-delimited JSON on stderr.
fn init_logging(cfg: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.log_level));

    match cfg.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .init(),
    }
}

fn run(cmd: Commands, cfg: Config) -> Result<ExitCode> {
    match cmd {
        Commands::Check { file } => {
            let root = document::load(&file)?;
            println!("Checking {}", file.display().to_string().bold());
            let reports = commands::check(&root);
            let total = report::print_reports(&reports);
            if total > 0 {
                println!("{} {} error(s)", "✗".red().bold(), total);
                return Ok(ExitCode::FAILURE);
            }
            println!("{} no errors", "✓".green().bold());
        }
        Commands::Body { file, frame, scope } => {
            let root = document::load(&file)?;
            println!("{}", commands::body(&root, scope.as_deref(), &frame)?);
        }
        Commands::Pose {
            file,
            frame,
            relative_to,
            scope,
        } => {
            let root = document::load(&file)?;
            let pose = commands::pose(&root, scope.as_deref(), &frame, relative_to.as_deref())?;
            println!("{}", report::format_pose(pose, &cfg));
        }
        Commands::Show { file } => {
            let root = document::load(&file)?;
            print!("{}", report::summary(&root, &cfg));
        }
        Commands::Schema => println!("{}", commands::schema()?),
        Commands::Shell { file } => run_shell(file.as_deref(), cfg),
    }
    Ok(ExitCode::SUCCESS)
}

fn run_shell(file: Option<&Path>, cfg: Config) {
    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – leaving the shell …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; use /quit to leave the shell");
    }

    println!(
        "  {} {}",
        "sdfgraph".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );

    let mut session = repl::Session::new(cfg);
    if let Some(path) = file {
        match session.load(path) {
            Ok(()) => println!("  Loaded {}", path.display().to_string().bold()),
            Err(e) => println!("{}: {}", "Load error".red(), e),
        }
    }
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(session, shutdown);
}
