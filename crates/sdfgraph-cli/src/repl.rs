//! REPL – interactive shell over one loaded document.
//!
//! Supported slash-commands:
//!   /load <FILE>               – load a `.toml` or `.json` document
//!   /scope [NAME]              – select a world or model (no name: default)
//!   /check                     – build and validate every graph
//!   /body <FRAME>              – body the frame is attached to
//!   /pose <FRAME> [RELATIVE]   – pose of a frame relative to the root or another frame
//!   /show                      – document summary
//!   /help                      – show this list
//!   /quit | /exit              – leave the shell

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sdfgraph_types::Root;
use tracing::warn;

use crate::commands;
use crate::config::Config;
use crate::document;
use crate::report;

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(PathBuf),
    Scope(Option<String>),
    Check,
    Body(String),
    Pose {
        frame: String,
        relative_to: Option<String>,
    },
    Show,
    Help,
    Quit,
}

/// Parse one non-empty input line.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = words.collect();

    let command = match (head, args.as_slice()) {
        ("/load", [file]) => Command::Load(PathBuf::from(file)),
        ("/load", _) => return Err("usage: /load <FILE>".to_string()),
        ("/scope", []) => Command::Scope(None),
        ("/scope", [name]) => Command::Scope(Some(name.to_string())),
        ("/scope", _) => return Err("usage: /scope [NAME]".to_string()),
        ("/check", []) => Command::Check,
        ("/body", [frame]) => Command::Body(frame.to_string()),
        ("/body", _) => return Err("usage: /body <FRAME>".to_string()),
        ("/pose", [frame]) => Command::Pose {
            frame: frame.to_string(),
            relative_to: None,
        },
        ("/pose", [frame, target]) => Command::Pose {
            frame: frame.to_string(),
            relative_to: Some(target.to_string()),
        },
        ("/pose", _) => return Err("usage: /pose <FRAME> [RELATIVE_TO]".to_string()),
        ("/show", []) => Command::Show,
        ("/help", _) => Command::Help,
        ("/quit" | "/exit", _) => Command::Quit,
        (other, _) => return Err(format!("unknown command '{other}'")),
    };
    Ok(command)
}

/// Shell state: the settings, the loaded document and the selected scope.
pub struct Session {
    cfg: Config,
    path: Option<PathBuf>,
    root: Option<Root>,
    scope: Option<String>,
}

impl Session {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            path: None,
            root: None,
            scope: None,
        }
    }

    /// Load `path`, replacing the current document and resetting the scope.
    pub fn load(&mut self, path: &Path) -> Result<(), document::DocumentError> {
        let root = document::load(path)?;
        self.path = Some(path.to_path_buf());
        self.root = Some(root);
        self.scope = None;
        Ok(())
    }

    fn prompt(&self) -> String {
        match (&self.path, &self.scope) {
            (None, _) => "sdfgraph>".to_string(),
            (Some(path), None) => format!("sdfgraph [{}]>", file_name(path)),
            (Some(path), Some(scope)) => format!("sdfgraph [{}:{scope}]>", file_name(path)),
        }
    }

    /// Run one command.  Returns `false` when the shell should exit.
    fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Help => cmd_help(),
            Command::Quit => {
                println!("{}", "Goodbye.".green());
                return false;
            }
            Command::Load(path) => match self.load(&path) {
                Ok(()) => println!("{} {}", "✓ Loaded".green(), path.display().to_string().bold()),
                Err(e) => println!("{}: {}", "Load error".red(), e),
            },
            Command::Scope(name) => self.cmd_scope(name),
            Command::Check => {
                if let Some(root) = self.document() {
                    let reports = commands::check(root);
                    let total = report::print_reports(&reports);
                    println!("  {} error(s)", total);
                }
            }
            Command::Body(frame) => {
                if let Some(root) = self.document() {
                    match commands::body(root, self.scope.as_deref(), &frame) {
                        Ok(body) => println!("  {} → {}", frame.bold(), body.green()),
                        Err(e) => println!("{}: {}", "Error".red(), e),
                    }
                }
            }
            Command::Pose { frame, relative_to } => {
                if let Some(root) = self.document() {
                    match commands::pose(root, self.scope.as_deref(), &frame, relative_to.as_deref()) {
                        Ok(pose) => println!("  {}", report::format_pose(pose, &self.cfg)),
                        Err(e) => println!("{}: {}", "Error".red(), e),
                    }
                }
            }
            Command::Show => {
                if let Some(root) = self.document() {
                    print!("{}", report::summary(root, &self.cfg));
                }
            }
        }
        true
    }

    fn cmd_scope(&mut self, name: Option<String>) {
        let Some(root) = self.document() else {
            return;
        };
        let label = match document::select_scope(root, name.as_deref()) {
            Ok(scope) => commands::scope_label(scope),
            Err(e) => {
                println!("{}: {}", "Scope error".red(), e);
                return;
            }
        };
        println!("  Scope: {}", label.bold());
        self.scope = name;
    }

    fn document(&self) -> Option<&Root> {
        if self.root.is_none() {
            println!(
                "{} Use {} first.",
                "No document loaded.".yellow(),
                "/load <FILE>".bold()
            );
        }
        self.root.as_ref()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Entry point for the interactive shell.
///
/// `shutdown` is polled each iteration; when set the shell exits cleanly.
pub fn run(mut session: Session, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", session.prompt().bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "failed to read shell input");
                break;
            }
        }

        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Ok(command) => {
                if !session.execute(command) {
                    break;
                }
            }
            Err(e) => println!(
                "{} {}. Type {} for available commands.",
                "Error:".red(),
                e.yellow(),
                "/help".bold()
            ),
        }
    }
}

fn cmd_help() {
    println!();
    println!("{}", "sdfgraph Commands".bold().underline());
    println!("  {}             – load a .toml or .json document", "/load <FILE>".bold().cyan());
    println!("  {}             – select a world or model", "/scope [NAME]".bold().cyan());
    println!("  {}                   – build and validate every graph", "/check".bold().cyan());
    println!("  {}            – body a frame is attached to", "/body <FRAME>".bold().cyan());
    println!("  {} – pose of a frame", "/pose <FRAME> [RELATIVE_TO]".bold().cyan());
    println!("  {}                    – document summary", "/show".bold().cyan());
    println!("  {}            – leave the shell", "/quit  /exit".bold().cyan());
    println!();
}
