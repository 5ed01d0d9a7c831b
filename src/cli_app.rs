//! Top-level CLI definition and dispatch for the `dsa` binary.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;

use crate::core::config::{AgentConfig, ScanMode, ScanRequest};
use crate::core::errors::{DsaError, Result};
use crate::logger::JsonlLogger;
use crate::scanner::checkpoint::Checkpoint;
use crate::scanner::report::ScanReport;
use crate::scanner::walker::ScanEngine;

/// Disk Survey Agent — budgeted filesystem analysis for fleet endpoints.
#[derive(Parser)]
#[command(name = "dsa", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Run one scan invocation and print the report.
    Scan(ScanArgs),
    /// Generate shell completions.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Flags for the `scan` subcommand.
#[derive(Args)]
pub struct ScanArgs {
    /// Root directory to scan.
    pub path: PathBuf,
    /// Run a shallow, target-focused incremental scan.
    #[arg(long)]
    pub incremental: bool,
    /// Maximum traversal depth.
    #[arg(long)]
    pub max_depth: Option<u32>,
    /// Largest-files list capacity.
    #[arg(long)]
    pub top_files: Option<usize>,
    /// Largest-directories list capacity.
    #[arg(long)]
    pub top_dirs: Option<usize>,
    /// Entry ceiling for this invocation.
    #[arg(long)]
    pub max_entries: Option<u64>,
    /// Wall-clock budget in seconds.
    #[arg(long)]
    pub timeout_seconds: Option<u64>,
    /// Resolve and descend into symlinked directories.
    #[arg(long)]
    pub follow_symlinks: bool,
    /// Worker-pool size.
    #[arg(long)]
    pub workers: Option<usize>,
    /// Read a prior checkpoint from (and write the next one to) this file.
    #[arg(long)]
    pub checkpoint_file: Option<PathBuf>,
    /// Incremental mode: directory to re-scan (repeatable).
    #[arg(long = "target-dir")]
    pub target_dirs: Vec<PathBuf>,
    /// TOML file with endpoint-wide defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Append scan events to this JSONL file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// Print the raw JSON report instead of a human summary.
    #[arg(long)]
    pub json: bool,
}

/// Dispatch CLI commands.
///
/// # Errors
/// Returns an error if the subcommand fails.
pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Scan(args) => run_scan(args),
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "dsa", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn run_scan(args: &ScanArgs) -> Result<()> {
    let mut request = ScanRequest {
        scan_mode: if args.incremental {
            ScanMode::Incremental
        } else {
            ScanMode::Baseline
        },
        max_depth: args.max_depth,
        top_files: args.top_files,
        top_dirs: args.top_dirs,
        max_entries: args.max_entries,
        timeout_seconds: args.timeout_seconds,
        follow_symlinks: args.follow_symlinks,
        workers: args.workers,
        target_directories: args.target_dirs.clone(),
        ..ScanRequest::new(args.path.clone())
    };

    let agent_config = match &args.config {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::default(),
    };
    agent_config.apply(&mut request);

    if let Some(path) = &args.checkpoint_file
        && path.exists()
    {
        let raw = std::fs::read_to_string(path).map_err(|err| DsaError::io(path, err))?;
        let checkpoint: Checkpoint = serde_json::from_str(&raw)?;
        request.checkpoint = Some(checkpoint);
    }

    let mut engine = ScanEngine::new();
    if !agent_config.trash_paths.is_empty() {
        engine = engine.with_trash_paths(agent_config.trash_paths.clone());
    }
    let log_destination = args.log_file.clone().or(agent_config.log_file);
    if let Some(path) = log_destination {
        engine = engine.with_logger(Arc::new(JsonlLogger::open(&path)?));
    }

    let report = engine.run(&request)?;

    if let Some(path) = &args.checkpoint_file {
        match &report.checkpoint {
            Some(checkpoint) => {
                let payload = serde_json::to_string(checkpoint)?;
                std::fs::write(path, payload).map_err(|err| DsaError::io(path, err))?;
            }
            None => {
                // A finished scan invalidates any stale checkpoint on disk.
                if path.exists() {
                    std::fs::remove_file(path).map_err(|err| DsaError::io(path, err))?;
                }
            }
        }
    }

    if args.json {
        let mut stdout = std::io::stdout().lock();
        let payload = serde_json::to_string_pretty(&report)?;
        writeln!(stdout, "{payload}").map_err(|err| DsaError::io("stdout", err))?;
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &ScanReport) {
    println!("{} {}", "scan".bold(), report.path);
    println!(
        "  files {}  dirs {}  bytes {}  depth {}",
        report.summary.files_scanned,
        report.summary.dirs_scanned,
        human_bytes(report.summary.bytes_scanned),
        report.summary.max_depth_reached,
    );
    if report.partial {
        let reason = report.reason.as_deref().unwrap_or("unknown");
        println!("  {} {}", "partial:".yellow().bold(), reason);
        if let Some(checkpoint) = &report.checkpoint {
            println!(
                "  {} {} pending directories (rerun with --checkpoint-file to resume)",
                "checkpoint:".yellow(),
                checkpoint.pending_dirs.len()
            );
        }
    }
    if !report.errors.is_empty() {
        println!(
            "  {} {} recorded ({} permission denied)",
            "errors:".red(),
            report.errors.len(),
            report.summary.permission_denied_count
        );
    }

    if !report.top_largest_files.is_empty() {
        println!("{}", "largest files".bold());
        for entry in report.top_largest_files.iter().take(10) {
            println!("  {:>10}  {}", human_bytes(entry.size_bytes), entry.path);
        }
    }
    if !report.top_largest_dirs.is_empty() {
        println!("{}", "largest directories".bold());
        for entry in report.top_largest_dirs.iter().take(10) {
            let marker = if entry.incomplete { " (incomplete)" } else { "" };
            println!(
                "  {:>10}  {}{}",
                human_bytes(entry.size_bytes),
                entry.path,
                marker.dimmed()
            );
        }
    }
    if !report.temp_accumulation.is_empty() {
        println!("{}", "temp/cache accumulation".bold());
        for usage in &report.temp_accumulation {
            println!("  {:>10}  {}", human_bytes(usage.bytes), usage.category);
        }
    }
    if !report.trash_usage.is_empty() {
        println!("{}", "trash".bold());
        for usage in &report.trash_usage {
            println!("  {:>10}  {}", human_bytes(usage.size_bytes), usage.path);
        }
    }
    if !report.duplicate_candidates.is_empty() {
        println!(
            "{} {} groups",
            "duplicate candidates:".bold(),
            report.duplicate_candidates.len()
        );
    }
    if !report.cleanup_candidates.is_empty() {
        println!(
            "{} {} paths",
            "cleanup candidates:".bold(),
            report.cleanup_candidates.len()
        );
    }
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
