use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use spotlight_bridge::appdelegate::snippets::HANDLER_NAME;
use spotlight_bridge::appdelegate::{
    AppDelegatePatcher, CallSiteStatus, PatchMode, PatchOptions, StepOutcome,
};
use spotlight_bridge::config::load_for_project;
use spotlight_bridge::edit::{EditResult, FileRewrite};
use spotlight_bridge::item::{AttributeSet, SearchableItem};
use spotlight_bridge::project::{discover_app_delegate, ProjectGuard};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "spotlight-bridge")]
#[command(about = "CoreSpotlight wiring for Expo apps", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch the app's AppDelegate.swift
    Patch {
        /// Project root (defaults to the current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// AppDelegate.swift to patch, relative to the project root
        /// (discovered under ios/ if not specified)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Config file (defaults to <project>/spotlight-bridge.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fail when any step cannot find its anchor
        #[arg(long)]
        strict: bool,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Report which Spotlight markers the AppDelegate already carries
    Status {
        /// Project root (defaults to the current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// AppDelegate.swift to inspect, relative to the project root
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Config file (defaults to <project>/spotlight-bridge.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate searchable item payloads from a JSON file
    ValidateItems {
        /// JSON file holding one item object or an array of items
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays a clean report
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match cli.command {
        Commands::Patch {
            project,
            file,
            config,
            strict,
            dry_run,
            diff,
        } => cmd_patch(project, file, config, strict, dry_run, diff),

        Commands::Status {
            project,
            file,
            config,
        } => cmd_status(project, file, config),

        Commands::ValidateItems { file } => cmd_validate_items(&file),
    }
}

/// Resolve the project root and the AppDelegate inside it.
fn resolve_target(project: Option<PathBuf>, file: Option<PathBuf>) -> Result<(PathBuf, PathBuf)> {
    let project = match project {
        Some(path) => path,
        None => env::current_dir().context("failed to read current directory")?,
    };
    let guard = ProjectGuard::new(&project)
        .with_context(|| format!("invalid project root {}", project.display()))?;

    let target = match file {
        Some(file) => file,
        None => discover_app_delegate(guard.project_root())?,
    };
    let target = guard.validate_path(&target)?;

    Ok((guard.project_root().to_path_buf(), target))
}

/// Helper: Load patch options from an explicit config or the project default.
fn load_options(project: &Path, config: Option<PathBuf>) -> Result<PatchOptions> {
    Ok(load_for_project(project, config.as_deref())?.patch_options())
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn cmd_patch(
    project: Option<PathBuf>,
    file: Option<PathBuf>,
    config: Option<PathBuf>,
    strict: bool,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let (project, target) = resolve_target(project, file)?;
    let mut options = load_options(&project, config)?;
    if strict {
        options.mode = PatchMode::Strict;
    }

    println!("Project: {}", project.display());
    println!("File: {}", target.display());
    println!();

    let original = fs::read_to_string(&target)
        .with_context(|| format!("failed to read {}", target.display()))?;
    let patcher = AppDelegatePatcher::new(options)?;

    let outcome = match patcher.run(&original) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            eprintln!("  File: {}", target.display());
            eprintln!("  {}", "No changes were written".dimmed());
            std::process::exit(1);
        }
    };

    if dry_run {
        println!("{}", "[DRY RUN - showing what would be applied]".cyan());
    }

    let mut applied = 0;
    let mut already = 0;
    let mut skipped = 0;

    for report in &outcome.steps {
        match &report.outcome {
            StepOutcome::Applied | StepOutcome::InsertedCallback => {
                println!("{} {}: {}", "✓".green(), report.step, report.outcome);
                applied += 1;
            }
            StepOutcome::AlreadyPresent => {
                println!("{} {}: {}", "⊙".yellow(), report.step, report.outcome);
                already += 1;
            }
            StepOutcome::Skipped { .. } => {
                println!("{} {}: {}", "⊘".cyan(), report.step, report.outcome);
                skipped += 1;
            }
        }
    }

    if show_diff && outcome.changed() {
        display_diff(&target, &original, &outcome.text);
    }

    if !dry_run && outcome.changed() {
        match FileRewrite::new(&target, &original, outcome.text).apply()? {
            EditResult::Applied { file, bytes_written } => {
                println!();
                println!(
                    "{}",
                    format!("Wrote {} bytes to {}", bytes_written, file.display()).dimmed()
                );
            }
            EditResult::AlreadyApplied { .. } => {}
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", applied).green());
    println!("  {} already present", format!("{}", already).yellow());
    println!("  {} skipped", format!("{}", skipped).cyan());

    Ok(())
}

fn cmd_status(
    project: Option<PathBuf>,
    file: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let (project, target) = resolve_target(project, file)?;
    let options = load_options(&project, config)?;
    let source = fs::read_to_string(&target)
        .with_context(|| format!("failed to read {}", target.display()))?;

    let status = AppDelegatePatcher::new(options)?.inspect(&source);

    println!("{}", "Spotlight Status Report".bold());
    println!("File: {}", target.display());
    println!();

    let mark = |present: bool| {
        if present {
            "✓".green()
        } else {
            "✗".red()
        }
    };

    if !status.template {
        println!(
            "{} {}",
            "⊘".cyan(),
            "class header not found; the patcher will leave this file unchanged".dimmed()
        );
    }
    println!("{} import CoreSpotlight", mark(status.import));
    println!("{} {} method", mark(status.handler), HANDLER_NAME);
    match status.call_site {
        CallSiteStatus::Wired => println!("{} continue-activity callback wired", mark(true)),
        CallSiteStatus::Unwired => {
            println!("{} continue-activity callback not wired", mark(false))
        }
        CallSiteStatus::Absent => {
            println!("{} continue-activity callback missing", mark(false))
        }
    }

    println!();
    if status.is_complete() {
        println!("{}", "APPLIED".green().bold());
        Ok(())
    } else {
        println!("{}", "NOT APPLIED".yellow().bold());
        std::process::exit(1);
    }
}

fn cmd_validate_items(file: &Path) -> Result<()> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse JSON from {}", file.display()))?;

    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut valid = 0;
    let mut invalid = 0;

    for (index, item) in items.iter().enumerate() {
        match SearchableItem::from_value(item) {
            Ok(parsed) => {
                let attributes = AttributeSet::from_item(&parsed.item);
                println!(
                    "{} {}: {} attributes",
                    "✓".green(),
                    parsed.item.unique_identifier,
                    attributes.populated_count()
                );
                for warning in &parsed.warnings {
                    println!("  {}", format!("warning: {}", warning).yellow());
                }
                valid += 1;
            }
            Err(e) => {
                eprintln!("{} item {}: {}", "✗".red(), index, e);
                invalid += 1;
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} valid", format!("{}", valid).green());
    println!("  {} invalid", format!("{}", invalid).red());

    if invalid > 0 {
        std::process::exit(1);
    }

    Ok(())
}
