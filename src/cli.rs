//! Command-line interface module for plugtidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing with clap
//! - Plan preview and confirmation
//! - Execution with progress reporting
//! - Undo and log display

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::OrganizerConfig;
use crate::engine::{ExecutionOutcome, ExecutionReport, MoveEngine, RecordStatus};
use crate::error::OrganizerError;
use crate::matcher::{Matcher, MovePlan, PlanSummary};
use crate::output::OutputFormatter;
use crate::undo::{UndoManager, UndoOutcome, UndoReport};

/// Most undo errors listed individually before the rest are summarized.
const MAX_LISTED_ERRORS: usize = 5;

/// Group plugin binaries and their companion files into per-plugin folders.
#[derive(Debug, Parser)]
#[command(name = "plugtidy", version, about)]
pub struct Cli {
    /// Configuration file (defaults to .plugtidyrc.toml, then ~/.config/plugtidy/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where the undo information is stored
    #[arg(long, global = true, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Print debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: OrganizeCommand,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Subcommand)]
pub enum OrganizeCommand {
    /// Show which files and folders would be moved, without moving anything
    Preview(TargetArgs),
    /// Move plugins and their companion files into per-plugin folders
    Organize {
        #[command(flatten)]
        target: TargetArgs,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Move everything from the last organization back where it was
    Undo,
    /// Print the action log
    Log,
}

/// Directory to organize plus optional folder-name decoration.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Directory containing the plugin files
    pub directory: PathBuf,
    /// Text prepended to every plugin folder name
    #[arg(long)]
    pub prefix: Option<String>,
    /// Text appended to every plugin folder name
    #[arg(long)]
    pub suffix: Option<String>,
}

/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: OrganizerConfig,
    pub record_path: PathBuf,
    pub log_path: PathBuf,
}

impl CliContext {
    /// Builds a context from loaded configuration. An explicit `--record`
    /// overrides the configured record location.
    pub fn new(config: OrganizerConfig, record_override: Option<PathBuf>) -> Self {
        let record_path = record_override.unwrap_or_else(|| config.record_path());
        let log_path = config.log_path();
        Self {
            config,
            record_path,
            log_path,
        }
    }
}

/// Runs a single CLI command.
///
/// # Examples
///
/// ```no_run
/// use plugtidy::cli::{CliContext, OrganizeCommand, run_cli};
/// use plugtidy::config::OrganizerConfig;
///
/// let context = CliContext::new(OrganizerConfig::default(), None);
/// if let Err(e) = run_cli(&OrganizeCommand::Undo, &context) {
///     eprintln!("Error: {:#}", e);
/// }
/// ```
pub fn run_cli(command: &OrganizeCommand, context: &CliContext) -> Result<()> {
    match command {
        OrganizeCommand::Preview(target) => preview_directory(target, context),
        OrganizeCommand::Organize { target, yes } => organize_directory(target, *yes, context),
        OrganizeCommand::Undo => undo_organization(&context.record_path),
        OrganizeCommand::Log => show_log(&context.log_path),
    }
}

/// Computes the plan for `target`, with CLI prefix/suffix overriding the
/// configured ones.
fn plan_for(target: &TargetArgs, config: &OrganizerConfig) -> Result<MovePlan> {
    let rules = config
        .matching
        .compile()
        .context("Invalid matching configuration")?;
    let prefix = target.prefix.as_deref().unwrap_or(&config.naming.prefix);
    let suffix = target.suffix.as_deref().unwrap_or(&config.naming.suffix);

    let plan = Matcher::new(rules)
        .compute_moves(&target.directory, prefix, suffix)
        .with_context(|| format!("Cannot organize {}", target.directory.display()))?;
    Ok(plan)
}

/// Prints the plan and reports whether there is anything to do.
fn present_plan(plan: &MovePlan, config: &OrganizerConfig) -> bool {
    match plan.summary() {
        PlanSummary::NoAnchors => {
            OutputFormatter::info(&format!(
                "No plugin (.{}) files found directly in {}. Nothing to organize.",
                config.matching.anchor_extension,
                plan.directory.display()
            ));
            return false;
        }
        PlanSummary::AnchorsOnly { anchors } => {
            OutputFormatter::plan_preview(plan);
            OutputFormatter::warning(&format!(
                "No associated files or folders were found. Only the {} plugin file(s) will be moved into their folders.",
                anchors
            ));
        }
        PlanSummary::WithAssociations { .. } => OutputFormatter::plan_preview(plan),
    }

    true
}

/// Shows what `organize` would do without touching the filesystem.
fn preview_directory(target: &TargetArgs, context: &CliContext) -> Result<()> {
    OutputFormatter::preview_notice(&format!(
        "Analyzing contents of: {}",
        target.directory.display()
    ));

    let plan = plan_for(target, &context.config)?;
    if present_plan(&plan, &context.config) {
        OutputFormatter::preview_notice("No files were moved. Run 'plugtidy organize' to apply.");
    }
    Ok(())
}

/// Plans, confirms and executes an organization of `target`.
fn organize_directory(target: &TargetArgs, assume_yes: bool, context: &CliContext) -> Result<()> {
    OutputFormatter::info(&format!(
        "Organizing contents of: {}",
        target.directory.display()
    ));

    let plan = plan_for(target, &context.config)?;
    if !present_plan(&plan, &context.config) {
        return Ok(());
    }

    if !assume_yes && !confirm("Proceed with moving these items?")? {
        OutputFormatter::info("Operation cancelled. No files were moved.");
        info!("Organization cancelled by user");
        return Ok(());
    }

    let progress = OutputFormatter::create_progress_bar(plan.len() as u64);
    let report = MoveEngine::execute_with_progress(&plan.moves, &context.record_path, |planned| {
        progress.set_message(planned.item_name());
        progress.inc(1);
    });
    progress.finish_and_clear();

    report_execution(&report, &context.config)
}

/// Prints one message per execution outcome, preceded by any skipped items.
fn report_execution(report: &ExecutionReport, config: &OrganizerConfig) -> Result<()> {
    for missing in &report.skipped_missing {
        OutputFormatter::warning(&format!(
            "Skipped '{}': it no longer exists",
            missing.display()
        ));
    }
    for conflict in &report.skipped_conflicts {
        OutputFormatter::warning(&format!("Skipped: {}", conflict));
    }

    match report.outcome() {
        ExecutionOutcome::NoAnchors => {
            OutputFormatter::info(&format!(
                "No plugin (.{}) files found. Nothing to organize.",
                config.matching.anchor_extension
            ));
            Ok(())
        }
        ExecutionOutcome::NothingMoved => {
            OutputFormatter::info("Organization complete. No files or folders needed moving.");
            Ok(())
        }
        ExecutionOutcome::Success { moved } => {
            OutputFormatter::success(&format!(
                "Organization complete! Moved {} item(s) into plugin folders.",
                moved
            ));
            if let RecordStatus::Saved { path, .. } = &report.record {
                OutputFormatter::plain(&format!(
                    "Undo information saved to {}. Run 'plugtidy undo' to revert.",
                    path.display()
                ));
            }
            Ok(())
        }
        ExecutionOutcome::Partial {
            moved,
            record_saved,
        } => {
            print_fatal(report);
            if record_saved {
                OutputFormatter::warning(&format!(
                    "Stopped after moving {} of {} item(s). Run 'plugtidy undo' to move them back.",
                    moved, report.planned
                ));
            } else {
                print_record_failure(report);
            }
            bail!("organization stopped before completing")
        }
        ExecutionOutcome::PersistFailed { moved } => {
            OutputFormatter::warning(&format!("Moved {} item(s).", moved));
            print_record_failure(report);
            bail!("undo information could not be saved")
        }
        ExecutionOutcome::Failed => {
            print_fatal(report);
            OutputFormatter::plain("No files were moved.");
            bail!("organization failed")
        }
    }
}

fn print_fatal(report: &ExecutionReport) {
    if let Some(fatal) = &report.fatal {
        OutputFormatter::error(&format!("Organization stopped: {}", fatal));
        if fatal.is_permission_denied() {
            OutputFormatter::plain(
                "Check that you have write access to the plugin directory; system plugin folders often need administrator rights.",
            );
        }
    }
}

fn print_record_failure(report: &ExecutionReport) {
    if let RecordStatus::Failed(e) = &report.record {
        OutputFormatter::error(&format!("CRITICAL: {}", e));
        OutputFormatter::error(
            "Undo will NOT be possible for this run. Moved items must be restored manually.",
        );
    }
}

/// Reverts the last organization recorded at `record_path`.
fn undo_organization(record_path: &Path) -> Result<()> {
    OutputFormatter::info("Undoing previous organization...");

    match UndoManager::undo(record_path) {
        Ok(report) => report_undo(&report, record_path),
        Err(OrganizerError::UndoRecordMissing { .. }) => {
            OutputFormatter::info("No undo information found. Nothing to undo.");
            Ok(())
        }
        Err(e @ OrganizerError::UndoRecordCorrupt { .. }) => {
            OutputFormatter::error(&format!("{}", e));
            OutputFormatter::plain("The undo file was left in place so it can be inspected.");
            Ok(())
        }
        Err(e) => {
            OutputFormatter::error(&format!("{}", e));
            Ok(())
        }
    }
}

fn report_undo(report: &UndoReport, record_path: &Path) -> Result<()> {
    for missing in &report.skipped_missing {
        OutputFormatter::warning(&format!(
            "Skipped '{}': it is no longer there",
            missing.display()
        ));
    }
    for kept in &report.kept_folders {
        OutputFormatter::plain(&format!(
            "Kept folder '{}': it is not empty",
            kept.display()
        ));
    }

    match report.outcome() {
        UndoOutcome::NothingRecorded => {
            OutputFormatter::info("Undo information was empty. Nothing to revert.");
        }
        UndoOutcome::NothingReverted => {
            OutputFormatter::info("Undo complete. None of the recorded items needed moving back.");
        }
        UndoOutcome::Reverted {
            reverted,
            removed_folders,
        } => {
            OutputFormatter::success(&format!(
                "Undo complete! Moved {} item(s) back and removed {} empty folder(s).",
                reverted, removed_folders
            ));
        }
        UndoOutcome::CompletedWithErrors {
            errors,
            reverted,
            removed_folders,
        } => {
            OutputFormatter::warning(&format!(
                "Moved {} item(s) back and removed {} empty folder(s), but {} item(s) could not be reverted:",
                reverted, removed_folders, errors
            ));
            for e in report.errors.iter().take(MAX_LISTED_ERRORS) {
                OutputFormatter::error(&format!("  {}", e));
            }
            if errors > MAX_LISTED_ERRORS {
                OutputFormatter::plain(&format!("  ... and {} more", errors - MAX_LISTED_ERRORS));
            }
            OutputFormatter::plain(&format!(
                "Undo information was kept at {}. Fix the issues above and run 'plugtidy undo' again.",
                record_path.display()
            ));
            bail!("undo completed with errors");
        }
    }

    if !report.record_deleted {
        OutputFormatter::warning(&format!(
            "Could not delete undo information at {}",
            record_path.display()
        ));
    }
    Ok(())
}

/// Prints the action log.
fn show_log(log_path: &Path) -> Result<()> {
    match fs::read_to_string(log_path) {
        Ok(content) if content.trim().is_empty() => {
            OutputFormatter::info("The log is empty.");
            Ok(())
        }
        Ok(content) => {
            OutputFormatter::header(&format!("Log: {}", log_path.display()));
            print!("{}", content);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            OutputFormatter::info(&format!("No log found at {}", log_path.display()));
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Cannot read log {}", log_path.display())),
    }
}

/// Asks a yes/no question on stdin. Anything but "y" or "yes" is a no.
fn confirm(question: &str) -> Result<bool> {
    print!("\n{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
