//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress tracking and plan previews.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::matcher::{EntryKind, MovePlan, MoveRole, PlannedMove};

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for move batches
/// - Plan previews with per-folder counts
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use plugtidy::output::OutputFormatter;
    /// OutputFormatter::success("Plugins organized successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for a batch of `total` moves.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use plugtidy::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(10);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the planned moves grouped by target folder, each heading
    /// carrying that folder's plugin and associated item counts.
    pub fn plan_preview(plan: &MovePlan) {
        Self::header("The following files and folders will be moved:");

        let groups = plan.grouped();
        for (folder, items) in &groups {
            println!("📁 Into folder: {}", Self::folder_heading(folder, items).bold());
            for planned in items {
                let icon = match planned.kind {
                    EntryKind::Folder => "📁",
                    EntryKind::File => "📄",
                };
                println!("  {} Move: '{}' [{}]", icon, planned.item_name(), planned.kind);
            }
        }

        println!(
            "\n{} plugin(s), {} associated item(s), {} folder(s)",
            plan.anchors.len().to_string().green(),
            plan.associated_count().to_string().green(),
            groups.len().to_string().green()
        );
    }

    /// Heading for one target folder, e.g. `Glow (1 plugin, 2 associated)`.
    pub fn folder_heading(folder: &str, items: &[&PlannedMove]) -> String {
        let anchors = items
            .iter()
            .filter(|m| matches!(m.role, MoveRole::Anchor))
            .count();
        let associated = items.len() - anchors;
        let plugin_word = if anchors == 1 { "plugin" } else { "plugins" };
        if associated == 0 {
            format!("{} ({} {})", folder, anchors, plugin_word)
        } else {
            format!("{} ({} {}, {} associated)", folder, anchors, plugin_word, associated)
        }
    }

    /// Prints a preview-only notice.
    pub fn preview_notice(message: &str) {
        println!("{}", format!("[PREVIEW] {}", message).yellow());
    }
}
