/// Undo functionality for reverting the last organization run.
///
/// Reads the reversal record, moves every item back to where it came from,
/// and removes the plugin folders that end up empty. Undo is best effort:
/// a stuck item is recorded as an error and the remaining items are still
/// restored.
use crate::engine::move_path;
use crate::error::{OrganizerError, OrganizerResult};
use crate::record::ReversalRecord;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of items moved back to their original location.
    pub reverted: usize,
    /// Number of emptied plugin folders that were removed.
    pub removed_folders: usize,
    /// Items no longer present where the record says they are.
    pub skipped_missing: Vec<PathBuf>,
    /// Folders left in place because they still had content.
    pub kept_folders: Vec<PathBuf>,
    /// Per-item failures (occupied original location, failed move).
    pub errors: Vec<OrganizerError>,
    /// The record existed but held no entries.
    pub empty_record: bool,
    /// The record file was deleted at the end.
    pub record_deleted: bool,
}

/// Terminal state of an undo, one per user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The record was empty; nothing to revert.
    NothingRecorded,
    /// Items were reverted without errors.
    Reverted { reverted: usize, removed_folders: usize },
    /// No errors, but every recorded item was already gone.
    NothingReverted,
    /// Some items could not be reverted; the record was kept.
    CompletedWithErrors {
        errors: usize,
        reverted: usize,
        removed_folders: usize,
    },
}

impl UndoReport {
    /// Returns the total number of record entries processed.
    pub fn total_processed(&self) -> usize {
        self.reverted + self.errors.len() + self.skipped_missing.len()
    }

    /// Returns true if no item failed to revert.
    pub fn is_complete_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn outcome(&self) -> UndoOutcome {
        if self.empty_record {
            UndoOutcome::NothingRecorded
        } else if !self.errors.is_empty() {
            UndoOutcome::CompletedWithErrors {
                errors: self.errors.len(),
                reverted: self.reverted,
                removed_folders: self.removed_folders,
            }
        } else if self.reverted > 0 {
            UndoOutcome::Reverted {
                reverted: self.reverted,
                removed_folders: self.removed_folders,
            }
        } else {
            UndoOutcome::NothingReverted
        }
    }
}

enum Restore {
    Restored,
    Missing,
}

/// Manages undo operations for plugin organization.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent organization recorded at `record_path`.
    ///
    /// # Returns
    ///
    /// An `UndoReport` describing what was reverted, skipped and removed.
    /// Returns an error, without touching the filesystem, if the record is
    /// missing, unreadable or corrupt.
    ///
    /// # Edge Cases Handled
    ///
    /// * **Item not found**: skipped with a warning
    /// * **Original location occupied**: recorded as an error, nothing is overwritten
    /// * **Permission denied**: recorded as an error, the remaining items are still reverted
    /// * **Empty record**: nothing to revert, the record file is deleted
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use plugtidy::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// match UndoManager::undo(Path::new("/path/to/undo_log.json")) {
    ///     Ok(report) => println!("Reverted {} item(s)", report.reverted),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(record_path: &Path) -> OrganizerResult<UndoReport> {
        info!(record = %record_path.display(), "Undo operation initiated");

        let record = ReversalRecord::load(record_path).inspect_err(|e| {
            warn!(error = %e, "Undo aborted");
        })?;

        let mut report = UndoReport::default();

        if record.is_empty() {
            info!("Undo information is empty, nothing to revert");
            report.empty_record = true;
            report.record_deleted = Self::delete_record(record_path);
            return Ok(report);
        }

        info!(items = record.len(), "Attempting to undo item moves");
        let mut cleanup_candidates: HashSet<PathBuf> = HashSet::new();

        for (current, original) in record.iter() {
            match Self::restore_item(current, original) {
                Ok(Restore::Restored) => {
                    info!(
                        item = %current.display(),
                        original = %original.display(),
                        "Reverted item"
                    );
                    report.reverted += 1;
                    if let Some(folder) = current.parent() {
                        cleanup_candidates.insert(folder.to_path_buf());
                    }
                }
                Ok(Restore::Missing) => {
                    warn!(
                        item = %current.display(),
                        "Item not found at expected location, skipping revert"
                    );
                    report.skipped_missing.push(current.to_path_buf());
                }
                Err(e) => {
                    warn!(error = %e, "Undo failed for item");
                    report.errors.push(e);
                }
            }
        }

        Self::remove_empty_folders(cleanup_candidates, &mut report);

        if report.is_complete_success() {
            report.record_deleted = Self::delete_record(record_path);
        } else {
            info!(
                errors = report.errors.len(),
                record = %record_path.display(),
                "Undo information preserved due to errors"
            );
        }

        info!(
            reverted = report.reverted,
            removed_folders = report.removed_folders,
            skipped = report.skipped_missing.len(),
            errors = report.errors.len(),
            "Undo finished"
        );
        Ok(report)
    }

    /// Moves one item back to its original location.
    fn restore_item(current: &Path, original: &Path) -> OrganizerResult<Restore> {
        match current.symlink_metadata() {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Restore::Missing),
            Err(source) => {
                return Err(OrganizerError::UndoMoveFailure {
                    current: current.to_path_buf(),
                    original: original.to_path_buf(),
                    source,
                });
            }
        }

        if original.symlink_metadata().is_ok() {
            return Err(OrganizerError::UndoTargetOccupied {
                current: current.to_path_buf(),
                original: original.to_path_buf(),
            });
        }

        if let Some(parent) = original.parent()
            && !parent.is_dir()
        {
            warn!(
                parent = %parent.display(),
                "Original parent directory not found, attempting move anyway"
            );
        }

        move_path(current, original).map_err(|source| OrganizerError::UndoMoveFailure {
            current: current.to_path_buf(),
            original: original.to_path_buf(),
            source,
        })?;

        Ok(Restore::Restored)
    }

    /// Removes candidate folders that are empty, deepest first so nested
    /// folders are cleared before their parents.
    fn remove_empty_folders(candidates: HashSet<PathBuf>, report: &mut UndoReport) {
        let mut folders: Vec<PathBuf> = candidates.into_iter().collect();
        folders.sort_by(|a, b| {
            b.components()
                .count()
                .cmp(&a.components().count())
                .then_with(|| a.cmp(b))
        });

        info!(
            candidates = folders.len(),
            "Attempting removal of emptied folders"
        );

        for folder in folders {
            if !folder.is_dir() {
                continue;
            }
            let is_empty = match fs::read_dir(&folder) {
                Ok(mut entries) => entries.next().is_none(),
                Err(e) => {
                    warn!(folder = %folder.display(), error = %e, "Could not inspect folder");
                    continue;
                }
            };

            if !is_empty {
                info!(folder = %folder.display(), "Folder not empty after revert, not removed");
                report.kept_folders.push(folder);
                continue;
            }

            match fs::remove_dir(&folder) {
                Ok(()) => {
                    info!(folder = %folder.display(), "Removed empty folder");
                    report.removed_folders += 1;
                }
                Err(e) => {
                    warn!(folder = %folder.display(), error = %e, "Could not remove folder");
                }
            }
        }
    }

    /// Deletes the record file, returning whether it is gone.
    fn delete_record(record_path: &Path) -> bool {
        match ReversalRecord::delete(record_path) {
            Ok(()) => {
                info!(record = %record_path.display(), "Undo information removed");
                true
            }
            Err(e) => {
                warn!(
                    record = %record_path.display(),
                    error = %e,
                    "Could not remove undo information"
                );
                false
            }
        }
    }
}
