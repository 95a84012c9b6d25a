/// Move engine: executes a plan and records how to reverse it.
///
/// Moves are applied in plan order. Failing to create a target folder or to
/// move an item stops the batch; a folder that would move into itself, an
/// occupied destination, or a source that disappeared since planning only
/// skips that one item. Whatever was moved is written to the reversal record
/// so it can be undone, even when the batch stopped early.
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::{OrganizerError, OrganizerResult};
use crate::matcher::PlannedMove;
use crate::record::ReversalRecord;

/// What happened to the reversal record at the end of a run.
#[derive(Debug)]
pub enum RecordStatus {
    /// Nothing was moved, so no record was written.
    NotNeeded,
    /// The record was saved with this many entries.
    Saved { path: PathBuf, entries: usize },
    /// Items were moved but the record could not be saved.
    Failed(OrganizerError),
}

/// Terminal state of an execution, one per user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The plan was empty: no anchor files were found.
    NoAnchors,
    /// Anchors were found but every planned move was skipped.
    NothingMoved,
    /// Every move that could run succeeded and the record was saved.
    Success { moved: usize },
    /// The batch stopped on a fatal error after moving some items.
    Partial { moved: usize, record_saved: bool },
    /// Moves succeeded but the record could not be saved; undo is impossible.
    PersistFailed { moved: usize },
    /// The batch stopped on a fatal error before anything moved.
    Failed,
}

/// Result of executing a plan.
#[derive(Debug)]
pub struct ExecutionReport {
    /// Number of moves in the plan.
    pub planned: usize,
    /// Number of items actually moved.
    pub moved: usize,
    /// Sources that no longer existed when their turn came.
    pub skipped_missing: Vec<PathBuf>,
    /// Non-fatal conflicts: self moves and occupied destinations.
    pub skipped_conflicts: Vec<OrganizerError>,
    /// The error that stopped the batch, if any.
    pub fatal: Option<OrganizerError>,
    pub record: RecordStatus,
}

impl ExecutionReport {
    fn new(planned: usize) -> Self {
        Self {
            planned,
            moved: 0,
            skipped_missing: Vec::new(),
            skipped_conflicts: Vec::new(),
            fatal: None,
            record: RecordStatus::NotNeeded,
        }
    }

    /// Returns true if the batch stopped early or the record could not be saved.
    pub fn had_errors(&self) -> bool {
        self.fatal.is_some() || matches!(self.record, RecordStatus::Failed(_))
    }

    pub fn record_saved(&self) -> bool {
        matches!(self.record, RecordStatus::Saved { .. })
    }

    pub fn outcome(&self) -> ExecutionOutcome {
        if self.planned == 0 {
            return ExecutionOutcome::NoAnchors;
        }
        match (&self.fatal, &self.record) {
            (None, RecordStatus::Failed(_)) => ExecutionOutcome::PersistFailed { moved: self.moved },
            (None, _) if self.moved == 0 => ExecutionOutcome::NothingMoved,
            (None, _) => ExecutionOutcome::Success { moved: self.moved },
            (Some(_), _) if self.moved == 0 => ExecutionOutcome::Failed,
            (Some(_), _) => ExecutionOutcome::Partial {
                moved: self.moved,
                record_saved: self.record_saved(),
            },
        }
    }
}

/// Applies move plans to the filesystem.
pub struct MoveEngine;

impl MoveEngine {
    /// Executes `moves` in order and saves the reversal record to `record_path`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use plugtidy::engine::MoveEngine;
    /// use plugtidy::matcher::compute_moves;
    /// use std::path::Path;
    ///
    /// let plan = compute_moves(Path::new("/path/to/plugins"), "", "").unwrap();
    /// let report = MoveEngine::execute(&plan.moves, Path::new("/path/to/undo_log.json"));
    /// println!("Moved {} item(s)", report.moved);
    /// ```
    pub fn execute(moves: &[PlannedMove], record_path: &Path) -> ExecutionReport {
        Self::execute_with_progress(moves, record_path, |_| {})
    }

    /// Same as [`MoveEngine::execute`], calling `on_step` before each planned move.
    pub fn execute_with_progress(
        moves: &[PlannedMove],
        record_path: &Path,
        mut on_step: impl FnMut(&PlannedMove),
    ) -> ExecutionReport {
        let mut report = ExecutionReport::new(moves.len());
        let mut record = ReversalRecord::new();
        let mut moved_sources: HashSet<&Path> = HashSet::new();

        info!(moves = moves.len(), "Starting execution of move operations");

        for planned in moves {
            on_step(planned);

            if moved_sources.contains(planned.source.as_path()) {
                info!(
                    source = %planned.source.display(),
                    "Skipping move, source already processed in this batch"
                );
                continue;
            }

            let folder = match planned.destination.parent() {
                Some(folder) => folder,
                None => {
                    let e = OrganizerError::MoveFailure {
                        from: planned.source.clone(),
                        to: planned.destination.clone(),
                        source: io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "destination has no parent folder",
                        ),
                    };
                    error!(error = %e, "Move failed, stopping batch");
                    report.fatal = Some(e);
                    break;
                }
            };

            match planned.source.symlink_metadata() {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(
                        source = %planned.source.display(),
                        "Source not found for moving, already moved or deleted?"
                    );
                    report.skipped_missing.push(planned.source.clone());
                    continue;
                }
                Err(source) => {
                    let e = OrganizerError::MoveFailure {
                        from: planned.source.clone(),
                        to: planned.destination.clone(),
                        source,
                    };
                    error!(error = %e, "Cannot inspect source, stopping batch");
                    report.fatal = Some(e);
                    break;
                }
            }

            if let Err(e) = ensure_folder(folder) {
                error!(error = %e, "Folder creation failed, stopping batch");
                report.fatal = Some(e);
                break;
            }

            match move_item(&planned.source, &planned.destination) {
                Ok(()) => {
                    info!(
                        kind = %planned.kind,
                        item = %planned.item_name(),
                        folder = %planned.target_folder_name(),
                        "Moved item"
                    );
                    record.insert(planned.destination.clone(), planned.source.clone());
                    moved_sources.insert(planned.source.as_path());
                    report.moved += 1;
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Move failed, stopping batch");
                    report.fatal = Some(e);
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Skipping move");
                    report.skipped_conflicts.push(e);
                }
            }
        }

        if !record.is_empty() {
            report.record = match record.save(record_path) {
                Ok(()) => {
                    info!(
                        entries = record.len(),
                        path = %record_path.display(),
                        "Undo information saved"
                    );
                    RecordStatus::Saved {
                        path: record_path.to_path_buf(),
                        entries: record.len(),
                    }
                }
                Err(e) => {
                    error!(error = %e, "CRITICAL: undo will not be possible for this operation");
                    // An older record no longer describes the latest batch.
                    if let Err(delete_error) = ReversalRecord::delete(record_path) {
                        warn!(
                            error = %delete_error,
                            path = %record_path.display(),
                            "Could not remove outdated undo information"
                        );
                    }
                    RecordStatus::Failed(e)
                }
            };
        }

        info!(
            planned = report.planned,
            moved = report.moved,
            skipped = report.skipped_missing.len() + report.skipped_conflicts.len(),
            errors = report.had_errors(),
            "Execution finished"
        );
        report
    }
}

/// Creates `folder` (one level only) unless it already exists as a directory.
fn ensure_folder(folder: &Path) -> OrganizerResult<()> {
    if folder.is_dir() {
        return Ok(());
    }
    match fs::create_dir(folder) {
        Ok(()) => {
            info!(folder = %folder.display(), "Created folder");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && folder.is_dir() => {
            info!(folder = %folder.display(), "Folder appeared concurrently");
            Ok(())
        }
        Err(source) => Err(OrganizerError::FolderCreationFailure {
            path: folder.to_path_buf(),
            source,
        }),
    }
}

/// Moves one planned item after checking it cannot land inside itself or
/// overwrite something.
fn move_item(source: &Path, destination: &Path) -> OrganizerResult<()> {
    if source.is_dir() && is_inside(destination, source) {
        return Err(OrganizerError::SelfMoveConflict {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
        });
    }

    if destination.symlink_metadata().is_ok() {
        return Err(OrganizerError::DestinationOccupied {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
        });
    }

    move_path(source, destination).map_err(|e| OrganizerError::MoveFailure {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    })
}

/// True if `path` is `folder` or lies beneath it, lexically or once symlinks
/// and case folding are resolved by the filesystem.
fn is_inside(path: &Path, folder: &Path) -> bool {
    if path.starts_with(folder) {
        return true;
    }
    let parent = path.parent().and_then(|p| fs::canonicalize(p).ok());
    match (parent, fs::canonicalize(folder).ok()) {
        (Some(parent), Some(folder)) => parent.starts_with(folder),
        _ => false,
    }
}

/// Moves a file or folder, copying and deleting when a rename cannot cross
/// filesystems.
pub(crate) fn move_path(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_recursive(from, to)?;
            if from.is_dir() {
                fs::remove_dir_all(from)
            } else {
                fs::remove_file(from)
            }
        }
        result => result,
    }
}

fn copy_recursive(from: &Path, to: &Path) -> io::Result<()> {
    if !from.is_dir() {
        return fs::copy(from, to).map(|_| ());
    }
    fs::create_dir(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
    }
    Ok(())
}
