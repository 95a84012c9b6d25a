//! Error kinds raised while planning, executing and undoing moves.
//!
//! Every condition the organizer can run into has its own variant so callers
//! can decide what to do by matching on the kind instead of inspecting
//! message text.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while organizing a plugin directory.
#[derive(Debug, Error)]
pub enum OrganizerError {
    /// The directory to scan does not exist or is not a directory.
    #[error("directory not found or invalid: {}", path.display())]
    InvalidInput { path: PathBuf },

    /// Listing the directory failed (permission denied, I/O error).
    #[error("failed to scan directory {}: {source}", path.display())]
    ScanFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A target folder could not be created. Aborts the batch.
    #[error("failed to create folder {}: {source}", path.display())]
    FolderCreationFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Moving an item failed. Aborts the batch.
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    MoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A folder would have been moved into itself. The move is skipped.
    #[error(
        "cannot move folder {} into itself ({}); a folder with the plugin's name probably exists already",
        from.display(),
        to.display()
    )]
    SelfMoveConflict { from: PathBuf, to: PathBuf },

    /// Something already sits at the destination. The move is skipped.
    #[error("destination {} already exists, not moving {}", to.display(), from.display())]
    DestinationOccupied { from: PathBuf, to: PathBuf },

    /// Items were moved but the reversal record could not be written.
    #[error("could not save undo information to {}: {source}", path.display())]
    PersistFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No reversal record exists, so there is nothing to undo.
    #[error("no undo information found at {}", path.display())]
    UndoRecordMissing { path: PathBuf },

    /// The reversal record exists but could not be read.
    #[error("could not read undo information at {}: {source}", path.display())]
    UndoRecordUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The reversal record is not a valid mapping.
    #[error("undo information at {} is corrupt: {source}", path.display())]
    UndoRecordCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The original location is occupied; reverting would overwrite it.
    #[error(
        "original location {} already exists, not reverting {}",
        original.display(),
        current.display()
    )]
    UndoTargetOccupied { current: PathBuf, original: PathBuf },

    /// Moving an item back to its original location failed.
    #[error("failed to move {} back to {}: {source}", current.display(), original.display())]
    UndoMoveFailure {
        current: PathBuf,
        original: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl OrganizerError {
    /// Returns true if this error stops the remaining moves of a batch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FolderCreationFailure { .. } | Self::MoveFailure { .. }
        )
    }

    /// Returns true if the underlying I/O error was a permission problem.
    pub fn is_permission_denied(&self) -> bool {
        let source = match self {
            Self::ScanFailure { source, .. }
            | Self::FolderCreationFailure { source, .. }
            | Self::MoveFailure { source, .. }
            | Self::PersistFailure { source, .. }
            | Self::UndoRecordUnreadable { source, .. }
            | Self::UndoMoveFailure { source, .. } => source,
            _ => return false,
        };
        source.kind() == io::ErrorKind::PermissionDenied
    }
}

/// Result type for organizer operations.
pub type OrganizerResult<T> = Result<T, OrganizerError>;
