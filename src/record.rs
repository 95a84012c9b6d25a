/// Persisted reversal record for the most recent organization run.
///
/// The record maps every item's current location (inside a plugin folder)
/// to the location it was moved from. Both sides are absolute paths. On
/// disk it is a flat JSON object of strings, e.g.
///
/// ```json
/// {
///   "/plugins/Glow/Glow.aex": "/plugins/Glow.aex"
/// }
/// ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{OrganizerError, OrganizerResult};

/// Destination -> original source mapping for one batch of moves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReversalRecord {
    entries: BTreeMap<PathBuf, PathBuf>,
}

impl ReversalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `original` now lives at `current`.
    pub fn insert(&mut self, current: PathBuf, original: PathBuf) {
        self.entries.insert(current, original);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Original location of the item now at `current`.
    pub fn original_of(&self, current: &Path) -> Option<&Path> {
        self.entries.get(current).map(PathBuf::as_path)
    }

    /// Iterates `(current, original)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.entries
            .iter()
            .map(|(current, original)| (current.as_path(), original.as_path()))
    }

    /// Writes the record to `path`, replacing any previous record.
    ///
    /// The JSON is written to a temporary file next to `path`, synced, and
    /// renamed over the target so a crash never leaves a half-written record.
    pub fn save(&self, path: &Path) -> OrganizerResult<()> {
        let persist_error = |source| OrganizerError::PersistFailure {
            path: path.to_path_buf(),
            source,
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| {
            persist_error(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON serialization failed: {}", e),
            ))
        })?;

        let temp_path = temp_path_for(path);
        let write_result = (|| -> io::Result<()> {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()
        })();

        if let Err(e) = write_result.and_then(|()| fs::rename(&temp_path, path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(persist_error(e));
        }

        debug!(path = %path.display(), entries = self.len(), "Reversal record written");
        Ok(())
    }

    /// Reads the record stored at `path`.
    ///
    /// # Errors
    ///
    /// * [`OrganizerError::UndoRecordMissing`] if there is no record
    /// * [`OrganizerError::UndoRecordUnreadable`] if it cannot be read
    /// * [`OrganizerError::UndoRecordCorrupt`] if it is not a JSON object of paths
    pub fn load(path: &Path) -> OrganizerResult<Self> {
        if !path.exists() {
            return Err(OrganizerError::UndoRecordMissing {
                path: path.to_path_buf(),
            });
        }

        let json = fs::read_to_string(path).map_err(|source| OrganizerError::UndoRecordUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&json).map_err(|source| OrganizerError::UndoRecordCorrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Deletes the record at `path` if there is one.
    pub fn delete(path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            result => result,
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "record".to_string());
    path.with_file_name(format!(".{}.tmp.{}", name, std::process::id()))
}
