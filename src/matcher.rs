//! Planning: which entries of a plugin directory move into which folder.
//!
//! The matcher takes one snapshot of a directory's immediate children and
//! makes two passes over it. The first pass finds anchor files (by
//! extension) and derives a target folder for each. The second pass assigns
//! every other entry to at most one anchor using the rules in
//! [`crate::association`], trying longer base names before shorter ones so
//! that `PluginProPresets` goes to `PluginPro` rather than `Plugin`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::association::{MatchReason, relate_lowercase};
use crate::config::MatchRules;
use crate::error::{OrganizerError, OrganizerResult};

/// Leading character of anchor base names that are internal and never organized.
pub const INTERNAL_MARKER: char = '_';

/// Whether an entry is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "File"),
            EntryKind::Folder => write!(f, "Folder"),
        }
    }
}

/// One child of the scanned directory, as seen by a single listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_folder: bool,
    pub path: PathBuf,
}

impl DirectoryEntry {
    pub fn kind(&self) -> EntryKind {
        if self.is_folder {
            EntryKind::Folder
        } else {
            EntryKind::File
        }
    }
}

/// An anchor file and the folder its plugin is gathered into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Name of the anchor file itself, e.g. `Plugin.aex`.
    pub file_name: String,
    /// File name without the anchor extension, e.g. `Plugin`.
    pub base_name: String,
    /// `prefix + base_name + suffix`.
    pub target_folder_name: String,
    pub target_folder_path: PathBuf,
}

/// Why an item is part of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveRole {
    /// The anchor file moving into its own folder.
    Anchor,
    /// An item associated with the anchor whose base name is `base`.
    Associated { base: String, reason: MatchReason },
}

/// A single planned move. The destination's parent is always an anchor's
/// target folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: EntryKind,
    pub role: MoveRole,
}

impl PlannedMove {
    /// Creates a plain file move with no association metadata.
    #[cfg(test)]
    pub(crate) fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            kind: EntryKind::File,
            role: MoveRole::Anchor,
        }
    }

    /// Name of the item being moved.
    pub fn item_name(&self) -> String {
        file_name_of(&self.source)
    }

    /// Name of the folder the item moves into.
    pub fn target_folder_name(&self) -> String {
        self.destination
            .parent()
            .map(file_name_of)
            .unwrap_or_default()
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// What a plan contains, for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSummary {
    /// No anchor files were found; the plan is empty.
    NoAnchors,
    /// Anchors were found but nothing else is associated with them.
    AnchorsOnly { anchors: usize },
    /// Anchors and associated items.
    WithAssociations { anchors: usize, associated: usize },
}

/// The ordered list of moves computed for one directory.
#[derive(Debug, Clone, Default)]
pub struct MovePlan {
    pub directory: PathBuf,
    pub anchors: Vec<Anchor>,
    pub moves: Vec<PlannedMove>,
}

impl MovePlan {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Number of planned moves that are not anchor files.
    pub fn associated_count(&self) -> usize {
        self.moves
            .iter()
            .filter(|m| matches!(m.role, MoveRole::Associated { .. }))
            .count()
    }

    pub fn summary(&self) -> PlanSummary {
        match (self.anchors.len(), self.associated_count()) {
            (0, _) => PlanSummary::NoAnchors,
            (anchors, 0) => PlanSummary::AnchorsOnly { anchors },
            (anchors, associated) => PlanSummary::WithAssociations {
                anchors,
                associated,
            },
        }
    }

    /// Moves grouped by target folder name, each group sorted by item name.
    pub fn grouped(&self) -> BTreeMap<String, Vec<&PlannedMove>> {
        let mut groups: BTreeMap<String, Vec<&PlannedMove>> = BTreeMap::new();
        for planned in &self.moves {
            groups
                .entry(planned.target_folder_name())
                .or_default()
                .push(planned);
        }
        for items in groups.values_mut() {
            items.sort_by_key(|m| m.item_name());
        }
        groups
    }
}

/// Computes move plans for plugin directories.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    rules: MatchRules,
}

impl Matcher {
    pub fn new(rules: MatchRules) -> Self {
        Self { rules }
    }

    /// Computes the moves that gather each anchor and its associated items
    /// into `prefix + base name + suffix` folders inside `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizerError::InvalidInput`] if `directory` is not an
    /// existing directory, and [`OrganizerError::ScanFailure`] if it cannot
    /// be listed. No plan is produced in either case.
    pub fn compute_moves(
        &self,
        directory: &Path,
        prefix: &str,
        suffix: &str,
    ) -> OrganizerResult<MovePlan> {
        if !directory.is_dir() {
            warn!(directory = %directory.display(), "Invalid directory, nothing to plan");
            return Err(OrganizerError::InvalidInput {
                path: directory.to_path_buf(),
            });
        }

        let directory =
            std::path::absolute(directory).map_err(|source| OrganizerError::ScanFailure {
                path: directory.to_path_buf(),
                source,
            })?;
        let listing = self.scan(&directory)?;

        info!(
            directory = %directory.display(),
            entries = listing.len(),
            "Pass 1: identifying anchor files"
        );

        let mut plan = MovePlan {
            directory: directory.clone(),
            ..Default::default()
        };
        let mut registered: HashMap<String, usize> = HashMap::new();
        let mut processed: HashSet<usize> = HashSet::new();

        for (index, entry) in listing.iter().enumerate() {
            if entry.is_folder {
                continue;
            }
            let Some(base) = anchor_base_name(&entry.name, &self.rules.anchor_extension) else {
                continue;
            };
            if base.starts_with(INTERNAL_MARKER) {
                info!(anchor = %entry.name, "Skipping internal anchor");
                continue;
            }

            let key = base.to_lowercase();
            if let Some(&first) = registered.get(&key) {
                info!(
                    anchor = %entry.name,
                    kept = %plan.anchors[first].file_name,
                    "Skipping duplicate anchor, base name already registered"
                );
                processed.insert(index);
                continue;
            }

            let target_folder_name = format!("{prefix}{base}{suffix}");
            let target_folder_path = directory.join(&target_folder_name);
            info!(
                anchor = %entry.name,
                base,
                folder = %target_folder_name,
                "Identified anchor"
            );

            plan.moves.push(PlannedMove {
                source: entry.path.clone(),
                destination: target_folder_path.join(&entry.name),
                kind: EntryKind::File,
                role: MoveRole::Anchor,
            });
            processed.insert(index);
            registered.insert(key, plan.anchors.len());
            plan.anchors.push(Anchor {
                file_name: entry.name.clone(),
                base_name: base.to_string(),
                target_folder_name,
                target_folder_path,
            });
        }

        if plan.anchors.is_empty() {
            info!("Pass 1 complete: no organizable anchor files found");
            return Ok(plan);
        }
        info!(
            anchors = plan.anchors.len(),
            "Pass 1 complete: unique anchor base names found"
        );

        // Longest base name first; ties broken by name so the order is total.
        let mut candidates: Vec<(String, usize)> = registered.into_iter().collect();
        candidates.sort_by(|(a, _), (b, _)| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });

        info!("Pass 2: identifying associated files and folders");
        for (index, entry) in listing.iter().enumerate() {
            if processed.contains(&index) {
                continue;
            }
            let lower = entry.name.to_lowercase();

            for (key, anchor_index) in &candidates {
                let Some(reason) = relate_lowercase(&lower, entry.is_folder, key) else {
                    continue;
                };
                let anchor = &plan.anchors[*anchor_index];
                processed.insert(index);

                if entry.is_folder && entry.name == anchor.target_folder_name {
                    info!(
                        folder = %entry.name,
                        anchor = %anchor.file_name,
                        "Skipping associated folder, its name matches the target folder"
                    );
                    break;
                }

                info!(
                    kind = %entry.kind(),
                    item = %entry.name,
                    base = %anchor.base_name,
                    %reason,
                    folder = %anchor.target_folder_name,
                    "Identified associated item"
                );
                let planned = PlannedMove {
                    source: entry.path.clone(),
                    destination: anchor.target_folder_path.join(&entry.name),
                    kind: entry.kind(),
                    role: MoveRole::Associated {
                        base: anchor.base_name.clone(),
                        reason,
                    },
                };
                plan.moves.push(planned);
                break;
            }
        }

        info!(moves = plan.moves.len(), "Pass 2 complete: computed move operations");
        Ok(plan)
    }

    /// Lists the immediate children of `directory`, sorted by name, with
    /// excluded entries removed.
    fn scan(&self, directory: &Path) -> OrganizerResult<Vec<DirectoryEntry>> {
        let scan_error = |source| OrganizerError::ScanFailure {
            path: directory.to_path_buf(),
            source,
        };

        let mut listing = Vec::new();
        for entry in fs::read_dir(directory).map_err(scan_error)? {
            let entry = entry.map_err(scan_error)?;
            let path = entry.path();
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(entry = ?raw, "Skipping entry with a non UTF-8 name");
                    continue;
                }
            };
            let is_folder = path.is_dir();

            if !self.rules.filters.should_include(&name, is_folder) {
                info!(entry = %name, "Entry excluded by filters");
                continue;
            }
            listing.push(DirectoryEntry {
                name,
                is_folder,
                path,
            });
        }

        listing.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listing)
    }
}

/// Computes a plan with the default anchor extension and filters.
pub fn compute_moves(directory: &Path, prefix: &str, suffix: &str) -> OrganizerResult<MovePlan> {
    Matcher::default().compute_moves(directory, prefix, suffix)
}

/// Returns the base name if `name` ends with `.` + `extension` (ASCII
/// case-insensitive) and something precedes it.
fn anchor_base_name<'a>(name: &'a str, extension: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(extension.len() + 1)?;
    let base = name.get(..split)?;
    let tail = name.get(split..)?.strip_prefix('.')?;
    (!base.is_empty() && tail.eq_ignore_ascii_case(extension)).then_some(base)
}
