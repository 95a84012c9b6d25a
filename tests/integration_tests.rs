use plugtidy::cli::{CliContext, OrganizeCommand, TargetArgs, run_cli};
/// Integration tests for plugtidy
///
/// These tests simulate real-world usage scenarios, testing the complete
/// end-to-end functionality of the plugin organizer.
///
/// Test categories:
/// 1. Basic organization workflows
/// 2. Naming and matching rules
/// 3. Failure handling and undo
/// 4. Configuration and filtering
/// 5. Command-level flows
use plugtidy::config::{OrganizerConfig, StorageConfig};
use plugtidy::engine::{ExecutionOutcome, MoveEngine};
use plugtidy::error::OrganizerError;
use plugtidy::matcher::{Matcher, compute_moves};
use plugtidy::record::ReversalRecord;
use plugtidy::undo::{UndoManager, UndoOutcome};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture with a plugin directory and, next to it, a place for the
/// undo record and the log.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty plugin directory.
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("plugins")).expect("Failed to create plugin dir");
        TestFixture { temp_dir }
    }

    /// Get the path to the plugin directory.
    fn path(&self) -> PathBuf {
        self.temp_dir.path().join("plugins")
    }

    fn record_path(&self) -> PathBuf {
        self.temp_dir.path().join("undo_log.json")
    }

    fn log_path(&self) -> PathBuf {
        self.temp_dir.path().join("plugtidy.log")
    }

    /// Create a file with content in the plugin directory.
    fn create_file(&self, name: &str, content: &str) {
        let file_path = self.path().join(name);
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content.as_bytes())
            .expect("Failed to write file content");
    }

    /// Create several files at once, each containing its own name.
    fn create_files(&self, names: &[&str]) {
        for name in names {
            self.create_file(name, name);
        }
    }

    /// Create a subdirectory in the plugin directory.
    fn create_subdir(&self, name: &str) {
        fs::create_dir(self.path().join(name)).expect("Failed to create subdirectory");
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    /// Every path under the plugin directory, relative and sorted.
    fn snapshot(&self) -> Vec<String> {
        fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
            for entry in fs::read_dir(dir).expect("Failed to read directory") {
                let path = entry.expect("Failed to read entry").path();
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().to_string();
                out.push(rel);
                if path.is_dir() {
                    walk(root, &path, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.path(), &self.path(), &mut out);
        out.sort();
        out
    }

    /// Command context whose record and log live inside the fixture.
    fn context(&self) -> CliContext {
        let config = OrganizerConfig {
            storage: StorageConfig {
                record_path: Some(self.record_path()),
                log_path: Some(self.log_path()),
            },
            ..OrganizerConfig::default()
        };
        CliContext::new(config, None)
    }

    fn target(&self) -> TargetArgs {
        TargetArgs {
            directory: self.path(),
            prefix: None,
            suffix: None,
        }
    }

    /// Plans and executes with default rules.
    fn organize(&self, prefix: &str, suffix: &str) -> plugtidy::ExecutionReport {
        let plan = compute_moves(&self.path(), prefix, suffix).expect("Failed to plan");
        MoveEngine::execute(&plan.moves, &self.record_path())
    }
}

// ============================================================================
// Basic organization workflows
// ============================================================================

#[test]
fn test_organize_typical_plugin_directory() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        "Glow.aex",
        "Glow.txt",
        "Glow_readme.pdf",
        "Glow License.txt",
        "Shine.aex",
        "ShineDocs.html",
        "Unrelated.txt",
    ]);
    fixture.create_subdir("Glow Presets");
    fixture.create_file("Glow Presets/Warm.ffx", "preset");

    let report = fixture.organize("", "");
    assert_eq!(report.outcome(), ExecutionOutcome::Success { moved: 7 });

    fixture.assert_file_exists("Glow/Glow.aex");
    fixture.assert_file_exists("Glow/Glow.txt");
    fixture.assert_file_exists("Glow/Glow_readme.pdf");
    fixture.assert_file_exists("Glow/Glow License.txt");
    fixture.assert_file_exists("Glow/Glow Presets/Warm.ffx");
    fixture.assert_file_exists("Shine/Shine.aex");
    fixture.assert_file_exists("Shine/ShineDocs.html");
    fixture.assert_file_exists("Unrelated.txt");
    fixture.assert_not_exists("Glow.aex");

    let record = ReversalRecord::load(&fixture.record_path()).unwrap();
    assert_eq!(record.len(), 7);
}

#[test]
fn test_organize_then_undo_restores_original_layout() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        "Glow.aex",
        "Glow Pro.aex",
        "Glow Pro Manual.pdf",
        "Glow_data.bin",
        "Other.dll",
    ]);
    fixture.create_subdir("Glow Textures");
    fixture.create_file("Glow Textures/noise.png", "png");
    let before = fixture.snapshot();

    let report = fixture.organize("", "");
    assert!(!report.had_errors());
    fixture.assert_file_exists("Glow Pro/Glow Pro Manual.pdf");
    fixture.assert_file_exists("Glow/Glow_data.bin");
    fixture.assert_dir_exists("Glow/Glow Textures");

    let undo = UndoManager::undo(&fixture.record_path()).unwrap();
    assert_eq!(
        undo.outcome(),
        UndoOutcome::Reverted {
            reverted: 5,
            removed_folders: 2
        }
    );
    assert_eq!(fixture.snapshot(), before);
    assert!(!fixture.record_path().exists());
}

#[test]
fn test_directory_without_anchors_is_untouched() {
    let fixture = TestFixture::new();
    fixture.create_files(&["readme.txt", "Glow.dll"]);
    let before = fixture.snapshot();

    let report = fixture.organize("", "");
    assert_eq!(report.outcome(), ExecutionOutcome::NoAnchors);
    assert_eq!(fixture.snapshot(), before);
    assert!(!fixture.record_path().exists());
}

#[test]
fn test_anchor_alone_gets_its_folder() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Solo.aex", "Other.txt"]);

    let plan = compute_moves(&fixture.path(), "", "").unwrap();
    assert!(matches!(
        plan.summary(),
        plugtidy::matcher::PlanSummary::AnchorsOnly { anchors: 1 }
    ));

    MoveEngine::execute(&plan.moves, &fixture.record_path());
    fixture.assert_file_exists("Solo/Solo.aex");
    fixture.assert_file_exists("Other.txt");
}

// ============================================================================
// Naming and matching rules
// ============================================================================

#[test]
fn test_prefix_and_suffix_applied_to_folder_names() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Glow.aex", "Glow.txt"]);

    fixture.organize("[", "] plugin");
    fixture.assert_file_exists("[Glow] plugin/Glow.aex");
    fixture.assert_file_exists("[Glow] plugin/Glow.txt");
}

#[test]
fn test_longest_base_name_claims_shared_items() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Blur.aex", "Blur Pro.aex", "Blur Pro Help.pdf", "Blur Help.pdf"]);

    fixture.organize("", "");
    fixture.assert_file_exists("Blur Pro/Blur Pro Help.pdf");
    fixture.assert_file_exists("Blur/Blur Help.pdf");
    fixture.assert_not_exists("Blur/Blur Pro Help.pdf");
}

#[test]
fn test_letter_continuation_is_not_associated() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Glow.aex", "Glowing.txt", "GlowPresets.zip", "GLOW.TXT"]);

    fixture.organize("", "");
    fixture.assert_file_exists("Glowing.txt");
    fixture.assert_file_exists("Glow/GlowPresets.zip");
    fixture.assert_file_exists("Glow/GLOW.TXT");
}

#[test]
fn test_case_insensitive_duplicate_anchor_is_not_moved() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Glow.aex", "glow.aex"]);

    let report = fixture.organize("", "");
    assert_eq!(report.moved, 1);
    fixture.assert_file_exists("Glow/Glow.aex");
    fixture.assert_file_exists("glow.aex");
}

#[test]
fn test_folder_named_like_target_is_reused_not_nested() {
    let fixture = TestFixture::new();
    fixture.create_file("Glow.aex", "plugin");
    fixture.create_subdir("Glow");
    fixture.create_file("Glow/existing.txt", "keep");

    let report = fixture.organize("", "");
    assert_eq!(report.outcome(), ExecutionOutcome::Success { moved: 1 });
    fixture.assert_file_exists("Glow/Glow.aex");
    fixture.assert_file_exists("Glow/existing.txt");
    fixture.assert_not_exists("Glow/Glow");

    let undo = UndoManager::undo(&fixture.record_path()).unwrap();
    assert_eq!(undo.reverted, 1);
    fixture.assert_file_exists("Glow.aex");
    fixture.assert_file_exists("Glow/existing.txt");
}

#[test]
fn test_internal_anchor_is_ignored() {
    let fixture = TestFixture::new();
    fixture.create_files(&["_Helper.aex", "_Helper.txt"]);

    let report = fixture.organize("", "");
    assert_eq!(report.outcome(), ExecutionOutcome::NoAnchors);
    fixture.assert_file_exists("_Helper.aex");
}

// ============================================================================
// Failure handling and undo
// ============================================================================

#[test]
fn test_partial_failure_is_recorded_and_undoable() {
    let fixture = TestFixture::new();
    fixture.create_files(&["A.aex", "B.aex"]);
    // A plain file already holds the name of B's folder.
    fixture.create_file("B", "in the way");
    let before = fixture.snapshot();

    let report = fixture.organize("", "");
    assert_eq!(
        report.outcome(),
        ExecutionOutcome::Partial {
            moved: 1,
            record_saved: true
        }
    );
    assert!(matches!(
        report.fatal,
        Some(OrganizerError::FolderCreationFailure { .. })
    ));
    fixture.assert_file_exists("A/A.aex");
    fixture.assert_file_exists("B.aex");

    let undo = UndoManager::undo(&fixture.record_path()).unwrap();
    assert!(undo.is_complete_success());
    assert_eq!(fixture.snapshot(), before);
}

#[test]
fn test_existing_destination_is_never_overwritten() {
    let fixture = TestFixture::new();
    fixture.create_file("Glow.aex", "new plugin");
    fixture.create_file("Glow.txt", "new notes");
    fixture.create_subdir("Glow");
    fixture.create_file("Glow/Glow.txt", "old notes");

    let report = fixture.organize("", "");
    assert_eq!(report.outcome(), ExecutionOutcome::Success { moved: 1 });
    assert_eq!(report.skipped_conflicts.len(), 1);

    let old = fs::read_to_string(fixture.path().join("Glow/Glow.txt")).unwrap();
    assert_eq!(old, "old notes");
    fixture.assert_file_exists("Glow.txt");
}

#[test]
fn test_undo_twice_is_a_no_op() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Glow.aex"]);
    fixture.organize("", "");

    UndoManager::undo(&fixture.record_path()).unwrap();
    let second = UndoManager::undo(&fixture.record_path());
    assert!(matches!(second, Err(OrganizerError::UndoRecordMissing { .. })));
    fixture.assert_file_exists("Glow.aex");
}

#[test]
fn test_undo_keeps_record_when_original_is_occupied() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Glow.aex", "Glow.txt"]);
    fixture.organize("", "");

    // Something new appeared where Glow.txt used to be.
    fixture.create_file("Glow.txt", "newcomer");

    let undo = UndoManager::undo(&fixture.record_path()).unwrap();
    assert_eq!(
        undo.outcome(),
        UndoOutcome::CompletedWithErrors {
            errors: 1,
            reverted: 1,
            removed_folders: 0
        }
    );
    assert!(fixture.record_path().exists());
    fixture.assert_file_exists("Glow/Glow.txt");
    fixture.assert_file_exists("Glow.aex");
}

#[test]
fn test_new_run_replaces_previous_record() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Glow.aex"]);
    fixture.organize("", "");

    fixture.create_files(&["Shine.aex"]);
    fixture.organize("", "");

    let record = ReversalRecord::load(&fixture.record_path()).unwrap();
    assert_eq!(record.len(), 1);
    assert!(
        record
            .original_of(&fixture.path().join("Shine").join("Shine.aex"))
            .is_some()
    );
}

// ============================================================================
// Configuration and filtering
// ============================================================================

#[test]
fn test_config_exclusions_and_extension() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Glow.plugin", "Glow.txt", "Glow.bak", "Glow.aex"]);
    fixture.create_subdir("Glow Cache");

    let config = OrganizerConfig::from_toml(
        r#"
        [matching]
        anchor_extension = ".plugin"

        [matching.exclude]
        extensions = ["bak"]
        patterns = ["* Cache"]
        "#,
    )
    .unwrap();
    let matcher = Matcher::new(config.matching.compile().unwrap());
    let plan = matcher.compute_moves(&fixture.path(), "", "").unwrap();
    MoveEngine::execute(&plan.moves, &fixture.record_path());

    fixture.assert_file_exists("Glow/Glow.plugin");
    fixture.assert_file_exists("Glow/Glow.txt");
    fixture.assert_file_exists("Glow/Glow.aex");
    fixture.assert_file_exists("Glow.bak");
    fixture.assert_dir_exists("Glow Cache");
}

// ============================================================================
// Command-level flows
// ============================================================================

#[test]
fn test_cli_preview_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Glow.aex", "Glow.txt"]);
    let before = fixture.snapshot();

    run_cli(&OrganizeCommand::Preview(fixture.target()), &fixture.context()).unwrap();
    assert_eq!(fixture.snapshot(), before);
    assert!(!fixture.record_path().exists());
}

#[test]
fn test_cli_organize_and_undo() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Glow.aex", "Glow.txt"]);
    let context = fixture.context();

    let organize = OrganizeCommand::Organize {
        target: fixture.target(),
        yes: true,
    };
    run_cli(&organize, &context).unwrap();
    fixture.assert_file_exists("Glow/Glow.txt");
    assert!(fixture.record_path().exists());

    run_cli(&OrganizeCommand::Undo, &context).unwrap();
    fixture.assert_file_exists("Glow.txt");
    fixture.assert_not_exists("Glow");
}

#[test]
fn test_cli_undo_without_record_is_ok() {
    let fixture = TestFixture::new();
    assert!(run_cli(&OrganizeCommand::Undo, &fixture.context()).is_ok());
}

#[test]
fn test_cli_organize_invalid_directory_fails() {
    let fixture = TestFixture::new();
    let organize = OrganizeCommand::Organize {
        target: TargetArgs {
            directory: fixture.path().join("missing"),
            prefix: None,
            suffix: None,
        },
        yes: true,
    };
    assert!(run_cli(&organize, &fixture.context()).is_err());
}

#[test]
fn test_cli_partial_failure_reports_error() {
    let fixture = TestFixture::new();
    fixture.create_files(&["A.aex", "B.aex"]);
    fixture.create_file("B", "in the way");

    let organize = OrganizeCommand::Organize {
        target: fixture.target(),
        yes: true,
    };
    assert!(run_cli(&organize, &fixture.context()).is_err());
    assert!(fixture.record_path().exists());
}
