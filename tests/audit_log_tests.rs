/// Audit log tests for plugtidy
///
/// Installing the tracing subscriber is global to the process, so these
/// checks live in their own test binary and share a single test.
use plugtidy::engine::MoveEngine;
use plugtidy::logging::init_logging;
use plugtidy::matcher::compute_moves;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_skip_decisions_reach_the_audit_log() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let plugins = temp_dir.path().join("plugins");
    fs::create_dir(&plugins).unwrap();
    fs::write(plugins.join("_Helper.aex"), "internal").unwrap();
    fs::write(plugins.join(".DS_Store"), "hidden").unwrap();
    fs::write(plugins.join("Glow.aex"), "plugin").unwrap();
    fs::write(plugins.join("Glow.txt"), "notes").unwrap();

    let log_path = temp_dir.path().join("audit.log");
    let guard = init_logging(&log_path, false);
    assert!(guard.is_some());

    let plan = compute_moves(&plugins, "", "").expect("Failed to plan");
    MoveEngine::execute(&plan.moves, &temp_dir.path().join("undo_log.json"));
    drop(guard);

    let log = fs::read_to_string(&log_path).expect("Failed to read audit log");
    assert!(log.contains("Skipping internal anchor"), "log was:\n{}", log);
    assert!(log.contains("_Helper.aex"));
    assert!(log.contains("Entry excluded by filters"), "log was:\n{}", log);
    assert!(log.contains(".DS_Store"));
    assert!(log.contains("Identified anchor"));
    assert!(log.contains("Moved item"));
    assert!(log.contains("Undo information saved"));

    // A second install leaves the first subscriber in place instead of panicking.
    assert!(init_logging(&temp_dir.path().join("second.log"), false).is_some());
}
