//! plugtidy - group plugin binaries and their companion files into folders
//!
//! This library scans a flat plugin directory for anchor files (`.aex` by
//! default), works out which sibling files and folders belong to each plugin
//! by name, moves every group into its own folder, and records how to move
//! everything back.

pub mod association;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod output;
pub mod record;
pub mod undo;

pub use association::{MatchReason, relate};
pub use config::{CompiledFilters, ConfigError, MatchRules, OrganizerConfig};
pub use engine::{ExecutionOutcome, ExecutionReport, MoveEngine, RecordStatus};
pub use error::{OrganizerError, OrganizerResult};
pub use matcher::{Matcher, MovePlan, PlannedMove, compute_moves};
pub use record::ReversalRecord;
pub use undo::{UndoManager, UndoOutcome, UndoReport};

pub use cli::{Cli, CliContext, OrganizeCommand, run_cli};
