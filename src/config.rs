//! Organizer configuration.
//!
//! Settings are loaded from a TOML file and cover folder naming defaults,
//! anchor detection, exclusion rules and where state files are written.
//! Exclusion rules support several strategies:
//! - Exact filename matching
//! - Glob pattern matching
//! - File extension matching
//! - Regex pattern matching
//!
//! # Configuration File Format
//!
//! ```toml
//! [naming]
//! prefix = ""
//! suffix = ""
//!
//! [matching]
//! anchor_extension = "aex"
//! enable_hidden_files = false
//!
//! [matching.exclude]
//! filenames = ["desktop.ini", "Thumbs.db"]
//! patterns = ["*.log"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [storage]
//! record_path = "/path/to/undo_log.json"
//! log_path = "/path/to/plugtidy.log"
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default extension of anchor files.
pub const DEFAULT_ANCHOR_EXTENSION: &str = "aex";

/// File name of the reversal record when no path is configured.
pub const DEFAULT_RECORD_FILE: &str = "undo_log.json";

/// File name of the audit log when no path is configured.
pub const DEFAULT_LOG_FILE: &str = "plugtidy.log";

/// Errors that can occur during configuration loading.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// The anchor extension is empty or contains a path separator or dot.
    #[error("Invalid anchor extension '{0}': expected a bare extension such as \"aex\"")]
    InvalidAnchorExtension(String),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Default prefix and suffix wrapped around a base name to form folder names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamingConfig {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

/// Anchor detection and entry exclusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Extension (without the dot) that marks an anchor file.
    #[serde(default = "default_anchor_extension")]
    pub anchor_extension: String,

    /// Whether to consider hidden entries (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    /// Entries that are never anchors and never associated items.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

fn default_anchor_extension() -> String {
    DEFAULT_ANCHOR_EXTENSION.to_string()
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            anchor_extension: default_anchor_extension(),
            enable_hidden_files: false,
            exclude: ExcludeRules::default(),
        }
    }
}

/// Rules for excluding entries from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact names to exclude (e.g., "desktop.ini", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against entry names (e.g., "*.log").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "bak", "tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against entry names.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Locations of the reversal record and the audit log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub record_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

impl OrganizerConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.plugtidyrc.toml` in the current directory
    /// 3. Look for `~/.config/plugtidy/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is malformed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".plugtidyrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("plugtidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Path of the reversal record: the configured one, or `undo_log.json`
    /// beside the running executable.
    pub fn record_path(&self) -> PathBuf {
        self.storage
            .record_path
            .clone()
            .unwrap_or_else(|| beside_executable(DEFAULT_RECORD_FILE))
    }

    /// Path of the audit log: the configured one, or `plugtidy.log`
    /// beside the running executable.
    pub fn log_path(&self) -> PathBuf {
        self.storage
            .log_path
            .clone()
            .unwrap_or_else(|| beside_executable(DEFAULT_LOG_FILE))
    }
}

/// Resolves `file_name` in the directory holding the current executable,
/// falling back to the working directory.
fn beside_executable(file_name: &str) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(file_name)
}

impl MatchingConfig {
    /// Validate and compile into the structures the matcher uses.
    ///
    /// # Errors
    ///
    /// Returns an error if the anchor extension or any glob/regex pattern is invalid.
    pub fn compile(&self) -> Result<MatchRules, ConfigError> {
        let extension = self.anchor_extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\', '.']) {
            return Err(ConfigError::InvalidAnchorExtension(
                self.anchor_extension.clone(),
            ));
        }

        Ok(MatchRules {
            anchor_extension: extension.to_string(),
            filters: CompiledFilters::new(self.enable_hidden_files, &self.exclude)?,
        })
    }
}

/// Compiled anchor extension and entry filters.
#[derive(Debug, Clone)]
pub struct MatchRules {
    pub anchor_extension: String,
    pub filters: CompiledFilters,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            anchor_extension: DEFAULT_ANCHOR_EXTENSION.to_string(),
            filters: CompiledFilters::default(),
        }
    }
}

/// Pre-compiled exclusion rules, so patterns are not reparsed per entry.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(enable_hidden_files: bool, rules: &ExcludeRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files,
            exclude_filenames: rules.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Check if a directory entry should take part in organization.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Hidden entry filter
    /// 2. Exact name match
    /// 3. Extension match (files only)
    /// 4. Glob pattern match
    /// 5. Regex pattern match
    pub fn should_include(&self, name: &str, is_folder: bool) -> bool {
        if !self.enable_hidden_files && name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(name) {
            return false;
        }

        if !is_folder
            && let Some(ext) = Path::new(name).extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self.exclude_patterns.iter().any(|p| p.matches(name)) {
            return false;
        }

        !self.exclude_regexes.iter().any(|re| re.is_match(name))
    }
}
