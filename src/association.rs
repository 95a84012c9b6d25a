/// Association rules deciding whether a directory entry belongs to a plugin.
///
/// An entry is related to a base name when its name starts with that base
/// name (ignoring case) and the remainder does not continue the word, or
/// continues it with one of a fixed set of descriptive suffix words.
///
/// # Examples
///
/// ```
/// use plugtidy::association::{MatchReason, relate};
///
/// assert_eq!(relate("Plugin Presets", true, "Plugin"), Some(MatchReason::NonLetter(' ')));
/// assert_eq!(relate("PluginLicense.txt", false, "Plugin"), Some(MatchReason::KnownSuffix("license")));
/// assert_eq!(relate("Pluginator.dll", false, "Plugin"), None);
/// ```
use std::fmt;

/// Descriptive words that may directly follow a base name, e.g. `FooPresets`.
pub const SUFFIX_WORDS: [&str; 16] = [
    "license", "presets", "textures", "data", "config", "key", "lib", "sdk", "settings", "pack",
    "bundle", "docs", "help", "support", "extra", "install",
];

/// Why an entry was considered related to a base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    /// The entry name is the base name itself (typically a folder).
    ExactName,
    /// The file name without its extension is the base name.
    ExactStem,
    /// The base name is followed by a non-letter character.
    NonLetter(char),
    /// The base name is followed by a known suffix word at a word boundary.
    KnownSuffix(&'static str),
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchReason::ExactName => write!(f, "exact name match"),
            MatchReason::ExactStem => write!(f, "exact base name match (file)"),
            MatchReason::NonLetter(c) => write!(f, "followed by non-letter ('{}')", c),
            MatchReason::KnownSuffix(word) => write!(f, "followed by known suffix ('{}')", word),
        }
    }
}

/// Tests whether `entry_name` is related to `base_name`.
///
/// Rules are evaluated in order and the first match wins:
/// 1. same length as the base name
/// 2. a file whose name without extension equals the base name
/// 3. the character after the base name is not alphabetic
/// 4. the remainder starts with a suffix word not followed by a letter
pub fn relate(entry_name: &str, is_folder: bool, base_name: &str) -> Option<MatchReason> {
    relate_lowercase(&entry_name.to_lowercase(), is_folder, &base_name.to_lowercase())
}

/// Same as [`relate`] for names that are already lowercased.
pub(crate) fn relate_lowercase(entry: &str, is_folder: bool, base: &str) -> Option<MatchReason> {
    let remainder = entry.strip_prefix(base)?;

    if remainder.is_empty() {
        return Some(MatchReason::ExactName);
    }

    if !is_folder && file_stem(entry) == base {
        return Some(MatchReason::ExactStem);
    }

    let follow = remainder.chars().next()?;
    if !follow.is_alphabetic() {
        return Some(MatchReason::NonLetter(follow));
    }

    SUFFIX_WORDS
        .iter()
        .copied()
        .find(|word| {
            remainder
                .strip_prefix(*word)
                .is_some_and(|rest| !rest.chars().next().is_some_and(char::is_alphabetic))
        })
        .map(MatchReason::KnownSuffix)
}

/// Returns `name` without its last extension. Leading dots are part of
/// the name, so `.hidden` has no extension.
pub(crate) fn file_stem(name: &str) -> &str {
    let body_start = name.len() - name.trim_start_matches('.').len();
    match name[body_start..].rfind('.') {
        Some(dot) => &name[..body_start + dot],
        None => name,
    }
}
