// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::expr::DEFAULT_MAX_SEQUENCE_LEN;
use crate::types::LaunchFailurePolicy;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [expand]
/// max_sequence_len = 1000000
///
/// [run]
/// on_launch_failure = "abort"
/// shell = false
/// output = "results.csv"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub expand: ExpandSection,

    #[serde(default)]
    pub run: RunSection,
}

/// `[expand]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpandSection {
    /// Longest sequence a single token may materialize.
    #[serde(default = "default_max_sequence_len")]
    pub max_sequence_len: usize,
}

fn default_max_sequence_len() -> usize {
    DEFAULT_MAX_SEQUENCE_LEN
}

impl Default for ExpandSection {
    fn default() -> Self {
        Self {
            max_sequence_len: default_max_sequence_len(),
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunSection {
    /// `"abort"` (default) or `"continue"`.
    #[serde(default)]
    pub on_launch_failure: LaunchFailurePolicy,

    /// Run every invocation through `sh -c` / `cmd /C`.
    #[serde(default)]
    pub shell: bool,

    /// Record results to this CSV file.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// A validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub expand: ExpandSection,
    pub run: RunSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(expand: ExpandSection, run: RunSection) -> Self {
        Self { expand, run }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(ExpandSection::default(), RunSection::default())
    }
}
