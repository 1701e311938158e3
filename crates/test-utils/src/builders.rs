#![allow(dead_code)]

use std::path::PathBuf;

use bulkexec::config::{ConfigFile, RawConfigFile};
use bulkexec::types::LaunchFailurePolicy;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn max_sequence_len(mut self, len: usize) -> Self {
        self.config.expand.max_sequence_len = len;
        self
    }

    pub fn on_launch_failure(mut self, policy: LaunchFailurePolicy) -> Self {
        self.config.run.on_launch_failure = policy;
        self
    }

    pub fn shell(mut self, val: bool) -> Self {
        self.config.run.shell = val;
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.run.output = Some(path.into());
        self
    }

    /// The raw model, for exercising validation directly.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
