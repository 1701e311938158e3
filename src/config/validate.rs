// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BulkExecError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BulkExecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.expand, raw.run))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_expand(cfg)?;
    validate_run(cfg)?;
    Ok(())
}

fn validate_expand(cfg: &RawConfigFile) -> Result<()> {
    if cfg.expand.max_sequence_len == 0 {
        return Err(BulkExecError::ConfigError(
            "[expand].max_sequence_len must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_run(cfg: &RawConfigFile) -> Result<()> {
    // on_launch_failure is strongly typed and checked during deserialization.
    if let Some(output) = &cfg.run.output
        && output.as_os_str().is_empty()
    {
        return Err(BulkExecError::ConfigError(
            "[run].output must not be empty".to_string(),
        ));
    }
    Ok(())
}
