// src/config/settings.rs

use std::path::PathBuf;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::expr::Limits;
use crate::types::LaunchFailurePolicy;

/// Effective run settings: CLI flags layered over the config file, layered
/// over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub limits: Limits,
    pub on_launch_failure: LaunchFailurePolicy,
    pub shell: bool,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
}

impl Settings {
    pub fn resolve(args: &CliArgs, config: Option<&ConfigFile>) -> Self {
        let defaults = ConfigFile::default();
        let config = config.unwrap_or(&defaults);

        let on_launch_failure = if args.keep_going {
            LaunchFailurePolicy::Continue
        } else {
            config.run.on_launch_failure
        };

        Self {
            limits: Limits::new(
                args.max_sequence_len
                    .unwrap_or(config.expand.max_sequence_len),
            ),
            on_launch_failure,
            shell: args.shell || config.run.shell,
            output: args.output.clone().or_else(|| config.run.output.clone()),
            dry_run: args.dry_run,
        }
    }
}
