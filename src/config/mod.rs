// src/config/mod.rs

//! Configuration loading and validation for bulkexec.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate value ranges (`validate.rs`).
//! - Merge CLI flags over file values (`settings.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{ConfigFile, ExpandSection, RawConfigFile, RunSection};
pub use settings::Settings;
