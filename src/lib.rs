// lib.rs
//
// Typed configuration records for a traffic microsimulation study, their
// validation, file persistence and transfer to and from a simulator model.

pub mod adapter;
pub mod config_files;
pub mod error;
pub mod global_variables;
pub mod models;
pub mod samples;
pub mod serializer;
pub mod settings;
pub mod validation;

pub use config_files::{ConfigFile, ExportOutcome};
pub use error::{ConfigError, ConfigResult};
pub use settings::Settings;
