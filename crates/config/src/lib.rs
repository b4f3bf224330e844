//! Configuration loading, env substitution, env overrides and validation.
//!
//! Config files: `receptionist.toml`, `receptionist.yaml`, `receptionist.yml`
//! or `receptionist.json`, searched in `./` then the user config directory.
//!
//! Supports `${ENV_VAR}` substitution anywhere in the file.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{
        BookingIdentity, ChatConfig, DirectoryConfig, LlmConfig, ReceptionistConfig,
        ServerConfig, WhatsAppConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
