//! Configuration loading, validation and env substitution.
//!
//! Config files: `parley.toml`, `parley.yaml`, `parley.yml` or `parley.json`,
//! searched in `./` then in the user config dir (`~/.config/parley/` on Linux).
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load, load_config,
    },
    schema::{
        AuditConfig, ChatConfig, MediaConfig, MentionMode, ParleyConfig, ProviderConfig,
        TelegramSection, UploadConfig,
    },
    validate::{
        Diagnostic, Severity, ValidationResult, validate, validate_config, validate_toml_str,
    },
};
