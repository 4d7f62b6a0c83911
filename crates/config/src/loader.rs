use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::ParleyConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["parley.toml", "parley.yaml", "parley.yml", "parley.json"];

const APP_NAME: &str = "parley";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<ParleyConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./parley.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/parley/parley.{toml,yaml,yml,json}` (user-global)
///
/// Returns `ParleyConfig::default()` if no config file is found or the
/// file cannot be parsed.
pub fn discover_and_load() -> ParleyConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    ParleyConfig::default()
}

/// Load the explicit file when given (errors are fatal), otherwise discover,
/// then apply process environment overrides.
pub fn load(explicit: Option<&Path>) -> Result<ParleyConfig> {
    let mut config = match explicit {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            load_config(path)?
        },
        None => discover_and_load(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Overlay well-known environment variables onto a loaded config.
///
/// | variable | field |
/// |---|---|
/// | `TELEGRAM_BOT_TOKEN` | `telegram.token` |
/// | `PARLEY_BOT_USERNAME` | `telegram.bot_username` |
/// | `OPENROUTER_API_KEY` | `provider.api_key` |
/// | `FILESTACK_API_KEY` | `upload.api_key` |
/// | `PARLEY_AUDIT_LOG` | `audit.path` |
pub fn apply_env_overrides(config: &mut ParleyConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut ParleyConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = var("TELEGRAM_BOT_TOKEN") {
        config.telegram.token = Secret::new(token);
    }
    if let Some(username) = var("PARLEY_BOT_USERNAME") {
        config.telegram.bot_username = Some(username.trim_start_matches('@').to_string());
    }
    if let Some(key) = var("OPENROUTER_API_KEY") {
        config.provider.api_key = Secret::new(key);
    }
    if let Some(key) = var("FILESTACK_API_KEY") {
        config.upload.api_key = Secret::new(key);
    }
    if let Some(path) = var("PARLEY_AUDIT_LOG") {
        config.audit.path = PathBuf::from(path);
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists());
    if local.is_some() {
        return local;
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/parley/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<ParleyConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    let parse_err = |message: String| Error::Parse {
        path: path.to_path_buf(),
        message,
    };

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "json" => serde_json::from_str(raw).map_err(|e| parse_err(e.to_string())),
        other => Err(Error::UnsupportedFormat {
            ext: other.to_string(),
        }),
    }
}
