//! Configuration validation.
//!
//! Detects unknown or misspelled fields in raw TOML and checks the parsed
//! config for values the bot cannot run with.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use secrecy::ExposeSecret;

use crate::{
    env_subst::substitute_env,
    loader::{apply_env_overrides, find_config_file, load_config},
    schema::ParleyConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        })
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "chat.chunk_size"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.severity, self.message)
        } else {
            write!(f, "{} [{}]: {}", self.severity, self.path, self.message)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    /// The file that was checked; `None` when validating defaults.
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Expected shape of the configuration tree.
enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    /// Dynamic keys (the `[models]` alias table).
    Map,
    Leaf,
}

fn schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Map, Struct};

    let fields = |names: &[&'static str]| Struct(names.iter().map(|n| (*n, Leaf)).collect());

    Struct(HashMap::from([
        (
            "telegram",
            fields(&["token", "bot_username", "poll_timeout_secs", "mention_mode"]),
        ),
        (
            "provider",
            fields(&["base_url", "api_key", "default_model", "timeout_secs"]),
        ),
        ("models", Map),
        (
            "chat",
            fields(&[
                "system_prompt",
                "web_max_chars",
                "max_message_len",
                "chunk_size",
                "chunk_delay_ms",
                "thinking_notice",
                "max_history_messages",
            ]),
        ),
        ("upload", fields(&["api_key", "endpoint"])),
        ("audit", fields(&["path"])),
        ("media", fields(&["downloads_dir"])),
    ]))
}

/// Edit distance over characters.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = (diag + usize::from(ca != *cb))
                .min(above + 1)
                .min(row[j] + 1);
            diag = above;
        }
    }
    row[b.len()]
}

/// Closest candidate within `max_distance` edits.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

/// Validate the config the bot would run with: the explicit file or the
/// discovered one, with environment overrides applied.
///
/// TOML files are additionally checked for syntax errors and unknown fields.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let mut result = ValidationResult {
        config_path: path.map(Path::to_path_buf).or_else(find_config_file),
        ..Default::default()
    };

    let mut config = match result.config_path.clone() {
        Some(path) => {
            let is_toml = path.extension().is_none_or(|ext| ext == "toml");
            if is_toml {
                match std::fs::read_to_string(&path) {
                    Ok(raw) => {
                        if !check_toml_structure(&substitute_env(&raw), &mut result) {
                            return result;
                        }
                    },
                    Err(e) => {
                        result.push(
                            Severity::Error,
                            "",
                            format!("failed to read {}: {e}", path.display()),
                        );
                        return result;
                    },
                }
            }
            match load_config(&path) {
                Ok(config) => config,
                Err(e) => {
                    result.push(Severity::Error, "", e.to_string());
                    return result;
                },
            }
        },
        None => ParleyConfig::default(),
    };

    apply_env_overrides(&mut config);
    result
        .diagnostics
        .extend(validate_config(&config).diagnostics);
    result
}

/// Validate raw TOML text: syntax, unknown fields, types, then semantics.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut result = ValidationResult::default();

    if check_toml_structure(toml_str, &mut result)
        && let Ok(config) = toml::from_str::<ParleyConfig>(toml_str)
    {
        result
            .diagnostics
            .extend(validate_config(&config).diagnostics);
    }

    result
}

/// Syntax, unknown fields and types. Returns `false` when the text cannot be
/// deserialized.
fn check_toml_structure(toml_str: &str, result: &mut ValidationResult) -> bool {
    let value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            result.push(Severity::Error, "", format!("TOML syntax error: {e}"));
            return false;
        },
    };

    check_unknown_fields(&value, &schema_map(), "", result);

    match toml::from_str::<ParleyConfig>(toml_str) {
        Ok(_) => true,
        Err(e) => {
            result.push(Severity::Error, "", format!("type error: {e}"));
            false
        },
    }
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    result: &mut ValidationResult,
) {
    let (toml::Value::Table(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };
    let known: Vec<&str> = fields.keys().copied().collect();

    for (key, child) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match fields.get(key.as_str()) {
            Some(child_schema) => check_unknown_fields(child, child_schema, &path, result),
            None => {
                let message = match suggest(key, &known, 3) {
                    Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                    None => "unknown field".to_string(),
                };
                result.push(Severity::Error, &path, message);
            },
        }
    }
}

/// Check a parsed config for values the bot cannot run with.
#[must_use]
pub fn validate_config(config: &ParleyConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.telegram.token.expose_secret().trim().is_empty() {
        result.push(
            Severity::Error,
            "telegram.token",
            "bot token is empty (set it in the config or TELEGRAM_BOT_TOKEN)",
        );
    }

    if !config.models.contains_key(&config.provider.default_model) {
        result.push(
            Severity::Error,
            "provider.default_model",
            format!(
                "model alias \"{}\" is not defined in [models]",
                config.provider.default_model
            ),
        );
    }

    if config.chat.chunk_size == 0 {
        result.push(Severity::Error, "chat.chunk_size", "must be greater than 0");
    } else if config.chat.chunk_size > config.chat.max_message_len {
        result.push(
            Severity::Error,
            "chat.chunk_size",
            format!(
                "{} exceeds chat.max_message_len ({})",
                config.chat.chunk_size, config.chat.max_message_len
            ),
        );
    }

    if config.provider.api_key.expose_secret().is_empty() {
        result.push(
            Severity::Warning,
            "provider.api_key",
            "completion API key is empty; requests will likely be rejected",
        );
    }

    if config.upload.api_key.expose_secret().is_empty() {
        result.push(
            Severity::Warning,
            "upload.api_key",
            "upload API key is empty; photo messages will fail",
        );
    }

    if config.chat.max_history_messages == Some(0) {
        result.push(
            Severity::Info,
            "chat.max_history_messages",
            "0 keeps only the system prompt and the current turn",
        );
    }

    result
}
