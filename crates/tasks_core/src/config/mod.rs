use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKS_CONFIG_PATH";
pub const LOG_ENV_VAR: &str = "TASKS_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Storage file, used when `TASKS_STORE_PATH` is unset.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    /// `tracing` filter directive, used when `TASKS_LOG` is unset.
    #[serde(default)]
    pub log: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub store_path: Option<PathBuf>,
    pub log: Option<String>,
}

/// Non-empty value of an environment variable.
pub(crate) fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|value| !value.to_string_lossy().trim().is_empty())
        .map(PathBuf::from)
}

/// `file_name` inside the per-user `tasks` directory.
pub(crate) fn user_file(file_name: &str) -> Result<PathBuf, AppError> {
    let (var, subdir) = if cfg!(windows) {
        ("APPDATA", "")
    } else {
        ("HOME", ".config")
    };
    let base = std::env::var_os(var)
        .map(PathBuf::from)
        .ok_or_else(|| AppError::invalid_data(format!("{var} is not set")))?;
    Ok(base.join(subdir).join("tasks").join(file_name))
}

pub fn config_path() -> Result<PathBuf, AppError> {
    match env_path(CONFIG_ENV_VAR) {
        Some(path) => Ok(path),
        None => user_file(CONFIG_FILE_NAME),
    }
}

impl From<Result<Config, AppError>> for ConfigLoad {
    fn from(loaded: Result<Config, AppError>) -> Self {
        match loaded {
            Ok(config) => Self {
                config,
                error: None,
            },
            Err(err) => Self {
                config: Config::default(),
                error: Some(err),
            },
        }
    }
}

/// Loads the config file, substituting defaults on any failure.
///
/// A missing file is not an error. An unreadable or invalid one is reported
/// through [`ConfigLoad::error`].
pub fn load_config_with_fallback() -> ConfigLoad {
    config_path()
        .and_then(|path| load_optional_config(&path))
        .into()
}

fn load_optional_config(path: &Path) -> Result<Config, AppError> {
    if path.exists() {
        load_config_from_path(path)
    } else {
        Ok(Config::default())
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    Ok(normalize_config(config))
}

fn normalize_config(mut config: Config) -> Config {
    config.log = config
        .log
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    config.store_path = config
        .store_path
        .filter(|path| !path.as_os_str().is_empty());
    config
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(path) = overrides.store_path.as_ref() {
        merged.store_path = Some(path.clone());
    }
    if let Some(log) = overrides.log.as_ref() {
        merged.log = Some(log.clone());
    }
    normalize_config(merged)
}

/// Effective log filter: `TASKS_LOG`, then the config, then `warn`.
pub fn log_filter(config: &Config) -> String {
    std::env::var(LOG_ENV_VAR)
        .ok()
        .filter(|filter| !filter.trim().is_empty())
        .or_else(|| config.log.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}
