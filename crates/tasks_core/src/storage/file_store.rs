use super::KeyValueStore;
use crate::config::{env_path, user_file};
use crate::error::AppError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "storage.json";
pub const STORE_ENV_VAR: &str = "TASKS_STORE_PATH";

/// Resolves the storage file location.
///
/// `TASKS_STORE_PATH` wins over the configured path, which wins over the
/// per-user default.
pub fn store_path(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(path) = env_path(STORE_ENV_VAR) {
        return Ok(path);
    }
    match configured {
        Some(path) => Ok(path.to_path_buf()),
        None => user_file(STORE_FILE_NAME),
    }
}

/// Key-value store persisted as a single JSON object of string values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, AppError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|err| AppError::io(format!("{}: {}", self.path.display(), err)))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|err| {
            AppError::invalid_data(format!("invalid storage file {}: {}", self.path.display(), err))
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, permissions)?;
        }

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        tracing::debug!(path = %self.path.display(), key, "writing storage entry");
        self.write_entries(&entries)
    }
}
