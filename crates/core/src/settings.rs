//! User settings persistence.
//!
//! Prompts and the API key are kept as a flat key→string map in a JSON file
//! in the user's config directory (e.g. `~/.config/ai-rewrite/settings.json`
//! on Linux). The pipeline never holds the file open: each run takes a fresh
//! [`ConfigSnapshot`], so edits made between runs apply to the next trigger.

use crate::error::{AppError, Result};
use crate::mode::Mode;
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key holding the API secret.
pub const CREDENTIAL_KEY: &str = "credential";

/// Every key the settings store accepts.
pub const KNOWN_KEYS: [&str; 4] = ["promptA", "promptB", "promptC", CREDENTIAL_KEY];

/// Read access to a key→string configuration mapping.
///
/// Keys are case-sensitive. Implementations return the stored value as-is;
/// emptiness is judged by the caller.
pub trait ConfigStore: Send + Sync {
    /// Takes an immutable copy of the current configuration.
    fn snapshot(&self) -> ConfigSnapshot;
}

/// Immutable configuration for the duration of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    values: BTreeMap<String, String>,
}

impl ConfigSnapshot {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// Returns the value for `key` if it is present and non-empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn template(&self, mode: Mode) -> Option<&str> {
        self.get(mode.template_key())
    }

    pub fn credential(&self) -> Option<&str> {
        self.get(CREDENTIAL_KEY)
    }

    /// Fills `key` from `fallback` when the snapshot has no usable value.
    pub fn with_fallback(mut self, key: &str, fallback: Option<&str>) -> Self {
        if self.get(key).is_none() {
            if let Some(value) = fallback {
                self.values.insert(key.to_string(), value.to_string());
            }
        }
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl ConfigStore for ConfigSnapshot {
    fn snapshot(&self) -> ConfigSnapshot {
        self.clone()
    }
}

/// File-backed settings, re-read on every snapshot.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    fallback_credential: Option<String>,
}

impl SettingsStore {
    /// Returns the default path to the settings file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "ai-rewrite", "ai-rewrite").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("settings.json")
        })
    }

    /// Opens the store at the platform default location.
    pub fn open_default() -> Result<Self> {
        Self::default_path()
            .map(Self::at)
            .ok_or_else(|| AppError::config("could not determine the user config directory"))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fallback_credential: None,
        }
    }

    /// Credential to use when the file has none (e.g. from `OPENAI_API_KEY`).
    pub fn with_fallback_credential(mut self, credential: Option<String>) -> Self {
        self.fallback_credential = credential;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all stored values. A missing file is an empty store.
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    /// Stores `value` under `key`, rejecting keys the pipeline never reads.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        check_key(key)?;
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    /// Removes `key`. Returns whether it was present.
    pub fn unset(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        let mut values = self.load()?;
        let existed = values.remove(key).is_some();
        if existed {
            self.save(&values)?;
        }
        Ok(existed)
    }

    /// Persists settings to disk.
    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl ConfigStore for SettingsStore {
    fn snapshot(&self) -> ConfigSnapshot {
        let values = self.load().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to read settings, using empty configuration");
            BTreeMap::new()
        });
        ConfigSnapshot::new(values)
            .with_fallback(CREDENTIAL_KEY, self.fallback_credential.as_deref())
    }
}

fn check_key(key: &str) -> Result<()> {
    if KNOWN_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(AppError::config(format!(
            "unknown setting '{key}', expected one of: {}",
            KNOWN_KEYS.join(", ")
        )))
    }
}
