//! Persisted settings.
//!
//! Settings live in a small TOML file edited with `toml_edit`, so unknown keys
//! and comments survive a write. The store is loaded once per invocation and
//! every mutation is flushed immediately with an atomic replace. Concurrent
//! invocations are not coordinated: the last writer wins.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use toml_edit::{Array, DocumentMut, Item, value};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Default Ollama port.
pub const DEFAULT_PORT: u16 = 11434;

/// Default model used for generation.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Default user-editable exclusion list.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Cargo.lock",
    "composer.lock",
    "Gemfile.lock",
    "poetry.lock",
];

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "OLLAMA_COMMIT_CONFIG";

const KEY_PORT: &str = "ollamaPort";
const KEY_MODEL: &str = "ollamaModel";
const KEY_EXCLUDES: &str = "excludeFiles";
const KEY_DEBUG: &str = "debug";

/// Effective settings after applying defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub ollama_port: u16,
    pub ollama_model: String,
    pub exclude_files: Vec<String>,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_port: DEFAULT_PORT,
            ollama_model: DEFAULT_MODEL.to_string(),
            exclude_files: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            debug: false,
        }
    }
}

/// Outcome of an exclusion list mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcludeChange {
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
}

/// Validate a port number from user input.
pub fn validate_port(port: i64) -> Result<u16, ConfigError> {
    match u16::try_from(port) {
        Ok(p) if p >= 1 => Ok(p),
        _ => Err(ConfigError::InvalidPort(port.to_string())),
    }
}

/// Parse a port given as text on the command line.
pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    let trimmed = raw.trim();
    let port: i64 = trimmed
        .parse()
        .map_err(|_| ConfigError::InvalidPort(trimmed.to_string()))?;
    validate_port(port)
}

/// Handle to the persisted configuration.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    doc: DocumentMut,
    settings: Settings,
}

impl ConfigStore {
    /// Resolve the config file path.
    ///
    /// Uses `OLLAMA_COMMIT_CONFIG` when set, otherwise
    /// `<config dir>/ollama-commit/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(p) if !p.is_empty() => Ok(PathBuf::from(p)),
            _ => dirs::config_dir()
                .map(|d| d.join("ollama-commit").join("config.toml"))
                .ok_or(ConfigError::DirectoryNotFound),
        }
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path()?)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let doc = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(ConfigError::Read)?;
            content.parse::<DocumentMut>().map_err(ConfigError::Parse)?
        } else {
            debug!("No config at {}, using defaults", path.display());
            DocumentMut::new()
        };
        let settings = settings_from_doc(&doc);
        Ok(Self {
            path,
            doc,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_port(&mut self, port: i64) -> Result<u16, ConfigError> {
        let port = validate_port(port)?;
        self.doc[KEY_PORT] = value(i64::from(port));
        self.save()?;
        self.settings.ollama_port = port;
        Ok(port)
    }

    pub fn set_model(&mut self, model: &str) -> Result<(), ConfigError> {
        self.doc[KEY_MODEL] = value(model);
        self.save()?;
        self.settings.ollama_model = model.to_string();
        Ok(())
    }

    pub fn set_debug(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.doc[KEY_DEBUG] = value(enabled);
        self.save()?;
        self.settings.debug = enabled;
        Ok(())
    }

    /// Add a pattern to the exclusion list. Adding a present pattern is a no-op.
    pub fn add_exclude(&mut self, pattern: &str) -> Result<ExcludeChange, ConfigError> {
        if self.settings.exclude_files.iter().any(|p| p == pattern) {
            return Ok(ExcludeChange::AlreadyPresent);
        }
        let mut excludes = self.settings.exclude_files.clone();
        excludes.push(pattern.to_string());
        self.write_excludes(excludes)?;
        Ok(ExcludeChange::Added)
    }

    pub fn remove_exclude(&mut self, pattern: &str) -> Result<ExcludeChange, ConfigError> {
        if !self.settings.exclude_files.iter().any(|p| p == pattern) {
            return Ok(ExcludeChange::NotPresent);
        }
        let excludes = self
            .settings
            .exclude_files
            .iter()
            .filter(|p| *p != pattern)
            .cloned()
            .collect();
        self.write_excludes(excludes)?;
        Ok(ExcludeChange::Removed)
    }

    /// Restore [`DEFAULT_EXCLUDES`].
    pub fn reset_excludes(&mut self) -> Result<(), ConfigError> {
        self.write_excludes(DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect())
    }

    fn write_excludes(&mut self, excludes: Vec<String>) -> Result<(), ConfigError> {
        let mut array = Array::new();
        for pattern in &excludes {
            array.push(pattern.as_str());
        }
        self.doc[KEY_EXCLUDES] = value(array);
        self.save()?;
        self.settings.exclude_files = excludes;
        Ok(())
    }

    /// Write the document next to the target and rename it into place.
    fn save(&self) -> Result<(), ConfigError> {
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(ConfigError::Write)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(ConfigError::Write)?;
        tmp.write_all(self.doc.to_string().as_bytes())
            .map_err(ConfigError::Write)?;
        tmp.persist(&self.path)
            .map_err(|e| ConfigError::Write(e.error))?;

        debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}

fn settings_from_doc(doc: &DocumentMut) -> Settings {
    let mut settings = Settings::default();

    if let Some(item) = doc.get(KEY_PORT) {
        match item.as_integer().map(validate_port) {
            Some(Ok(port)) => settings.ollama_port = port,
            _ => warn!("Ignoring invalid {} in config, using {}", KEY_PORT, DEFAULT_PORT),
        }
    }

    if let Some(item) = doc.get(KEY_MODEL) {
        match item.as_str().map(str::trim) {
            Some(model) if !model.is_empty() => settings.ollama_model = model.to_string(),
            _ => warn!("Ignoring invalid {} in config, using {}", KEY_MODEL, DEFAULT_MODEL),
        }
    }

    if let Some(item) = doc.get(KEY_EXCLUDES) {
        match read_string_array(item) {
            Some(excludes) => settings.exclude_files = excludes,
            None => warn!("Ignoring invalid {} in config, using defaults", KEY_EXCLUDES),
        }
    }

    if let Some(item) = doc.get(KEY_DEBUG) {
        match item.as_bool() {
            Some(enabled) => settings.debug = enabled,
            None => warn!("Ignoring invalid {} in config", KEY_DEBUG),
        }
    }

    settings
}

fn read_string_array(item: &Item) -> Option<Vec<String>> {
    let array = item.as_array()?;
    let mut out = Vec::with_capacity(array.len());
    for v in array.iter() {
        let s = v.as_str()?;
        if !out.iter().any(|existing: &String| existing == s) {
            out.push(s.to_string());
        }
    }
    Some(out)
}
