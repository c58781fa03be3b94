//! Configuration module for tablesync.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.tablesync/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `TABLESYNC_` and use double
//! underscores to separate nested levels:
//! - `TABLESYNC_DATA_DIR=/srv/data` sets `data_dir`
//! - `TABLESYNC_WATCHER__DEBOUNCE_MS=1000` sets `watcher.debounce_ms`
//! - `TABLESYNC_STORAGE__BACKEND=postgrest` sets `storage.backend`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directory holding the settings file, searched upwards from the current
/// directory.
pub const CONFIG_DIR: &str = ".tablesync";
pub const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "TABLESYNC_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory whose files are mirrored into tables
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory where exports are written
    #[serde(default = "default_exports_dir")]
    pub exports_dir: PathBuf,

    /// Workspace root directory (where .tablesync is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub watcher: WatcherConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatcherConfig {
    /// How long a file must be quiet before it is processed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How often pending changes are checked
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Process files already present when the watcher starts
    #[serde(default = "default_true")]
    pub initial_scan: bool,

    /// Also watch subdirectories of the data directory
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SyncConfig {
    /// Turn numeric/boolean/empty text into typed values before inserting
    #[serde(default)]
    pub coerce_values: bool,

    /// Rows per insert request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Local,
    Memory,
    Postgrest,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for the local backend
    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,

    /// PostgREST/Supabase project URL (falls back to SUPABASE_URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// PostgREST/Supabase key (falls back to SUPABASE_KEY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Always-true filter used to delete every row
    #[serde(default = "default_delete_filter")]
    pub delete_filter: String,

    /// Rows per page when reading a table
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Column that orders paged reads (defaults to the delete filter column)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,

    /// HTTP request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `"tablesync::watcher" = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_exports_dir() -> PathBuf {
    PathBuf::from("exports")
}
fn default_true() -> bool {
    true
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_tick_ms() -> u64 {
    100
}
fn default_batch_size() -> usize {
    500
}
fn default_local_path() -> PathBuf {
    PathBuf::from(".tablesync/tables")
}
fn default_delete_filter() -> String {
    "id=not.is.null".to_string()
}
fn default_page_size() -> usize {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_dir: default_data_dir(),
            exports_dir: default_exports_dir(),
            workspace_root: None,
            watcher: WatcherConfig::default(),
            sync: SyncConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            tick_ms: default_tick_ms(),
            initial_scan: true,
            recursive: false,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            coerce_values: false,
            batch_size: default_batch_size(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_path: default_local_path(),
            url: None,
            api_key: None,
            delete_filter: default_delete_filter(),
            page_size: default_page_size(),
            order_by: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl StorageConfig {
    /// Configured URL, or `SUPABASE_URL` from the environment.
    pub fn resolved_url(&self) -> Option<String> {
        non_empty(self.url.clone()).or_else(|| non_empty(std::env::var("SUPABASE_URL").ok()))
    }

    /// Configured key, or `SUPABASE_KEY` from the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        non_empty(self.api_key.clone()).or_else(|| non_empty(std::env::var("SUPABASE_KEY").ok()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file (plus defaults and environment)
    ///
    /// Without an explicit `workspace_root`, relative paths resolve against
    /// the directory holding `.tablesync/`, or the file's own directory.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let path = path.as_ref();
        let mut settings: Settings = Self::figment(path).extract().map_err(Box::new)?;
        if settings.workspace_root.is_none() {
            settings.workspace_root = Self::root_for_config_file(path);
        }
        Ok(settings)
    }

    fn root_for_config_file(path: &Path) -> Option<PathBuf> {
        let dir = path.parent()?;
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        if dir.file_name().is_some_and(|name| name == CONFIG_DIR) {
            dir.parent().map(Path::to_path_buf)
        } else {
            Some(dir.to_path_buf())
        }
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nesting levels; single underscores
            // stay inside field names
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Find the settings file by looking for a .tablesync directory
    /// from the current directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the workspace root directory (where .tablesync is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolve a configured path against the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Data directory, resolved against the workspace root.
    pub fn data_dir(&self) -> PathBuf {
        self.resolve(&self.data_dir)
    }

    /// Exports directory, resolved against the workspace root.
    pub fn exports_dir(&self) -> PathBuf {
        self.resolve(&self.exports_dir)
    }

    /// Storage configuration with the local path resolved.
    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            local_path: self.resolve(&self.storage.local_path),
            ..self.storage.clone()
        }
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in `dir/.tablesync/settings.toml`
    pub fn init_config_file(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let settings = Settings::default();
        settings.save(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.data_dir, PathBuf::from("data"));
        assert_eq!(settings.storage.backend, StorageBackend::Local);
        assert_eq!(settings.watcher.debounce_ms, 300);
        assert!(settings.watcher.initial_scan);
        assert!(!settings.sync.coerce_values);
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2
data_dir = "/srv/data"

[watcher]
debounce_ms = 1000
recursive = true

[storage]
backend = "postgrest"
url = "https://abc.supabase.co"
page_size = 250

[logging.modules]
watcher = "debug"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.data_dir, PathBuf::from("/srv/data"));
        assert_eq!(settings.watcher.debounce_ms, 1000);
        assert!(settings.watcher.recursive);
        assert_eq!(settings.storage.backend, StorageBackend::Postgrest);
        assert_eq!(settings.storage.url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(settings.storage.page_size, 250);
        assert_eq!(settings.logging.modules["watcher"], "debug");
        // Untouched values keep their defaults
        assert_eq!(settings.watcher.tick_ms, 100);
        assert_eq!(settings.storage.delete_filter, "id=not.is.null");
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.watcher.debounce_ms = 50;
        settings.storage.backend = StorageBackend::Memory;

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.watcher.debounce_ms, 50);
        assert_eq!(loaded.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_init_config_file_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();

        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert!(path.ends_with(".tablesync/settings.toml"));
        assert!(Settings::init_config_file(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[sync]\nbatch_size = 10\n").unwrap();

        unsafe {
            std::env::set_var("TABLESYNC_SYNC__BATCH_SIZE", "64");
        }
        let settings = Settings::load_from(&config_path).unwrap();
        unsafe {
            std::env::remove_var("TABLESYNC_SYNC__BATCH_SIZE");
        }

        assert_eq!(settings.sync.batch_size, 64);
    }

    #[test]
    fn test_load_from_infers_workspace_root() {
        let temp_dir = TempDir::new().unwrap();
        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.workspace_root.as_deref(), Some(temp_dir.path()));
        assert_eq!(settings.data_dir(), temp_dir.path().join("data"));

        let loose = temp_dir.path().join("other.toml");
        fs::write(&loose, "").unwrap();
        let settings = Settings::load_from(&loose).unwrap();
        assert_eq!(settings.workspace_root.as_deref(), Some(temp_dir.path()));
    }

    #[test]
    fn test_resolve_against_workspace_root() {
        let settings = Settings {
            workspace_root: Some(PathBuf::from("/work")),
            ..Settings::default()
        };
        assert_eq!(settings.data_dir(), PathBuf::from("/work/data"));
        assert_eq!(
            settings.storage().local_path,
            PathBuf::from("/work/.tablesync/tables")
        );
        assert_eq!(
            settings.resolve(Path::new("/abs/exports")),
            PathBuf::from("/abs/exports")
        );
    }
}
