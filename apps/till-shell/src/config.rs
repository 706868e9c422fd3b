//! # Shell Configuration
//!
//! Settings for the app chrome, the API client, state storage and toasts.
//!
//! ## Configuration Priority
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Environment variables (highest priority)                            │
//! │     TILL_API_URL, TILL_STORAGE_PATH, TILL_STORAGE_BACKEND,              │
//! │     TILL_ORIGIN, TILL_FALLBACK_PATH                                     │
//! │                                                                         │
//! │  2. Config file (--config <path>, else <config dir>/till.toml)          │
//! │                                                                         │
//! │  3. Defaults (lowest priority)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [app]
//! name = "Till POS"
//! origin = "https://till.local"
//! fallback_path = "/"
//!
//! [api]
//! base_url = "http://localhost:3000/api"
//! timeout_secs = 30
//!
//! [storage]
//! backend = "sqlite"
//! path = "/var/lib/till/state.db"
//! prefix = "till."
//! persisted_keys = ["user", "token", "theme", "settings"]
//! sensitive_keys = ["user", "token", "cart", "currentSale"]
//! history_limit = 50
//!
//! [notifications]
//! default_duration_ms = 3000
//! max_visible = 5
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use till_router::RouterConfig;
use till_store::StoreConfig;
use till_view::NotificationConfig;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ShellError, ShellResult};

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "till.toml";

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete shell configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default)]
    pub app: AppSection,

    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub notifications: NotificationSection,
}

// =============================================================================
// [app]
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSection {
    /// Document title when a route sets none.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Origin used to decide which links stay in the app.
    #[serde(default)]
    pub origin: Option<String>,

    /// Where unmatched paths are sent when there is no not-found view.
    #[serde(default = "default_fallback_path")]
    pub fallback_path: String,
}

fn default_app_name() -> String {
    "Till POS".to_string()
}

fn default_fallback_path() -> String {
    "/".to_string()
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            origin: None,
            fallback_path: default_fallback_path(),
        }
    }
}

// =============================================================================
// [api]
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    /// Base URL every request path is appended to.
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// [storage]
// =============================================================================

/// Durable storage backend for persisted state keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Lost on exit. Useful for demos and tests.
    Memory,

    /// SQLite file under the data directory.
    #[default]
    Sqlite,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            _ => Err(ShellError::InvalidConfig(format!(
                "Invalid storage backend: {}. Valid options: memory, sqlite",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite file. Defaults to `<data dir>/state.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Key sets, prefix and history size.
    #[serde(flatten)]
    pub store: StoreConfig,
}

impl StorageSection {
    /// The SQLite file to open, if one can be determined.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join("state.db")))
    }
}

// =============================================================================
// [notifications]
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSection {
    /// Toast display time; 0 keeps toasts until dismissed.
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u64,

    #[serde(default = "default_max_visible")]
    pub max_visible: usize,
}

fn default_duration_ms() -> u64 {
    3000
}

fn default_max_visible() -> usize {
    5
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            default_duration_ms: default_duration_ms(),
            max_visible: default_max_visible(),
        }
    }
}

// =============================================================================
// Loading, Validation & Conversion
// =============================================================================

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "till", "pos")
}

impl ShellConfig {
    /// Default config file location.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from file and environment.
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load(config_path: Option<PathBuf>) -> ShellResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading shell config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load shell config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a config file without environment overrides.
    pub fn from_file(path: &Path) -> ShellResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ShellResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ShellError::ConfigSave("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Shell config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ShellResult<()> {
        let api = Url::parse(&self.api.base_url).map_err(|e| ShellError::InvalidUrl {
            url: self.api.base_url.clone(),
            reason: e.to_string(),
        })?;
        if api.scheme() != "http" && api.scheme() != "https" {
            return Err(ShellError::InvalidUrl {
                url: self.api.base_url.clone(),
                reason: "API URL must start with http:// or https://".into(),
            });
        }

        self.origin()?;

        if !self.app.fallback_path.starts_with('/') {
            return Err(ShellError::InvalidConfig(format!(
                "fallback_path must start with '/', got: {}",
                self.app.fallback_path
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ShellError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.notifications.max_visible == 0 {
            return Err(ShellError::InvalidConfig(
                "max_visible must be greater than 0".into(),
            ));
        }

        self.storage.store.validate()?;
        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TILL_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(path) = std::env::var("TILL_STORAGE_PATH") {
            debug!(path = %path, "Overriding storage path from environment");
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Ok(backend) = std::env::var("TILL_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding storage backend from environment");
                    self.storage.backend = parsed;
                }
                Err(e) => warn!(error = %e, "Ignoring TILL_STORAGE_BACKEND"),
            }
        }

        if let Ok(origin) = std::env::var("TILL_ORIGIN") {
            self.app.origin = Some(origin);
        }

        if let Ok(path) = std::env::var("TILL_FALLBACK_PATH") {
            self.app.fallback_path = path;
        }
    }

    /// The parsed app origin.
    pub fn origin(&self) -> ShellResult<Option<Url>> {
        self.app
            .origin
            .as_deref()
            .map(|origin| {
                Url::parse(origin).map_err(|e| ShellError::InvalidUrl {
                    url: origin.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Router settings derived from `[app]`.
    pub fn router_config(&self) -> ShellResult<RouterConfig> {
        Ok(RouterConfig {
            app_title: self.app.name.clone(),
            fallback_path: self.app.fallback_path.clone(),
            origin: self.origin()?,
            ..RouterConfig::default()
        })
    }

    /// Toast settings derived from `[notifications]`.
    pub fn notification_config(&self) -> NotificationConfig {
        NotificationConfig {
            default_duration: Duration::from_millis(self.notifications.default_duration_ms),
            max_visible: self.notifications.max_visible,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ShellConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.store.history_limit, 50);
        assert!(config.storage.store.is_sensitive("token"));
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("SQLITE".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[app]
origin = "https://till.local"

[storage]
backend = "memory"
persisted_keys = ["theme"]

[notifications]
default_duration_ms = 0
"#
        )
        .unwrap();

        let config = ShellConfig::from_file(file.path()).unwrap();
        assert_eq!(config.app.name, "Till POS");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.store.is_persisted("theme"));
        assert!(!config.storage.store.is_persisted("token"));
        assert_eq!(config.storage.store.prefix, "till.");
        assert_eq!(config.notification_config().default_duration, Duration::ZERO);
        assert_eq!(
            config.router_config().unwrap().origin.unwrap().as_str(),
            "https://till.local/"
        );
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ShellConfig::default();
        config.api.base_url = "ftp://files".into();
        assert!(matches!(config.validate(), Err(ShellError::InvalidUrl { .. })));

        let mut config = ShellConfig::default();
        config.app.fallback_path = "home".into();
        assert!(matches!(config.validate(), Err(ShellError::InvalidConfig(_))));

        let mut config = ShellConfig::default();
        config.app.origin = Some("not a url".into());
        assert!(config.validate().unwrap_err().is_config_error());

        let mut config = ShellConfig::default();
        config.storage.store.history_limit = 0;
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = ShellConfig::default();
        config.api.timeout_secs = 5;
        config.storage.backend = StorageBackend::Memory;
        config.save(Some(path.clone())).unwrap();

        let loaded = ShellConfig::from_file(&path).unwrap();
        assert_eq!(loaded.api.timeout_secs, 5);
        assert_eq!(loaded.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShellConfig::load(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.notifications.max_visible, 5);
    }
}
