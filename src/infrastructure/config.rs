//! Configuration infrastructure
//!
//! Contains configuration loading and management for the sync core.
//!
//! Configuration is organized into three tiers:
//! 1. User-configurable settings (page size, logging)
//! 2. Hidden/Advanced settings (endpoints, timeouts, fan-out width)
//! 3. Application-managed settings (auto-updated by app)

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-configurable settings
    pub user: UserConfig,

    /// Hidden/Advanced settings (config file only)
    pub advanced: AdvancedConfig,

    /// Application-managed settings (auto-updated)
    pub app_managed: AppManagedConfig,
}

/// User-configurable settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Items per catalog page
    pub page_size: u32,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log file name inside the log directory
    pub file_name: String,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

/// Hidden/Advanced settings that are in config file but not exposed to the shell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Catalog service base url (list, detail and type endpoints)
    pub catalog_base_url: String,

    /// Favorites store base url (`api/favorites`, `api/pokemon/{id}`)
    pub favorites_base_url: String,

    /// Timeout for HTTP requests in seconds
    pub request_timeout_seconds: u64,

    /// User agent string
    pub user_agent: String,

    /// Maximum concurrent detail fetches within one fan-out
    pub detail_max_concurrent: usize,
}

/// Application-managed settings that are automatically updated by the app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppManagedConfig {
    /// Total item count reported by the last committed catalog page
    pub last_known_total_count: Option<u32>,

    /// Page index of the last committed catalog page
    pub last_viewed_page: Option<u32>,

    /// Timestamp of last successful sync
    pub last_successful_sync: Option<String>,

    /// Configuration version for migration purposes
    pub config_version: u32,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::PAGE_SIZE,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("tokio".to_string(), "info".to_string());
                filters
            },
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: endpoints::CATALOG_BASE_URL.to_string(),
            favorites_base_url: endpoints::FAVORITES_BASE_URL.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agent: defaults::USER_AGENT.to_string(),
            detail_max_concurrent: defaults::DETAIL_MAX_CONCURRENT,
        }
    }
}

impl Default for AppManagedConfig {
    fn default() -> Self {
        Self {
            last_known_total_count: None,
            last_viewed_page: None,
            last_successful_sync: None,
            config_version: CURRENT_CONFIG_VERSION,
        }
    }
}

const CURRENT_CONFIG_VERSION: u32 = 1;

impl AppConfig {
    /// Applies `POKEDEX_CATALOG_URL` / `POKEDEX_FAVORITES_URL` environment overrides.
    /// Replaces values no component can run with by their defaults.
    /// Returns `true` when something was repaired.
    pub fn repair_invalid_values(&mut self) -> bool {
        let mut repaired = false;
        if self.user.page_size == 0 {
            warn!("⚠️  page_size 0 is invalid, using {}", defaults::PAGE_SIZE);
            self.user.page_size = defaults::PAGE_SIZE;
            repaired = true;
        }
        if self.advanced.detail_max_concurrent == 0 {
            warn!(
                "⚠️  detail_max_concurrent 0 is invalid, using {}",
                defaults::DETAIL_MAX_CONCURRENT
            );
            self.advanced.detail_max_concurrent = defaults::DETAIL_MAX_CONCURRENT;
            repaired = true;
        }
        repaired
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("POKEDEX"))
            .build()
            .context("Failed to read environment overrides")?;

        if let Ok(url) = settings.get_string("catalog_url") {
            info!("Catalog base url overridden from environment: {}", url);
            self.advanced.catalog_base_url = url;
        }
        if let Ok(url) = settings.get_string("favorites_url") {
            info!("Favorites base url overridden from environment: {}", url);
            self.advanced.favorites_base_url = url;
        }
        Ok(())
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("pokedex-sync");

        Ok(config_dir)
    }

    /// Create a new configuration manager at the default location
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        let config_path = config_dir.join("pokedex_sync_config.json");

        Ok(Self { config_path })
    }

    /// Create a configuration manager for an explicit file
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(mut config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                self.migrate_config_if_needed(&mut config).await?;
                if config.repair_invalid_values() {
                    self.save_config(&config).await?;
                }
                Ok(config)
            }
            Err(parse_error) => {
                info!("Configuration file format outdated, attempting migration...");
                match self.migrate_config_format(&content).await {
                    Ok(mut migrated_config) => {
                        info!("✅ Successfully migrated configuration");
                        if migrated_config.repair_invalid_values() {
                            self.save_config(&migrated_config).await?;
                        }
                        Ok(migrated_config)
                    }
                    Err(migration_error) => {
                        warn!("⚠️  Configuration migration failed: {}", migration_error);
                        warn!("⚠️  Original parse error: {}", parse_error);
                        warn!("⚠️  Resetting to default configuration");

                        let backup_path = self.config_path.with_extension("json.corrupted");
                        if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                            warn!("Failed to create backup of corrupted config: {}", e);
                        } else {
                            info!("Backed up corrupted config to: {:?}", backup_path);
                        }

                        self.reset_to_defaults().await
                    }
                }
            }
        }
    }

    /// Fill in sections missing from an older file, then parse again
    async fn migrate_config_format(&self, content: &str) -> Result<AppConfig> {
        let mut json_value: serde_json::Value =
            serde_json::from_str(content).context("Configuration file contains invalid JSON")?;

        let root = json_value
            .as_object_mut()
            .context("Configuration root must be a JSON object")?;

        for (section, default) in [
            ("user", serde_json::to_value(UserConfig::default())?),
            ("advanced", serde_json::to_value(AdvancedConfig::default())?),
            ("app_managed", serde_json::to_value(AppManagedConfig::default())?),
        ] {
            match root.get_mut(section).and_then(|v| v.as_object_mut()) {
                Some(existing) => {
                    if let serde_json::Value::Object(default_fields) = default {
                        for (key, value) in default_fields {
                            if !existing.contains_key(&key) {
                                info!("Added missing '{}.{}' configuration field", section, key);
                                existing.insert(key, value);
                            }
                        }
                    }
                }
                None => {
                    info!("Added missing '{}' configuration section", section);
                    root.insert(section.to_string(), default);
                }
            }
        }

        let migrated_config: AppConfig =
            serde_json::from_value(json_value).context("Failed to parse migrated configuration")?;

        self.save_config(&migrated_config)
            .await
            .context("Failed to save migrated configuration")?;

        Ok(migrated_config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Update app-managed settings (like the last viewed page)
    pub async fn update_app_managed<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut AppManagedConfig),
    {
        let mut config = self.load_config().await?;
        updater(&mut config.app_managed);
        self.save_config(&config).await
    }

    /// Update user configuration settings
    pub async fn update_user_config<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut UserConfig),
    {
        let mut config = self.load_config().await?;
        updater(&mut config.user);
        self.save_config(&config).await
    }

    /// Reset configuration to defaults (useful for troubleshooting)
    pub async fn reset_to_defaults(&self) -> Result<AppConfig> {
        info!("🔄 Resetting configuration to defaults");

        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;

        info!("✅ Configuration reset to defaults");
        Ok(default_config)
    }

    /// Migrate configuration from older versions
    pub async fn migrate_config_if_needed(&self, config: &mut AppConfig) -> Result<bool> {
        if config.app_managed.config_version >= CURRENT_CONFIG_VERSION {
            return Ok(false);
        }

        info!(
            "🔄 Migrating configuration from version {} to {}",
            config.app_managed.config_version, CURRENT_CONFIG_VERSION
        );
        // version 0 stored a page size of 0 meaning "use default"
        if config.user.page_size == 0 {
            config.user.page_size = defaults::PAGE_SIZE;
        }
        config.app_managed.config_version = CURRENT_CONFIG_VERSION;

        self.save_config(config).await?;
        Ok(true)
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Remote endpoint constants
pub mod endpoints {
    /// Public catalog service
    pub const CATALOG_BASE_URL: &str = "https://pokeapi.co/api/v2/";

    /// Local favorites store
    pub const FAVORITES_BASE_URL: &str = "http://localhost:4000/";

    /// List endpoint path, relative to the catalog base
    pub const LISTING_PATH: &str = "pokemon";

    /// Type endpoint path prefix, relative to the catalog base
    pub const TYPE_PATH: &str = "type/";

    /// Favorites collection path, relative to the favorites base
    pub const FAVORITES_PATH: &str = "api/favorites";

    /// Favorites detail path prefix, relative to the favorites base
    pub const FAVORITE_ITEM_PATH: &str = "api/pokemon/";
}

/// Default configuration values
pub mod defaults {
    /// Items per catalog page
    pub const PAGE_SIZE: u32 = crate::domain::pagination::DEFAULT_PAGE_SIZE;

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default maximum concurrent detail fetches
    pub const DETAIL_MAX_CONCURRENT: usize = 16;

    /// Default user agent
    pub const USER_AGENT: &str = "pokedex-sync/0.1";

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = true;

    /// Default log file name
    pub const LOG_FILE_NAME: &str = "pokedex-sync.log";

    /// Default maximum log files to keep
    pub const LOG_MAX_FILES: u32 = 5;

    /// Default auto cleanup logs setting
    pub const LOG_AUTO_CLEANUP: bool = true;
}

/// URL building helper functions
pub mod utils {
    use super::endpoints::{FAVORITE_ITEM_PATH, FAVORITES_PATH, LISTING_PATH, TYPE_PATH};
    use anyhow::{Context, Result};
    use url::Url;

    /// Parse a base url, forcing a trailing slash so relative joins append
    pub fn base_url(raw: &str) -> Result<Url> {
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{}/", raw)
        };
        Url::parse(&normalized).with_context(|| format!("Invalid base url: {}", raw))
    }

    /// `{catalog}/pokemon?limit={n}&offset={m}`
    pub fn listing_url(catalog_base: &Url, limit: u32, offset: u32) -> Result<Url> {
        let mut url = catalog_base.join(LISTING_PATH)?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        Ok(url)
    }

    /// `{catalog}/type/{name}`
    pub fn type_url(catalog_base: &Url, type_name: &str) -> Result<Url> {
        Ok(catalog_base.join(TYPE_PATH)?.join(type_name)?)
    }

    /// `{favorites}/api/favorites`
    pub fn favorites_url(favorites_base: &Url) -> Result<Url> {
        Ok(favorites_base.join(FAVORITES_PATH)?)
    }

    /// `{favorites}/api/favorites/{id}`
    pub fn favorite_url(favorites_base: &Url, id: u32) -> Result<Url> {
        Ok(favorites_base.join(&format!("{}/{}", FAVORITES_PATH, id))?)
    }

    /// `{favorites}/api/pokemon/{id}`
    pub fn favorite_item_url(favorites_base: &Url, id: u32) -> Result<Url> {
        Ok(favorites_base.join(FAVORITE_ITEM_PATH)?.join(&id.to_string())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn creates_default_file_when_missing() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));

        let config = manager.load_config().await.unwrap();
        assert_eq!(config.user.page_size, defaults::PAGE_SIZE);
        assert!(manager.config_path().exists());
    }

    #[tokio::test]
    async fn round_trips_updates() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));

        manager
            .update_app_managed(|m| {
                m.last_viewed_page = Some(3);
                m.last_known_total_count = Some(1302);
            })
            .await
            .unwrap();
        manager.update_user_config(|u| u.page_size = 20).await.unwrap();

        let config = manager.load_config().await.unwrap();
        assert_eq!(config.app_managed.last_viewed_page, Some(3));
        assert_eq!(config.app_managed.last_known_total_count, Some(1302));
        assert_eq!(config.user.page_size, 20);
    }

    #[tokio::test]
    async fn migrates_file_with_missing_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"user":{"page_size":25}}"#).unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();
        assert_eq!(config.user.page_size, 25);
        assert_eq!(config.user.logging.level, defaults::LOG_LEVEL);
        assert_eq!(config.advanced.catalog_base_url, endpoints::CATALOG_BASE_URL);
    }

    #[tokio::test]
    async fn corrupted_file_is_backed_up_and_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();
        assert_eq!(config.user.page_size, defaults::PAGE_SIZE);
        assert!(dir.path().join("config.json.corrupted").exists());
    }

    #[tokio::test]
    async fn old_version_is_migrated() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));
        let mut config = AppConfig::default();
        config.user.page_size = 0;
        config.app_managed.config_version = 0;

        assert!(manager.migrate_config_if_needed(&mut config).await.unwrap());
        assert_eq!(config.user.page_size, defaults::PAGE_SIZE);
        assert!(!manager.migrate_config_if_needed(&mut config).await.unwrap());
    }

    #[tokio::test]
    async fn zero_page_size_is_repaired_on_current_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut stored = AppConfig::default();
        stored.user.page_size = 0;
        std::fs::write(&path, serde_json::to_string(&stored).unwrap()).unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();
        assert_eq!(config.app_managed.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.user.page_size, defaults::PAGE_SIZE);

        let persisted: AppConfig = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(persisted.user.page_size, defaults::PAGE_SIZE);
    }

    #[test]
    fn builds_endpoint_urls() {
        let catalog = utils::base_url("https://pokeapi.co/api/v2").unwrap();
        assert_eq!(
            utils::listing_url(&catalog, 50, 100).unwrap().as_str(),
            "https://pokeapi.co/api/v2/pokemon?limit=50&offset=100"
        );
        assert_eq!(
            utils::type_url(&catalog, "electric").unwrap().as_str(),
            "https://pokeapi.co/api/v2/type/electric"
        );

        let favorites = utils::base_url(endpoints::FAVORITES_BASE_URL).unwrap();
        assert_eq!(
            utils::favorites_url(&favorites).unwrap().as_str(),
            "http://localhost:4000/api/favorites"
        );
        assert_eq!(
            utils::favorite_url(&favorites, 25).unwrap().as_str(),
            "http://localhost:4000/api/favorites/25"
        );
        assert_eq!(
            utils::favorite_item_url(&favorites, 25).unwrap().as_str(),
            "http://localhost:4000/api/pokemon/25"
        );
    }
}
