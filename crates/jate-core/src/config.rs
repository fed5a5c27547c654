use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
///
/// Loaded from a TOML file when one exists; every field has a default, so a
/// missing file means the stock policy (the one the editor ships with). No
/// environment variables and no CLI flags feed into this.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl Config {
    /// Load config from the default location or fall back to defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| {
            crate::Error::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// Config file path: XDG on Linux/macOS, AppData on Windows
    fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("jate");

        Ok(config_dir.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Where the note database lives. Defaults to <data_dir>/jate/jate.db.
    pub db_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn db_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
            .join("jate");
        Ok(data_dir.join("jate.db"))
    }
}

/// The declarative caching rule table
///
/// Three independent rules, each with its own partition and freshness
/// horizon. Rule order matters and is fixed: page, asset, logo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_page_rule")]
    pub page: RuleConfig,

    #[serde(default = "default_asset_rule")]
    pub asset: RuleConfig,

    #[serde(default = "default_logo_rule")]
    pub logo: LogoRuleConfig,

    /// Navigation URLs warmed into the page cache at install time
    #[serde(default = "default_warm_urls")]
    pub warm_urls: Vec<String>,

    /// Only these statuses are ever written to cache
    #[serde(default = "default_cacheable_statuses")]
    pub cacheable_statuses: Vec<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub cache_name: String,
    pub max_age_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoRuleConfig {
    pub cache_name: String,
    pub max_age_seconds: i64,
    /// The rule only fires for image requests whose URL path ends in this
    pub path_suffix: String,
}

fn default_page_rule() -> RuleConfig {
    RuleConfig {
        cache_name: "page-cache".to_string(),
        max_age_seconds: 30 * 24 * 60 * 60, // pages stay fresh for 30 days
    }
}

fn default_asset_rule() -> RuleConfig {
    RuleConfig {
        cache_name: "asset-cache".to_string(),
        max_age_seconds: 7 * 24 * 60 * 60,
    }
}

fn default_logo_rule() -> LogoRuleConfig {
    LogoRuleConfig {
        cache_name: "logo-cache".to_string(),
        max_age_seconds: 7 * 24 * 60 * 60,
        path_suffix: "/images/logo.png".to_string(),
    }
}

fn default_warm_urls() -> Vec<String> {
    vec!["/index.html".to_string(), "/".to_string()]
}

fn default_cacheable_statuses() -> Vec<u16> {
    vec![0, 200] // 0 is an opaque cross-origin response
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            page: default_page_rule(),
            asset: default_asset_rule(),
            logo: default_logo_rule(),
            warm_urls: default_warm_urls(),
            cacheable_statuses: default_cacheable_statuses(),
        }
    }
}
