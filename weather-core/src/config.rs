use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::provider::ProviderId;

/// Configuration for a single weather provider. Lower `priority` means
/// tried first in the failover chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub priority: i32,
}

/// The provider section. Absent entry = not configured. Fields are explicit
/// (not a map) so declaration order is fixed: at equal priority, weatherapi
/// is tried before openweather.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    pub weatherapi: Option<ProviderConfig>,
    pub openweather: Option<ProviderConfig>,
}

impl ProvidersConfig {
    pub fn get(&self, id: ProviderId) -> Option<&ProviderConfig> {
        match id {
            ProviderId::WeatherApi => self.weatherapi.as_ref(),
            ProviderId::OpenWeather => self.openweather.as_ref(),
        }
    }

    pub fn configured_count(&self) -> usize {
        ProviderId::all().iter().filter(|id| self.get(**id).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.configured_count() == 0
    }
}

/// Which cache store backs the cached weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheBackend {
    #[default]
    InMemory,
    Redis,
    Memcached,
}

/// The cache section. The connection parameter matching `provider` must be
/// present; the cache factory enforces that at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub provider: CacheBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memcached_location: Option<String>,

    /// Freshness bound for cached lookups, in seconds.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: CacheBackend::default(),
            redis_url: None,
            memcached_location: None,
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [providers.weatherapi]
/// api_key = "..."
/// priority = 1
///
/// [cache]
/// provider = "redis"
/// redis_url = "redis://localhost:6379"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-app", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key. A newly configured provider goes to
    /// the back of the chain; reconfiguring keeps the existing priority.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        let next_priority = self.providers.configured_count() as i32 + 1;

        let slot = match provider_id {
            ProviderId::WeatherApi => &mut self.providers.weatherapi,
            ProviderId::OpenWeather => &mut self.providers.openweather,
        };

        match slot {
            Some(cfg) => cfg.api_key = api_key,
            None => *slot = Some(ProviderConfig { api_key, priority: next_priority }),
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id).map(|cfg| cfg.api_key.as_str())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml = r#"
            [providers.weatherapi]
            api_key = "WA_KEY"
            priority = 1

            [providers.openweather]
            api_key = "OW_KEY"
            priority = 2

            [cache]
            provider = "redis"
            redis_url = "redis://localhost:6379"
            ttl_seconds = 120
        "#;

        let cfg: Config = toml::from_str(toml).unwrap();

        assert_eq!(cfg.providers.configured_count(), 2);
        assert_eq!(cfg.provider_api_key(ProviderId::WeatherApi), Some("WA_KEY"));
        assert_eq!(cfg.cache.provider, CacheBackend::Redis);
        assert_eq!(cfg.cache.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(cfg.cache.ttl(), Duration::from_secs(120));
    }

    #[test]
    fn cache_section_defaults_to_in_memory_with_five_minute_ttl() {
        let cfg: Config = toml::from_str("").unwrap();

        assert_eq!(cfg.cache.provider, CacheBackend::InMemory);
        assert_eq!(cfg.cache.ttl_seconds, 300);
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn backend_names_match_the_configuration_contract() {
        let cfg: CacheConfig = toml::from_str(r#"provider = "in-memory""#).unwrap();
        assert_eq!(cfg.provider, CacheBackend::InMemory);

        let cfg: CacheConfig = toml::from_str(r#"provider = "memcached""#).unwrap();
        assert_eq!(cfg.provider, CacheBackend::Memcached);
    }

    #[test]
    fn upsert_appends_new_provider_at_the_back_of_the_chain() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "WA_KEY".into());
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OW_KEY".into());

        assert_eq!(cfg.providers.get(ProviderId::WeatherApi).unwrap().priority, 1);
        assert_eq!(cfg.providers.get(ProviderId::OpenWeather).unwrap().priority, 2);
    }

    #[test]
    fn upsert_keeps_priority_when_reconfiguring() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "OLD".into());
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OW".into());
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "NEW".into());

        let wa = cfg.providers.get(ProviderId::WeatherApi).unwrap();
        assert_eq!(wa.api_key, "NEW");
        assert_eq!(wa.priority, 1);
    }
}
