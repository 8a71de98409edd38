use async_trait::async_trait;
use tracing::warn;

use crate::{
    config::ProvidersConfig,
    error::{ConfigError, ProviderError},
    model::{City, Weather},
    provider::{
        ProviderId, WeatherProvider, openweather::OpenWeatherProvider,
        weatherapi::WeatherApiProvider,
    },
};

/// One configured provider waiting to be linked into a chain.
pub struct ChainEntry {
    pub id: ProviderId,
    pub priority: i32,
    pub adapter: Box<dyn WeatherProvider>,
}

impl std::fmt::Debug for ChainEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainEntry")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish()
    }
}

/// A link in the provider failover chain.
///
/// Each link tries its own adapter first; on any failure it logs the hop and
/// delegates to the next link. The last link's error propagates to the
/// caller unchanged. Success anywhere short-circuits the rest, so providers
/// are consulted strictly in priority order, one at a time.
#[derive(Debug)]
pub struct ChainLink {
    id: ProviderId,
    adapter: Box<dyn WeatherProvider>,
    next: Option<Box<ChainLink>>,
}

impl ChainLink {
    /// Link entries into a chain, ascending by priority. The sort is stable,
    /// so providers sharing a priority keep their declaration order
    /// (weatherapi before openweather when built from config).
    pub fn build(mut entries: Vec<ChainEntry>) -> Result<ChainLink, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::NoProviders);
        }

        entries.sort_by_key(|entry| entry.priority);

        let mut chain: Option<ChainLink> = None;
        for entry in entries.into_iter().rev() {
            chain = Some(ChainLink {
                id: entry.id,
                adapter: entry.adapter,
                next: chain.map(Box::new),
            });
        }

        chain.ok_or(ConfigError::NoProviders)
    }
}

#[async_trait]
impl WeatherProvider for ChainLink {
    async fn get_weather_by_city(&self, city: &str) -> Result<Weather, ProviderError> {
        match self.adapter.get_weather_by_city(city).await {
            Ok(weather) => Ok(weather),
            Err(err) => match &self.next {
                Some(next) => {
                    warn!(provider = %self.id, city, error = %err, "provider failed, trying next");
                    next.get_weather_by_city(city).await
                }
                None => Err(err),
            },
        }
    }

    async fn search_city(&self, query: &str) -> Result<Vec<City>, ProviderError> {
        match self.adapter.search_city(query).await {
            Ok(cities) => Ok(cities),
            Err(err) => match &self.next {
                Some(next) => {
                    warn!(provider = %self.id, query, error = %err, "provider search failed, trying next");
                    next.search_city(query).await
                }
                None => Err(err),
            },
        }
    }
}

/// Build the failover chain from configuration. Fails fast when no provider
/// carries an API key; that is a startup error, never a per-request one.
pub fn create_chain(config: &ProvidersConfig) -> Result<ChainLink, ConfigError> {
    let mut entries = Vec::new();

    if let Some(cfg) = &config.weatherapi {
        entries.push(ChainEntry {
            id: ProviderId::WeatherApi,
            priority: cfg.priority,
            adapter: Box::new(WeatherApiProvider::new(cfg.api_key.clone())),
        });
    }

    if let Some(cfg) = &config.openweather {
        entries.push(ChainEntry {
            id: ProviderId::OpenWeather,
            priority: cfg.priority,
            adapter: Box::new(OpenWeatherProvider::new(cfg.api_key.clone())),
        });
    }

    ChainLink::build(entries)
}
