use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use weather_core::{
    CachedWeatherProvider, Config, MetricsService, ProviderId, RuntimeMetrics, WeatherProvider,
    cache::factory as cache_factory, provider::chain::create_chain,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather lookups with provider failover and caching")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "weatherapi" or "openweather".
        provider: String,
    },

    /// Show current weather for a city.
    Get {
        /// City name or query string.
        city: String,
    },

    /// Search for city candidates matching a query.
    Search {
        /// Free-form query, e.g. "Kyiv" or "Springfield".
        query: String,
    },

    /// Drop every entry from the configured cache store.
    ClearCache,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Get { city } => get(&city).await,
            Command::Search { query } => search(&query).await,
            Command::ClearCache => clear_cache().await,
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let mut config = Config::load()?;
    config.upsert_provider_api_key(id, api_key.trim().to_string());
    config.save()?;

    println!("Saved credentials for {id}.");
    Ok(())
}

/// Wire the core the way a service bootstrap would: metrics sink, cache
/// factory, provider chain, cache-aside proxy.
fn build_provider(config: &Config) -> anyhow::Result<(CachedWeatherProvider, Arc<dyn weather_core::CacheProvider>)> {
    let metrics: Arc<dyn MetricsService> = Arc::new(RuntimeMetrics);

    let cache = cache_factory::create(&config.cache, metrics, "weather")
        .context("Cache configuration is invalid")?;

    let chain = create_chain(&config.providers).context(
        "No usable weather provider.\n\
         Hint: run `weather configure <provider>` (e.g. `weather configure weatherapi`) first.",
    )?;

    let provider =
        CachedWeatherProvider::new(Box::new(chain), Arc::clone(&cache), config.cache.ttl());

    Ok((provider, cache))
}

async fn get(city: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let (provider, cache) = build_provider(&config)?;

    let result = provider.get_weather_by_city(city).await;
    cache.disconnect().await.ok();

    let weather = result?;

    println!("{}", weather.city);
    println!("  {} ({}°C / {}°F)", weather.short_description, weather.temperature.c, weather.temperature.f);
    println!("  humidity: {}%", weather.humidity);

    Ok(())
}

async fn search(query: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let (provider, cache) = build_provider(&config)?;

    let result = provider.search_city(query).await;
    cache.disconnect().await.ok();

    let cities = result?;

    if cities.is_empty() {
        println!("No matches for '{query}'.");
        return Ok(());
    }

    for city in cities {
        println!("{:>3}. {}, {} ({}) [{:.2}, {:.2}]", city.id, city.name, city.region, city.country, city.lat, city.lon);
    }

    Ok(())
}

async fn clear_cache() -> anyhow::Result<()> {
    let config = Config::load()?;
    let metrics: Arc<dyn MetricsService> = Arc::new(RuntimeMetrics);

    let cache = cache_factory::create(&config.cache, metrics, "weather")
        .context("Cache configuration is invalid")?;

    cache.clear().await.context("Failed to clear the cache")?;
    cache.disconnect().await.ok();

    println!("Cache cleared.");
    Ok(())
}
