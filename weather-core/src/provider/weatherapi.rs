use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::ProviderError,
    model::{City, Temperature, Weather},
    provider::ProviderId,
};

use super::WeatherProvider;

const BASE_URL: &str = "http://api.weatherapi.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// WeatherAPI.com error code for "No matching location found."
const CODE_CITY_NOT_FOUND: i64 = 1006;

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }

    async fn fetch(&self, path: &str, query: &str) -> Result<String, ProviderError> {
        let url = format!("{BASE_URL}/{path}");

        let res = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("q", query)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|source| ProviderError::Transport { provider: ProviderId::WeatherApi, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ProviderError::Transport { provider: ProviderId::WeatherApi, source })?;

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    temp_f: f64,
    humidity: u8,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaCurrentResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaSearchEntry {
    id: i64,
    name: String,
    region: String,
    country: String,
    lat: f64,
    lon: f64,
    url: String,
}

#[derive(Debug, Deserialize)]
struct WaError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WaErrorEnvelope {
    error: WaError,
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn get_weather_by_city(&self, city: &str) -> Result<Weather, ProviderError> {
        let body = self.fetch("current.json", city).await?;

        let parsed: WaCurrentResponse = serde_json::from_str(&body)
            .map_err(|source| ProviderError::Decode { provider: ProviderId::WeatherApi, source })?;

        Ok(weather_from_current(parsed))
    }

    async fn search_city(&self, query: &str) -> Result<Vec<City>, ProviderError> {
        let body = self.fetch("search.json", query).await?;

        let parsed: Vec<WaSearchEntry> = serde_json::from_str(&body)
            .map_err(|source| ProviderError::Decode { provider: ProviderId::WeatherApi, source })?;

        Ok(parsed.into_iter().map(city_from_entry).collect())
    }
}

fn weather_from_current(parsed: WaCurrentResponse) -> Weather {
    Weather {
        city: parsed.location.name,
        temperature: Temperature { c: parsed.current.temp_c, f: parsed.current.temp_f },
        humidity: parsed.current.humidity,
        short_description: parsed.current.condition.text,
    }
}

fn city_from_entry(entry: WaSearchEntry) -> City {
    City {
        id: entry.id,
        name: entry.name,
        region: entry.region,
        country: entry.country,
        lat: entry.lat,
        lon: entry.lon,
        url: entry.url,
    }
}

/// Translate a non-2xx WeatherAPI response into a typed error. The API wraps
/// failures in `{"error":{"code","message"}}`; code 1006 means the query
/// matched no location.
fn error_from_body(status: StatusCode, body: &str) -> ProviderError {
    if let Ok(envelope) = serde_json::from_str::<WaErrorEnvelope>(body) {
        if envelope.error.code == CODE_CITY_NOT_FOUND {
            return ProviderError::CityNotFound { provider: ProviderId::WeatherApi };
        }

        return ProviderError::Api {
            provider: ProviderId::WeatherApi,
            status: status.as_u16(),
            message: envelope.error.message,
        };
    }

    ProviderError::Api {
        provider: ProviderId::WeatherApi,
        status: status.as_u16(),
        message: truncate_body(body),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    // Walk back to a char boundary so a multibyte character straddling the
    // limit cannot panic the error path.
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &body[..end])
}
