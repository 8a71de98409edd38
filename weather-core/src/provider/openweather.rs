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

const BASE_URL: &str = "https://api.openweathermap.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_LIMIT: &str = "5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }

    async fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ProviderError> {
        let url = format!("{BASE_URL}{path}");

        let res = self
            .http
            .get(url)
            .query(query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|source| ProviderError::Transport { provider: ProviderId::OpenWeather, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ProviderError::Transport { provider: ProviderId::OpenWeather, source })?;

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    country: String,
    state: Option<String>,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    cod: Option<serde_json::Value>,
    message: Option<String>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather_by_city(&self, city: &str) -> Result<Weather, ProviderError> {
        let body = self
            .fetch(
                "/data/2.5/weather",
                &[("q", city), ("units", "metric"), ("appid", self.api_key.as_str())],
            )
            .await?;

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|source| ProviderError::Decode { provider: ProviderId::OpenWeather, source })?;

        Ok(weather_from_current(parsed))
    }

    async fn search_city(&self, query: &str) -> Result<Vec<City>, ProviderError> {
        let body = self
            .fetch(
                "/geo/1.0/direct",
                &[("q", query), ("limit", SEARCH_LIMIT), ("appid", self.api_key.as_str())],
            )
            .await?;

        let parsed: Vec<OwGeoEntry> = serde_json::from_str(&body)
            .map_err(|source| ProviderError::Decode { provider: ProviderId::OpenWeather, source })?;

        Ok(parsed.into_iter().enumerate().map(|(i, e)| city_from_entry(i, e)).collect())
    }
}

fn weather_from_current(parsed: OwCurrentResponse) -> Weather {
    let celsius = parsed.main.temp.round();
    let fahrenheit = (parsed.main.temp * 9.0 / 5.0 + 32.0).round();

    let short_description = parsed
        .weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    Weather {
        city: parsed.name,
        temperature: Temperature { c: celsius, f: fahrenheit },
        humidity: parsed.main.humidity,
        short_description,
    }
}

/// The geocoding endpoint has no stable city ids, so ids are synthesized
/// from the result position and the url slug from name and country.
fn city_from_entry(index: usize, entry: OwGeoEntry) -> City {
    let url = format!("{}-{}", entry.name.to_lowercase(), entry.country.to_lowercase());
    let region = entry.state.unwrap_or_else(|| entry.country.clone());

    City {
        id: index as i64 + 1,
        name: entry.name,
        region,
        country: entry.country,
        lat: entry.lat,
        lon: entry.lon,
        url,
    }
}

/// OpenWeather signals "city not found" with HTTP 404 or `"cod": "404"` in
/// the error body; everything else is a generic API failure.
fn error_from_body(status: StatusCode, body: &str) -> ProviderError {
    let parsed: Option<OwErrorBody> = serde_json::from_str(body).ok();

    // `cod` is a string in error bodies but a number in success bodies, so
    // accept both.
    let cod_is_404 = parsed
        .as_ref()
        .and_then(|e| e.cod.as_ref())
        .is_some_and(|cod| match cod {
            serde_json::Value::String(s) => s == "404",
            serde_json::Value::Number(n) => n.as_i64() == Some(404),
            _ => false,
        });

    if status == StatusCode::NOT_FOUND || cod_is_404 {
        return ProviderError::CityNotFound { provider: ProviderId::OpenWeather };
    }

    let message = parsed
        .and_then(|e| e.message)
        .unwrap_or_else(|| truncate_body(body));

    ProviderError::Api {
        provider: ProviderId::OpenWeather,
        status: status.as_u16(),
        message,
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
