use serde::{Deserialize, Serialize};

/// Temperature in both units, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub c: f64,
    pub f: f64,
}

/// Current weather for one city.
///
/// Field names follow the wire shape used for cached entries, so a value
/// cached by an older process deserializes in a newer one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub city: String,
    pub temperature: Temperature,
    pub humidity: u8,
    pub short_description: String,
}

/// A city candidate returned by `search_city`.
///
/// `id` is provider-assigned where the API supplies one and synthesized
/// otherwise. Not persisted by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub url: String,
}
