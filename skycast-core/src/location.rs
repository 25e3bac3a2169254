//! Location resolution: free-text city to coordinates, coordinates to a
//! display name, and the device-position seam.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::WeatherError;
use crate::model::Coordinates;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Numeric fallback label when reverse geocoding yields nothing usable.
pub fn coordinate_label(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.2}, {longitude:.2}")
}

/// Nominatim-backed geocoder.
#[derive(Debug, Clone)]
pub struct Geocoder {
    http: Client,
    base_url: String,
}

impl Default for Geocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder {
    pub fn new() -> Self {
        Self::with_base_url(NOMINATIM_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Forward-geocode a city name to coordinates. Fails with
    /// [`WeatherError::LocationNotFound`] when the lookup returns no matches.
    pub async fn resolve_city(&self, city: &str) -> Result<Coordinates, WeatherError> {
        let url = format!("{}/search", self.base_url);
        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(WeatherError::GeocodingHttp(status));
        }

        let body = res.text().await?;
        let matches: Vec<SearchMatch> = serde_json::from_str(&body)?;

        let first = matches
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::LocationNotFound(city.to_string()))?;

        Ok(Coordinates {
            latitude: first.lat,
            longitude: first.lon,
        })
    }

    /// Reverse-geocode coordinates to a "City, Country" display name.
    ///
    /// Best effort: any lookup failure or missing address field falls back to
    /// the numeric coordinate label instead of failing the request.
    pub async fn display_name(&self, latitude: f64, longitude: f64) -> String {
        match self.reverse(latitude, longitude).await {
            Ok(Some(name)) => name,
            Ok(None) | Err(_) => {
                debug!(latitude, longitude, "reverse geocoding yielded no name, using coordinates");
                coordinate_label(latitude, longitude)
            }
        }
    }

    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<String>, WeatherError> {
        let url = format!("{}/reverse", self.base_url);
        let res = self
            .http
            .get(&url)
            .query(&[
                ("format", "json"),
                ("lat", latitude.to_string().as_str()),
                ("lon", longitude.to_string().as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(WeatherError::GeocodingHttp(status));
        }

        let body = res.text().await?;
        let parsed: ReverseResponse = serde_json::from_str(&body)?;
        Ok(parsed.address.and_then(display_from_address))
    }
}

#[derive(Debug, Deserialize)]
struct SearchMatch {
    #[serde(deserialize_with = "f64_from_string")]
    lat: f64,
    #[serde(deserialize_with = "f64_from_string")]
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    country: Option<String>,
}

// Nominatim serializes coordinates as JSON strings.
fn f64_from_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

fn display_from_address(address: ReverseAddress) -> Option<String> {
    let city = match (address.city, address.town) {
        (Some(city), _) => city,
        // Town entries can carry a district suffix ("Name - District").
        (None, Some(town)) => town.split(" - ").next().unwrap_or(&town).trim().to_string(),
        (None, None) => return None,
    };
    let country = address.country?;
    Some(format!("{city}, {country}"))
}

/// One-shot current-position capability of the host.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, WeatherError>;
}

/// Geolocator for hosts without a position capability; always reports
/// [`WeatherError::GeolocationUnsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedGeolocator;

#[async_trait]
impl Geolocator for UnsupportedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, WeatherError> {
        Err(WeatherError::GeolocationUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_label_rounds_to_two_decimals() {
        assert_eq!(coordinate_label(48.85661, 2.35222), "48.86, 2.35");
        assert_eq!(coordinate_label(-33.0, 151.2), "-33.00, 151.20");
    }

    #[test]
    fn display_name_prefers_city_over_town() {
        let address = ReverseAddress {
            city: Some("Paris".to_string()),
            town: Some("Elsewhere".to_string()),
            country: Some("France".to_string()),
        };
        assert_eq!(
            display_from_address(address),
            Some("Paris, France".to_string())
        );
    }

    #[test]
    fn display_name_trims_town_district_suffix() {
        let address = ReverseAddress {
            city: None,
            town: Some("Pezinok - Grinava".to_string()),
            country: Some("Slovakia".to_string()),
        };
        assert_eq!(
            display_from_address(address),
            Some("Pezinok, Slovakia".to_string())
        );
    }

    #[test]
    fn display_name_requires_some_settlement_and_country() {
        let no_settlement = ReverseAddress {
            city: None,
            town: None,
            country: Some("France".to_string()),
        };
        assert_eq!(display_from_address(no_settlement), None);

        let no_country = ReverseAddress {
            city: Some("Paris".to_string()),
            town: None,
            country: None,
        };
        assert_eq!(display_from_address(no_country), None);
    }

    #[tokio::test]
    async fn unsupported_geolocator_reports_unsupported() {
        let err = UnsupportedGeolocator
            .current_position()
            .await
            .expect_err("must fail");
        assert!(matches!(err, WeatherError::GeolocationUnsupported));
    }
}
