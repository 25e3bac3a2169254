//! WeatherAPI.com adapter: key-gated, fixed 3-day forecast.
//!
//! The payload nests per-day objects each carrying an hourly array. The day
//! condition is sampled from hour index 11, the night condition from the last
//! hour entry of the day. Conditions arrive pre-rendered (localized text plus
//! a scheme-less icon URL fragment), so no code table is involved.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::WeatherError;
use crate::model::{
    CanonicalWeather, Condition, ConditionIcon, CurrentConditions, DayForecast, Lang,
};

use super::{ProviderId, WeatherProvider};

const FORECAST_URL: &str = "https://api.weatherapi.com/v1/forecast.json";

const FORECAST_DAYS: u8 = 3;

/// Hour-of-day sampled for the day-period condition.
const DAY_SAMPLE_HOUR: usize = 11;

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherApiProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(FORECAST_URL.to_string(), api_key)
    }

    pub fn with_base_url(base_url: String, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str, WeatherError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(WeatherError::MissingApiKey(ProviderId::WeatherApi))
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    fn ensure_ready(&self) -> Result<(), WeatherError> {
        self.api_key().map(|_| ())
    }

    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        lang: Lang,
    ) -> Result<CanonicalWeather, WeatherError> {
        let key = self.api_key()?;
        debug!(latitude, longitude, "requesting weatherapi forecast");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("key", key.to_string()),
                ("q", format!("{latitude},{longitude}")),
                ("days", FORECAST_DAYS.to_string()),
                ("aqi", "no".to_string()),
                ("alerts", "no".to_string()),
                ("lang", lang.as_str().to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::ProviderHttp {
                provider: ProviderId::WeatherApi,
                status,
            });
        }

        let envelope: WaEnvelope = serde_json::from_str(&body)?;
        if let Some(error) = envelope.error {
            return Err(WeatherError::ProviderApi {
                provider: ProviderId::WeatherApi,
                message: error.message,
            });
        }

        let parsed: WaResponse = serde_json::from_str(&body)?;
        transform(&parsed)
    }
}

// WeatherAPI signals errors inline: {"error": {"code": ..., "message": ...}}.
#[derive(Debug, Deserialize)]
struct WaEnvelope {
    error: Option<WaError>,
}

#[derive(Debug, Deserialize)]
struct WaError {
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WaResponse {
    current: WaCurrent,
    forecast: WaForecast,
}

#[derive(Debug, Clone, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    wind_kph: f64,
    uv: f64,
    condition: WaCondition,
}

#[derive(Debug, Clone, Deserialize)]
struct WaCondition {
    text: String,
    icon: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Clone, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
    hour: Vec<WaHour>,
}

#[derive(Debug, Clone, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct WaHour {
    condition: WaCondition,
}

pub(crate) fn transform(raw: &WaResponse) -> Result<CanonicalWeather, WeatherError> {
    let mut forecast = Vec::with_capacity(raw.forecast.forecastday.len());

    for day in &raw.forecast.forecastday {
        let day_hour = day
            .hour
            .get(DAY_SAMPLE_HOUR)
            .or_else(|| day.hour.last())
            .ok_or_else(|| no_hourly_data(day.date))?;
        let night_hour = day.hour.last().ok_or_else(|| no_hourly_data(day.date))?;

        forecast.push(DayForecast {
            date: day.date,
            max_temp_c: day.day.maxtemp_c.round() as i32,
            min_temp_c: day.day.mintemp_c.round() as i32,
            day_condition: condition_from(&day_hour.condition),
            night_condition: condition_from(&night_hour.condition),
        });
    }

    Ok(CanonicalWeather {
        provider: ProviderId::WeatherApi,
        location: None,
        current: CurrentConditions {
            temp_c: raw.current.temp_c.round() as i32,
            feels_like_c: raw.current.feelslike_c.round() as i32,
            humidity_pct: raw.current.humidity,
            wind_kph: raw.current.wind_kph.round() as i32,
            uv_index: raw.current.uv,
            condition: condition_from(&raw.current.condition),
        },
        forecast,
    })
}

fn no_hourly_data(date: NaiveDate) -> WeatherError {
    WeatherError::ProviderApi {
        provider: ProviderId::WeatherApi,
        message: format!("no hourly data for {date}"),
    }
}

fn condition_from(condition: &WaCondition) -> Condition {
    Condition {
        icon: ConditionIcon::Image(image_url(&condition.icon)),
        description: condition.text.clone(),
    }
}

// Icon fragments come scheme-less ("//cdn.weatherapi.com/...").
fn image_url(fragment: &str) -> String {
    if fragment.starts_with("http") {
        fragment.to_string()
    } else {
        format!("https:{fragment}")
    }
}
