//! Open-Meteo adapter: keyless, up to 16 forecast days.
//!
//! The payload exposes current conditions plus parallel daily arrays and an
//! hourly weather-code array at a fixed 24-entries-per-day resolution. Day
//! and night conditions are sampled from the hourly array at midday and
//! midnight offsets, falling back to the daily code when the hourly slot is
//! absent (reachable for edge-of-range days; kept as policy).

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

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m,uv_index";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,weather_code";
const HOURLY_FIELDS: &str = "temperature_2m,weather_code";

/// Forecast length cap; the source may return more days than requested.
const MAX_FORECAST_DAYS: usize = 16;

const HOURS_PER_DAY: usize = 24;
const MIDDAY_OFFSET: usize = 12;

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    base_url: String,
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self::with_base_url(FORECAST_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        lang: Lang,
    ) -> Result<CanonicalWeather, WeatherError> {
        debug!(latitude, longitude, "requesting open-meteo forecast");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", MAX_FORECAST_DAYS.to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::ProviderHttp {
                provider: ProviderId::OpenMeteo,
                status,
            });
        }

        let envelope: OmEnvelope = serde_json::from_str(&body)?;
        if envelope.error {
            return Err(WeatherError::ProviderApi {
                provider: ProviderId::OpenMeteo,
                message: envelope
                    .reason
                    .unwrap_or_else(|| "unspecified provider error".to_string()),
            });
        }

        let parsed: OmResponse = serde_json::from_str(&body)?;
        Ok(transform(&parsed, lang))
    }
}

// Open-Meteo signals errors inline: {"error": true, "reason": "..."}.
#[derive(Debug, Deserialize)]
struct OmEnvelope {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OmResponse {
    current: OmCurrent,
    daily: OmDaily,
    hourly: OmHourly,
}

#[derive(Debug, Clone, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    relative_humidity_2m: u8,
    apparent_temperature: f64,
    weather_code: u16,
    wind_speed_10m: f64,
    uv_index: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct OmDaily {
    time: Vec<NaiveDate>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    weather_code: Vec<u16>,
}

#[derive(Debug, Clone, Deserialize)]
struct OmHourly {
    weather_code: Vec<u16>,
}

pub(crate) fn transform(raw: &OmResponse, lang: Lang) -> CanonicalWeather {
    let days = raw
        .daily
        .time
        .iter()
        .zip(&raw.daily.temperature_2m_max)
        .zip(&raw.daily.temperature_2m_min)
        .enumerate()
        .take(MAX_FORECAST_DAYS);

    let mut forecast = Vec::with_capacity(raw.daily.time.len().min(MAX_FORECAST_DAYS));
    for (index, ((date, max), min)) in days {
        let daily_code = raw.daily.weather_code.get(index).copied();
        let day_code = raw
            .hourly
            .weather_code
            .get(index * HOURS_PER_DAY + MIDDAY_OFFSET)
            .copied()
            .or(daily_code);
        let night_code = raw
            .hourly
            .weather_code
            .get(index * HOURS_PER_DAY)
            .copied()
            .or(daily_code);

        forecast.push(DayForecast {
            date: *date,
            max_temp_c: max.round() as i32,
            min_temp_c: min.round() as i32,
            day_condition: condition_for(day_code, lang),
            night_condition: condition_for(night_code, lang),
        });
    }

    CanonicalWeather {
        provider: ProviderId::OpenMeteo,
        location: None,
        current: CurrentConditions {
            temp_c: raw.current.temperature_2m.round() as i32,
            feels_like_c: raw.current.apparent_temperature.round() as i32,
            humidity_pct: raw.current.relative_humidity_2m,
            wind_kph: raw.current.wind_speed_10m.round() as i32,
            uv_index: raw.current.uv_index.round(),
            condition: condition_for(Some(raw.current.weather_code), lang),
        },
        forecast,
    }
}

/// WMO weather code to glyph and localized description. Unknown codes map to
/// the sentinel entry, never an error.
fn condition_for(code: Option<u16>, lang: Lang) -> Condition {
    let (icon, en, sk) = code
        .and_then(code_entry)
        .unwrap_or(("❓", "Unknown", "Neznáme"));
    let description = match lang {
        Lang::En => en,
        Lang::Sk => sk,
    };
    Condition {
        icon: ConditionIcon::Glyph(icon.to_string()),
        description: description.to_string(),
    }
}

fn code_entry(code: u16) -> Option<(&'static str, &'static str, &'static str)> {
    let entry = match code {
        0 => ("☀️", "Clear sky", "Jasno"),
        1 => ("🌤️", "Mainly clear", "Prevažne jasno"),
        2 => ("⛅", "Partly cloudy", "Čiastočne oblačno"),
        3 => ("☁️", "Overcast", "Zamračené"),
        45 => ("🌫️", "Fog", "Hmla"),
        48 => ("🌫️", "Depositing rime fog", "Námrazová hmla"),
        51 => ("🌦️", "Light drizzle", "Slabé mrholenie"),
        53 => ("🌦️", "Moderate drizzle", "Mierné mrholenie"),
        55 => ("🌦️", "Dense drizzle", "Husté mrholenie"),
        56 => ("🌧️", "Light freezing drizzle", "Slabé mrznúce mrholenie"),
        57 => ("🌧️", "Dense freezing drizzle", "Husté mrznúce mrholenie"),
        61 => ("🌧️", "Slight rain", "Slabý dážď"),
        63 => ("🌧️", "Moderate rain", "Mierny dážď"),
        65 => ("🌧️", "Heavy rain", "Silný dážď"),
        66 => ("🌧️", "Light freezing rain", "Slabý mrznúci dážď"),
        67 => ("🌧️", "Heavy freezing rain", "Silný mrznúci dážď"),
        71 => ("🌨️", "Slight snow fall", "Slabé sneženie"),
        73 => ("🌨️", "Moderate snow fall", "Mierné sneženie"),
        75 => ("❄️", "Heavy snow fall", "Silné sneženie"),
        77 => ("❄️", "Snow grains", "Snehové zrná"),
        80 => ("🌦️", "Slight rain showers", "Slabé prehánky"),
        81 => ("🌧️", "Moderate rain showers", "Mierné prehánky"),
        82 => ("🌧️", "Violent rain showers", "Silné prehánky"),
        85 => ("🌨️", "Slight snow showers", "Slabé snehové prehánky"),
        86 => ("❄️", "Heavy snow showers", "Silné snehové prehánky"),
        95 => ("⛈️", "Thunderstorm", "Búrka"),
        96 => ("⛈️", "Thunderstorm with slight hail", "Búrka s miernym krupobitím"),
        99 => ("⛈️", "Thunderstorm with heavy hail", "Búrka so silným krupobitím"),
        _ => return None,
    };
    Some(entry)
}
