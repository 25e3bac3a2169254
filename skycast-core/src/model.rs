use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::provider::ProviderId;

/// Geographic point, as produced by geocoding or the device position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Output language for condition descriptions.
///
/// Threaded explicitly into adapter calls; unrecognized codes fall back to
/// English rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Sk,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Sk => "sk",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code.to_lowercase().as_str() {
            "sk" => Lang::Sk,
            _ => Lang::En,
        }
    }
}

/// Normalized weather report every provider is transformed into.
///
/// Immutable once produced; this is also the payload persisted in the daily
/// cache, so it must serialize stably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalWeather {
    pub provider: ProviderId,
    /// Display name such as "Paris, France". `None` when resolution failed
    /// non-fatally and no fallback label was attached.
    pub location: Option<String>,
    pub current: CurrentConditions,
    /// Ordered by date ascending. 16 entries for Open-Meteo, 3 for WeatherAPI.
    pub forecast: Vec<DayForecast>,
}

/// Current conditions with temperatures and wind already rounded to whole
/// units. Rounding happens at the normalization boundary so downstream
/// rendering never repeats it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp_c: i32,
    pub feels_like_c: i32,
    pub humidity_pct: u8,
    pub wind_kph: i32,
    pub uv_index: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub max_temp_c: i32,
    pub min_temp_c: i32,
    /// Weather state sampled around midday.
    pub day_condition: Condition,
    /// Weather state sampled around midnight.
    pub night_condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub icon: ConditionIcon,
    pub description: String,
}

/// Open-Meteo conditions carry a short emoji glyph, WeatherAPI ships a
/// pre-rendered icon image instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionIcon {
    Glyph(String),
    Image(String),
}
