use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::WeatherError;
use crate::model::{CanonicalWeather, Lang};
use crate::provider::{open_meteo::OpenMeteoProvider, weather_api::WeatherApiProvider};

pub mod open_meteo;
pub mod weather_api;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenMeteo,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "openmeteo",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openmeteo" => Ok(ProviderId::OpenMeteo),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(WeatherError::UnknownProvider(value.to_string())),
        }
    }
}

/// One weather data source: builds its own request, parses its own payload
/// shape, and normalizes into [`CanonicalWeather`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Cheap readiness check run before any I/O, including location
    /// resolution. Key-gated providers reject here when unconfigured.
    fn ensure_ready(&self) -> Result<(), WeatherError> {
        Ok(())
    }

    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        lang: Lang,
    ) -> Result<CanonicalWeather, WeatherError>;
}

/// Construct every adapter from config. Open-Meteo runs keyless; WeatherAPI
/// carries its configured key (or `None`, rejected at call time).
pub fn providers_from_config(config: &Config) -> HashMap<ProviderId, Box<dyn WeatherProvider>> {
    let mut providers: HashMap<ProviderId, Box<dyn WeatherProvider>> = HashMap::new();
    providers.insert(ProviderId::OpenMeteo, Box::new(OpenMeteoProvider::new()));
    providers.insert(
        ProviderId::WeatherApi,
        Box::new(WeatherApiProvider::new(
            config
                .provider_api_key(ProviderId::WeatherApi)
                .map(str::to_owned),
        )),
    );
    providers
}
