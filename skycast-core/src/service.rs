//! Weather facade: cache check, location resolution, provider dispatch.
//!
//! One call is a strictly sequential async flow with at most three network
//! suspension points (geocoding or device position, weather fetch, reverse
//! geocoding). No retries, no provider fallback, no in-flight
//! de-duplication; concurrent callers do independent work and the cache is
//! the only shared state.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::cache::{CacheStore, KeyValueStore};
use crate::config::Config;
use crate::error::WeatherError;
use crate::location::{coordinate_label, Geocoder, Geolocator, UnsupportedGeolocator};
use crate::model::{CanonicalWeather, Lang};
use crate::provider::{providers_from_config, ProviderId, WeatherProvider};

/// Supplies "today" for cache validity; a seam so tests can advance the
/// simulated date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Where a report came from; callers use this to surface a "cached" notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Cache,
    Network,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub weather: CanonicalWeather,
    pub source: DataSource,
}

/// Orchestration entry point over the cache store, location resolver, and
/// provider adapters.
pub struct WeatherService<S: KeyValueStore> {
    cache: CacheStore<S>,
    geocoder: Geocoder,
    geolocator: Box<dyn Geolocator>,
    providers: HashMap<ProviderId, Box<dyn WeatherProvider>>,
    clock: Box<dyn Clock>,
}

impl<S: KeyValueStore> WeatherService<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            cache: CacheStore::new(store),
            geocoder: Geocoder::new(),
            geolocator: Box::new(UnsupportedGeolocator),
            providers: providers_from_config(config),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_geocoder(mut self, geocoder: Geocoder) -> Self {
        self.geocoder = geocoder;
        self
    }

    pub fn with_geolocator(mut self, geolocator: Box<dyn Geolocator>) -> Self {
        self.geolocator = geolocator;
        self
    }

    /// Replace the adapter registered under the provider's own id.
    pub fn with_provider(mut self, provider: Box<dyn WeatherProvider>) -> Self {
        self.providers.insert(provider.id(), provider);
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// String-identified entry point; rejects unknown provider names before
    /// any other work.
    pub async fn get_weather_by_name(
        &self,
        provider: &str,
        city: Option<&str>,
        lang: Lang,
    ) -> Result<WeatherReport, WeatherError> {
        let id = ProviderId::try_from(provider)?;
        self.get_weather(id, city, lang).await
    }

    /// Fetch weather for a provider, serving today's cache when it matches
    /// the requested location.
    ///
    /// Flow: cache check (eager eviction on mismatch), readiness check,
    /// location resolution, adapter fetch, display-name attachment, cache
    /// write. Every error except cache corruption propagates untouched.
    pub async fn get_weather(
        &self,
        provider_id: ProviderId,
        city: Option<&str>,
        lang: Lang,
    ) -> Result<WeatherReport, WeatherError> {
        let today = self.clock.today();

        if let Some(entry) = self.cache.read(provider_id) {
            if entry.is_valid(city, today) {
                debug!(provider = %provider_id, "serving today's cached weather");
                return Ok(WeatherReport {
                    weather: entry.payload,
                    source: DataSource::Cache,
                });
            }
            debug!(provider = %provider_id, "evicting stale or mismatched cache entry");
            self.cache.invalidate(provider_id);
        }

        let provider = self
            .providers
            .get(&provider_id)
            .ok_or_else(|| WeatherError::UnknownProvider(provider_id.to_string()))?;
        provider.ensure_ready()?;

        let coordinates = match city {
            Some(name) => self.geocoder.resolve_city(name).await?,
            None => self.geolocator.current_position().await?,
        };

        let mut weather = provider
            .fetch(coordinates.latitude, coordinates.longitude, lang)
            .await?;
        weather.location = Some(
            self.geocoder
                .display_name(coordinates.latitude, coordinates.longitude)
                .await,
        );

        let requested_location = match city {
            Some(name) => name.to_string(),
            None => coordinate_label(coordinates.latitude, coordinates.longitude),
        };
        self.cache
            .write(provider_id, &weather, &requested_location, today);
        info!(provider = %provider_id, location = %requested_location, "fetched and cached fresh weather");

        Ok(WeatherReport {
            weather,
            source: DataSource::Network,
        })
    }
}
