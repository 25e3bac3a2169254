//! Core library for the `skycast` CLI.
//!
//! This crate defines:
//! - The daily per-provider weather cache
//! - Location resolution (geocoding and the device-position seam)
//! - Abstraction over weather providers and their adapters
//! - The facade orchestrating cache, resolution, and fetch
//! - Configuration & credentials handling
//!
//! It is used by `skycast-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod service;

pub use cache::{CacheEntry, CacheStore, FileStore, KeyValueStore, MemoryStore};
pub use config::{Config, ProviderConfig};
pub use error::{WeatherError, position_error_from_code};
pub use location::{Geocoder, Geolocator, UnsupportedGeolocator, coordinate_label};
pub use model::{
    CanonicalWeather, Condition, ConditionIcon, Coordinates, CurrentConditions, DayForecast, Lang,
};
pub use provider::{
    ProviderId, WeatherProvider, open_meteo::OpenMeteoProvider, weather_api::WeatherApiProvider,
};
pub use service::{Clock, DataSource, SystemClock, WeatherReport, WeatherService};
