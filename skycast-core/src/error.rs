use reqwest::StatusCode;
use thiserror::Error;

use crate::provider::ProviderId;

/// Error taxonomy of the core.
///
/// Every variant propagates to the caller untouched; the single exception is
/// corrupt cached data, which the cache layer recovers as a miss and never
/// surfaces through this type.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("geolocation is not supported on this host")]
    GeolocationUnsupported,

    #[error("permission to read the device position was denied")]
    PermissionDenied,

    #[error("the device position is unavailable")]
    PositionUnavailable,

    #[error("timed out waiting for the device position")]
    LocationTimeout,

    #[error("could not determine the device position")]
    LocationUnknown,

    #[error("no location found for '{0}'")]
    LocationNotFound(String),

    #[error("no API key configured for provider '{0}'")]
    MissingApiKey(ProviderId),

    #[error("unknown provider '{0}'; supported providers: openmeteo, weatherapi")]
    UnknownProvider(String),

    #[error("geocoding request failed with status {0}")]
    GeocodingHttp(StatusCode),

    #[error("{provider} request failed with status {status}")]
    ProviderHttp {
        provider: ProviderId,
        status: StatusCode,
    },

    #[error("{provider} reported an error: {message}")]
    ProviderApi {
        provider: ProviderId,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Map a platform geolocation error code onto the taxonomy.
///
/// Codes follow the W3C convention: 1 = permission denied, 2 = position
/// unavailable, 3 = timeout; anything else is unknown.
pub fn position_error_from_code(code: u16) -> WeatherError {
    match code {
        1 => WeatherError::PermissionDenied,
        2 => WeatherError::PositionUnavailable,
        3 => WeatherError::LocationTimeout,
        _ => WeatherError::LocationUnknown,
    }
}
