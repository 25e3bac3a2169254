//! End-to-end facade tests against a mock HTTP server.
//!
//! Mock expectation counts double as the "zero network activity" assertions:
//! the server panics on drop when an endpoint was hit more (or less) often
//! than expected.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skycast_core::{
    Config, Coordinates, DataSource, Geocoder, Geolocator, Lang, MemoryStore, OpenMeteoProvider,
    ProviderId, WeatherApiProvider, WeatherError, WeatherService, service::Clock,
};

struct FixedClock(NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

struct StubGeolocator;

#[async_trait]
impl Geolocator for StubGeolocator {
    async fn current_position(&self) -> Result<Coordinates, WeatherError> {
        Ok(Coordinates {
            latitude: 48.8566,
            longitude: 2.3522,
        })
    }
}

fn day(s: &str) -> NaiveDate {
    s.parse().expect("date")
}

fn service(
    server: &MockServer,
    store: MemoryStore,
    api_key: Option<&str>,
    today: NaiveDate,
) -> WeatherService<MemoryStore> {
    WeatherService::new(store, &Config::default())
        .with_geocoder(Geocoder::with_base_url(server.uri()))
        .with_provider(Box::new(OpenMeteoProvider::with_base_url(format!(
            "{}/v1/forecast",
            server.uri()
        ))))
        .with_provider(Box::new(WeatherApiProvider::with_base_url(
            format!("{}/v1/forecast.json", server.uri()),
            api_key.map(String::from),
        )))
        .with_clock(Box::new(FixedClock(today)))
}

fn open_meteo_body(days: usize) -> serde_json::Value {
    let dates: Vec<String> = (0..days).map(|d| format!("2026-08-{:02}", d + 1)).collect();
    let maxes: Vec<f64> = (0..days).map(|d| 20.0 + d as f64).collect();
    let mins: Vec<f64> = (0..days).map(|d| 10.0 + d as f64).collect();

    json!({
        "current": {
            "temperature_2m": 21.6,
            "relative_humidity_2m": 55,
            "apparent_temperature": 20.4,
            "weather_code": 2,
            "wind_speed_10m": 12.5,
            "uv_index": 4.4
        },
        "daily": {
            "time": dates,
            "temperature_2m_max": maxes,
            "temperature_2m_min": mins,
            "weather_code": vec![3u16; days]
        },
        "hourly": {
            "weather_code": vec![2u16; days * 24]
        }
    })
}

fn weather_api_body() -> serde_json::Value {
    let hour = json!({ "condition": { "text": "Sunny", "icon": "//cdn.example/sun.png" } });
    let days: Vec<serde_json::Value> = (0..3)
        .map(|d| {
            json!({
                "date": format!("2026-08-{:02}", d + 27),
                "day": { "maxtemp_c": 22.5, "mintemp_c": 12.4 },
                "hour": vec![hour.clone(); 24]
            })
        })
        .collect();

    json!({
        "current": {
            "temp_c": 18.4,
            "feelslike_c": 17.6,
            "humidity": 60,
            "wind_kph": 14.8,
            "uv": 5.5,
            "condition": { "text": "Partly cloudy", "icon": "//cdn.example/pc.png" }
        },
        "forecast": { "forecastday": days }
    })
}

async fn mount_geocoding(server: &MockServer, searches: u64, reverses: u64) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "lat": "48.8566", "lon": "2.3522" }])),
        )
        .expect(searches)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": { "city": "Paris", "country": "France" }
        })))
        .expect(reverses)
        .mount(server)
        .await;
}

async fn mount_open_meteo(server: &MockServer, hits: u64, days: usize) {
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(open_meteo_body(days)))
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn second_call_same_day_same_city_is_served_from_cache() {
    let server = MockServer::start().await;
    mount_geocoding(&server, 1, 1).await;
    mount_open_meteo(&server, 1, 16).await;

    let svc = service(&server, MemoryStore::new(), None, day("2026-08-27"));

    let first = svc
        .get_weather(ProviderId::OpenMeteo, Some("Paris"), Lang::En)
        .await
        .expect("first fetch");
    let second = svc
        .get_weather(ProviderId::OpenMeteo, Some("Paris"), Lang::En)
        .await
        .expect("second fetch");

    assert_eq!(first.source, DataSource::Network);
    assert_eq!(second.source, DataSource::Cache);

    let first_bytes = serde_json::to_vec(&first.weather).expect("serialize");
    let second_bytes = serde_json::to_vec(&second.weather).expect("serialize");
    assert_eq!(first_bytes, second_bytes);
}

#[tokio::test]
async fn changing_the_city_on_the_same_day_forces_a_refetch() {
    let server = MockServer::start().await;
    mount_geocoding(&server, 2, 2).await;
    mount_open_meteo(&server, 2, 16).await;

    let svc = service(&server, MemoryStore::new(), None, day("2026-08-27"));

    let first = svc
        .get_weather(ProviderId::OpenMeteo, Some("Paris"), Lang::En)
        .await
        .expect("first fetch");
    let second = svc
        .get_weather(ProviderId::OpenMeteo, Some("Lyon"), Lang::En)
        .await
        .expect("second fetch");

    assert_eq!(first.source, DataSource::Network);
    assert_eq!(second.source, DataSource::Network);
}

#[tokio::test]
async fn advancing_the_date_forces_a_refetch_for_the_same_city() {
    let server = MockServer::start().await;
    mount_geocoding(&server, 2, 2).await;
    mount_open_meteo(&server, 2, 16).await;

    let store = MemoryStore::new();

    let today = service(&server, store.clone(), None, day("2026-08-27"));
    let report = today
        .get_weather(ProviderId::OpenMeteo, Some("Paris"), Lang::En)
        .await
        .expect("fetch");
    assert_eq!(report.source, DataSource::Network);

    let tomorrow = service(&server, store, None, day("2026-08-28"));
    let report = tomorrow
        .get_weather(ProviderId::OpenMeteo, Some("Paris"), Lang::En)
        .await
        .expect("fetch");
    assert_eq!(report.source, DataSource::Network);
}

#[tokio::test]
async fn cache_slot_without_location_constraint_matches_any_entry_from_today() {
    let server = MockServer::start().await;
    mount_geocoding(&server, 1, 1).await;
    mount_open_meteo(&server, 1, 16).await;

    let svc = service(&server, MemoryStore::new(), None, day("2026-08-27"))
        .with_geolocator(Box::new(StubGeolocator));

    svc.get_weather(ProviderId::OpenMeteo, Some("Paris"), Lang::En)
        .await
        .expect("seed the cache");

    // No city given: today's entry satisfies the unconstrained read, so the
    // device position is never consulted.
    let report = svc
        .get_weather(ProviderId::OpenMeteo, None, Lang::En)
        .await
        .expect("cache hit");
    assert_eq!(report.source, DataSource::Cache);
}

#[tokio::test]
async fn device_position_is_used_when_no_city_is_given() {
    let server = MockServer::start().await;
    mount_geocoding(&server, 0, 1).await;
    mount_open_meteo(&server, 1, 16).await;

    let svc = service(&server, MemoryStore::new(), None, day("2026-08-27"))
        .with_geolocator(Box::new(StubGeolocator));

    let report = svc
        .get_weather(ProviderId::OpenMeteo, None, Lang::En)
        .await
        .expect("fetch");

    assert_eq!(report.source, DataSource::Network);
    assert_eq!(report.weather.location.as_deref(), Some("Paris, France"));
}

#[tokio::test]
async fn geolocation_unsupported_propagates_when_no_city_is_given() {
    let server = MockServer::start().await;

    let svc = service(&server, MemoryStore::new(), None, day("2026-08-27"));

    let err = svc
        .get_weather(ProviderId::OpenMeteo, None, Lang::En)
        .await
        .expect_err("must fail");
    assert!(matches!(err, WeatherError::GeolocationUnsupported));
    assert!(server.received_requests().await.expect("requests").is_empty());
}

#[tokio::test]
async fn unknown_provider_name_fails_without_any_network_activity() {
    let server = MockServer::start().await;

    let svc = service(&server, MemoryStore::new(), None, day("2026-08-27"));

    let err = svc
        .get_weather_by_name("unknownProvider", Some("Paris"), Lang::En)
        .await
        .expect_err("must fail");
    assert!(matches!(err, WeatherError::UnknownProvider(ref name) if name == "unknownProvider"));
    assert!(server.received_requests().await.expect("requests").is_empty());
}

#[tokio::test]
async fn missing_api_key_fails_before_any_request_is_attempted() {
    let server = MockServer::start().await;

    let svc = service(&server, MemoryStore::new(), None, day("2026-08-27"));

    let err = svc
        .get_weather(ProviderId::WeatherApi, Some("Paris"), Lang::En)
        .await
        .expect_err("must fail");
    assert!(matches!(err, WeatherError::MissingApiKey(ProviderId::WeatherApi)));
    assert!(server.received_requests().await.expect("requests").is_empty());
}

#[tokio::test]
async fn weather_api_round_trip_normalizes_the_nested_payload() {
    let server = MockServer::start().await;
    mount_geocoding(&server, 1, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_api_body()))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(&server, MemoryStore::new(), Some("KEY"), day("2026-08-27"));

    let report = svc
        .get_weather(ProviderId::WeatherApi, Some("Paris"), Lang::En)
        .await
        .expect("fetch");

    let weather = &report.weather;
    assert_eq!(weather.provider, ProviderId::WeatherApi);
    assert_eq!(weather.location.as_deref(), Some("Paris, France"));
    assert_eq!(weather.forecast.len(), 3);
    assert_eq!(weather.current.temp_c, 18);
    assert_eq!(weather.current.wind_kph, 15);
}

#[tokio::test]
async fn weather_api_error_payload_surfaces_as_provider_api_error() {
    let server = MockServer::start().await;
    mount_geocoding(&server, 1, 0).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "code": 2006, "message": "API key provided is invalid." }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(&server, MemoryStore::new(), Some("BADKEY"), day("2026-08-27"));

    let err = svc
        .get_weather(ProviderId::WeatherApi, Some("Paris"), Lang::En)
        .await
        .expect_err("must fail");
    assert!(
        matches!(err, WeatherError::ProviderApi { provider: ProviderId::WeatherApi, ref message }
            if message.contains("invalid"))
    );
}

#[tokio::test]
async fn provider_http_failure_propagates_with_its_status() {
    let server = MockServer::start().await;
    mount_geocoding(&server, 1, 0).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(&server, MemoryStore::new(), None, day("2026-08-27"));

    let err = svc
        .get_weather(ProviderId::OpenMeteo, Some("Paris"), Lang::En)
        .await
        .expect_err("must fail");
    assert!(
        matches!(err, WeatherError::ProviderHttp { provider: ProviderId::OpenMeteo, status }
            if status.as_u16() == 503)
    );
}

#[tokio::test]
async fn sixteen_day_cap_applies_to_oversized_responses() {
    let server = MockServer::start().await;
    mount_geocoding(&server, 1, 1).await;
    mount_open_meteo(&server, 1, 20).await;

    let svc = service(&server, MemoryStore::new(), None, day("2026-08-27"));

    let report = svc
        .get_weather(ProviderId::OpenMeteo, Some("Paris"), Lang::En)
        .await
        .expect("fetch");
    assert_eq!(report.weather.forecast.len(), 16);
}

#[tokio::test]
async fn reverse_geocoding_failure_falls_back_to_numeric_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "lat": "48.8566", "lon": "2.3522" }])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_open_meteo(&server, 1, 16).await;

    let svc = service(&server, MemoryStore::new(), None, day("2026-08-27"));

    let report = svc
        .get_weather(ProviderId::OpenMeteo, Some("Paris"), Lang::En)
        .await
        .expect("fetch");
    assert_eq!(report.weather.location.as_deref(), Some("48.86, 2.35"));
}

#[tokio::test]
async fn city_lookup_with_no_results_fails_with_location_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(&server, MemoryStore::new(), None, day("2026-08-27"));

    let err = svc
        .get_weather(ProviderId::OpenMeteo, Some("Nowhereville"), Lang::En)
        .await
        .expect_err("must fail");
    assert!(matches!(err, WeatherError::LocationNotFound(ref city) if city == "Nowhereville"));
}

#[tokio::test]
async fn switching_providers_keeps_independent_cache_slots() {
    let server = MockServer::start().await;
    mount_geocoding(&server, 2, 2).await;
    mount_open_meteo(&server, 1, 16).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_api_body()))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(&server, MemoryStore::new(), Some("KEY"), day("2026-08-27"));

    svc.get_weather(ProviderId::OpenMeteo, Some("Paris"), Lang::En)
        .await
        .expect("open-meteo fetch");
    svc.get_weather(ProviderId::WeatherApi, Some("Paris"), Lang::En)
        .await
        .expect("weatherapi fetch");

    // Both slots are warm now; neither fetch evicted the other.
    let om = svc
        .get_weather(ProviderId::OpenMeteo, Some("Paris"), Lang::En)
        .await
        .expect("cached open-meteo");
    let wa = svc
        .get_weather(ProviderId::WeatherApi, Some("Paris"), Lang::En)
        .await
        .expect("cached weatherapi");
    assert_eq!(om.source, DataSource::Cache);
    assert_eq!(wa.source, DataSource::Cache);
}
