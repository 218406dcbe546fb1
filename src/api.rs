//! HTTP clients: Open-Meteo geocoding and forecast, IP geolocation,
//! BigDataCloud reverse geocoding and Unsplash photo search

use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

use crate::backdrop::{self, BackdropImage};
use crate::condition::weather_status;
use crate::state::{CityOption, Place, WeatherReport};

const USER_AGENT: &str = concat!("skylook/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 15;

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const IP_LOCATION_URL: &str = "http://ip-api.com/json";
const REVERSE_GEOCODE_URL: &str = "https://api.bigdatacloud.net/data/reverse-geocode-client";
const PHOTO_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";

/// How many autocomplete options to request
pub const SEARCH_RESULT_COUNT: usize = 15;

/// Appended to the city name so the photo search favours landmarks.
const PHOTO_QUERY_SUFFIX: &str = "famous landmark architecture tourism";

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("response parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("city not found: {0}")]
    NotFound(String),
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),
    #[error("response missing {0}")]
    MissingField(&'static str),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default()
    })
}

async fn get_bytes(url: &str) -> Result<Vec<u8>, ApiError> {
    let response = http_client().get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

async fn get_json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T, ApiError> {
    let bytes = get_bytes(url).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

// ============================================================================
// Geocoding API
// ============================================================================

/// Geocoding API response from Open-Meteo
#[derive(Debug, Deserialize)]
pub struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    admin1: Option<String>,
    country_code: Option<String>,
}

/// Result of an autocomplete search
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    /// The service answered with a result list (possibly empty)
    Found(Vec<CityOption>),
    /// The response carried no result list at all
    NotFound,
}

impl GeocodingResponse {
    pub fn into_outcome(self) -> SearchOutcome {
        match self.results {
            Some(results) => {
                SearchOutcome::Found(results.into_iter().map(option_from_result).collect())
            }
            None => SearchOutcome::NotFound,
        }
    }
}

fn option_from_result(result: GeocodingResult) -> CityOption {
    CityOption {
        name: result.name,
        admin1: result.admin1.filter(|region| !region.is_empty()),
        country_code: result.country_code.unwrap_or_default(),
        lat: result.latitude,
        lon: result.longitude,
    }
}

fn geocoding_url(query: &str, count: usize) -> String {
    format!(
        "{GEOCODING_URL}?name={}&count={count}&language=en&format=json",
        urlencoding::encode(query)
    )
}

/// Search for cities matching a query
pub async fn search_cities(query: &str) -> Result<SearchOutcome, ApiError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(SearchOutcome::Found(Vec::new()));
    }
    tracing::debug!(query, "searching cities");
    let response: GeocodingResponse = get_json(&geocoding_url(query, SEARCH_RESULT_COUNT)).await?;
    Ok(response.into_outcome())
}

/// Resolve a city name to its best match
pub async fn geocode_city(city: &str) -> Result<Place, ApiError> {
    let response: GeocodingResponse = get_json(&geocoding_url(city.trim(), 1)).await?;
    match response.into_outcome() {
        SearchOutcome::Found(options) => options
            .first()
            .map(CityOption::to_place)
            .ok_or_else(|| ApiError::NotFound(city.to_string())),
        SearchOutcome::NotFound => Err(ApiError::NotFound(city.to_string())),
    }
}

// ============================================================================
// Forecast API
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    current: CurrentConditions,
    daily: DailyConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
}

#[derive(Debug, Deserialize)]
struct DailyConditions {
    weather_code: Vec<Option<u8>>,
    precipitation_probability_max: Vec<Option<f64>>,
}

impl ForecastResponse {
    /// Current readings plus today's entry of the daily series.
    pub fn into_report(self) -> Result<WeatherReport, ApiError> {
        let weather_code = self
            .daily
            .weather_code
            .first()
            .copied()
            .flatten()
            .ok_or(ApiError::MissingField("daily.weather_code"))?;
        let rain_chance = self
            .daily
            .precipitation_probability_max
            .first()
            .copied()
            .flatten()
            .ok_or(ApiError::MissingField("daily.precipitation_probability_max"))?;

        Ok(WeatherReport {
            temperature: self.current.temperature_2m,
            humidity: self.current.relative_humidity_2m,
            rain_chance,
            wind_speed: self.current.wind_speed_10m,
            weather_code,
            status: weather_status(weather_code).to_string(),
        })
    }
}

pub fn forecast_url(lat: f64, lon: f64) -> String {
    format!(
        "{FORECAST_URL}?latitude={lat}&longitude={lon}\
         &daily=precipitation_probability_max,weather_code\
         &current=temperature_2m,relative_humidity_2m,wind_speed_10m"
    )
}

/// Fetch current conditions for a coordinate
pub async fn fetch_weather(lat: f64, lon: f64) -> Result<WeatherReport, ApiError> {
    tracing::info!(lat, lon, "fetching weather");
    let response: ForecastResponse = get_json(&forecast_url(lat, lon)).await?;
    response.into_report()
}

// ============================================================================
// Geolocation
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct IpLocationResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocationResponse {
    pub fn into_position(self) -> Result<(f64, f64), ApiError> {
        if self.status != "success" {
            let reason = self.message.unwrap_or(self.status);
            return Err(ApiError::LocationUnavailable(reason));
        }
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok((lat, lon)),
            _ => Err(ApiError::MissingField("lat/lon")),
        }
    }
}

/// Approximate position of this machine from its public IP address
pub async fn locate_by_ip() -> Result<(f64, f64), ApiError> {
    let response: IpLocationResponse = get_json(IP_LOCATION_URL).await?;
    response.into_position()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseGeocodeResponse {
    locality: Option<String>,
    city: Option<String>,
    country_code: Option<String>,
}

impl ReverseGeocodeResponse {
    /// Prefer the locality, then the city; empty strings count as absent.
    pub fn into_place(self, lat: f64, lon: f64) -> Place {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
        let name = non_empty(self.locality)
            .or_else(|| non_empty(self.city))
            .unwrap_or_else(|| "Current Location".to_string());
        Place {
            name,
            country_code: non_empty(self.country_code).unwrap_or_default(),
            lat,
            lon,
        }
    }
}

pub async fn reverse_geocode(lat: f64, lon: f64) -> Result<Place, ApiError> {
    let url = format!("{REVERSE_GEOCODE_URL}?latitude={lat}&longitude={lon}&localityLanguage=en");
    let response: ReverseGeocodeResponse = get_json(&url).await?;
    Ok(response.into_place(lat, lon))
}

/// Name a coordinate, falling back to "My Location" when the lookup fails.
pub async fn place_for_position(lat: f64, lon: f64) -> Place {
    match reverse_geocode(lat, lon).await {
        Ok(place) => {
            tracing::info!(name = %place.name, country = %place.country_code, "reverse geocoded");
            place
        }
        Err(e) => {
            tracing::warn!(error = %e, "reverse geocoding failed; using generic name");
            Place {
                name: "My Location".to_string(),
                country_code: String::new(),
                lat,
                lon,
            }
        }
    }
}

// ============================================================================
// Photo search
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PhotoSearchResponse {
    #[serde(default)]
    results: Vec<PhotoResult>,
}

#[derive(Debug, Deserialize)]
struct PhotoResult {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    full: String,
}

impl PhotoSearchResponse {
    pub fn first_photo_url(self) -> Option<String> {
        self.results.into_iter().next().map(|photo| photo.urls.full)
    }
}

pub fn photo_search_url(query: &str, access_key: &str) -> String {
    let query = format!("{query} {PHOTO_QUERY_SUFFIX}");
    format!(
        "{PHOTO_SEARCH_URL}?page=1&query={}&client_id={}&orientation=landscape&per_page=1",
        urlencoding::encode(&query),
        urlencoding::encode(access_key)
    )
}

/// Find a landmark photo for `query` and reduce it to a backdrop grid.
///
/// `Ok(None)` when the search has no results.
pub async fn fetch_backdrop(
    query: &str,
    access_key: &str,
) -> Result<Option<BackdropImage>, ApiError> {
    let response: PhotoSearchResponse = get_json(&photo_search_url(query, access_key)).await?;
    let Some(url) = response.first_photo_url() else {
        return Ok(None);
    };
    tracing::debug!(%url, "downloading backdrop");
    let bytes = get_bytes(&url).await?;
    let image = tokio::task::spawn_blocking(move || backdrop::decode_backdrop(&bytes)).await??;
    Ok(Some(image))
}
