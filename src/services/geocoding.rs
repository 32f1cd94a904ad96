//! Reverse geocoding through the Google Geocoding API

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;

use super::redis::RedisService;
use crate::{
    config::GeocodingConfig,
    error::{AppError, AppResult},
};

/// Returned whenever a lookup cannot produce a name
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Lookups in flight at once when resolving a whole listing page
const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Turns coordinates into a human readable place name
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Never fails; falls back to [`UNKNOWN_LOCATION`]
    async fn city_from_coordinates(&self, latitude: f64, longitude: f64) -> String;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: Option<String>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

/// Locality of the first result, else its formatted address
fn pick_location_name(response: &GeocodeResponse) -> Option<String> {
    if response.status != "OK" {
        return None;
    }
    let first = response.results.first()?;

    first
        .address_components
        .iter()
        .find(|c| c.types.iter().any(|t| t == "locality"))
        .map(|c| c.long_name.clone())
        .or_else(|| first.formatted_address.clone())
        .filter(|name| !name.trim().is_empty())
}

#[derive(Clone)]
pub struct GoogleGeocoder {
    client: Client,
    config: GeocodingConfig,
    cache: Option<RedisService>,
}

impl GoogleGeocoder {
    pub fn new(config: GeocodingConfig, cache: Option<RedisService>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config, cache })
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<Option<String>, reqwest::Error> {
        let response: GeocodeResponse = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("latlng", format!("{},{}", latitude, longitude)),
                ("key", self.config.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "OK" {
            tracing::warn!("Geocoding API returned status {}", response.status);
        }
        Ok(pick_location_name(&response))
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn city_from_coordinates(&self, latitude: f64, longitude: f64) -> String {
        if self.config.api_key.is_empty() {
            return UNKNOWN_LOCATION.to_string();
        }

        if let Some(cache) = &self.cache {
            match cache.get_cached_location(latitude, longitude).await {
                Ok(Some(name)) => return name,
                Ok(None) => {}
                Err(e) => tracing::warn!("Geocode cache unavailable: {}", e),
            }
        }

        let name = match self.lookup(latitude, longitude).await {
            Ok(Some(name)) => name,
            Ok(None) => return UNKNOWN_LOCATION.to_string(),
            Err(e) => {
                tracing::warn!("Reverse geocoding failed for ({}, {}): {}", latitude, longitude, e);
                return UNKNOWN_LOCATION.to_string();
            }
        };

        if let Some(cache) = &self.cache {
            if let Err(e) = cache
                .cache_location(latitude, longitude, &name, self.config.cache_ttl_secs)
                .await
            {
                tracing::warn!("Failed to cache geocoding result: {}", e);
            }
        }

        name
    }
}

fn free_text_location(location: Option<&str>) -> Option<String> {
    location
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

/// Geocoded name when coordinates are known, else the non-empty free-text location
pub async fn resolve_location_name(
    geocoder: &Arc<dyn Geocoder>,
    coordinates: Option<(f64, f64)>,
    location: Option<&str>,
) -> Option<String> {
    match coordinates {
        Some((lat, lng)) => Some(geocoder.city_from_coordinates(lat, lng).await),
        None => free_text_location(location),
    }
}

/// [`resolve_location_name`] for many places at once
///
/// Each distinct coordinate pair is geocoded once and lookups run
/// concurrently. Names come back in the order of `places`.
pub async fn resolve_location_names(
    geocoder: &Arc<dyn Geocoder>,
    places: &[(Option<(f64, f64)>, Option<&str>)],
) -> Vec<Option<String>> {
    let key = |(lat, lng): (f64, f64)| (lat.to_bits(), lng.to_bits());

    let mut seen = HashSet::new();
    let distinct: Vec<(f64, f64)> = places
        .iter()
        .filter_map(|(coordinates, _)| *coordinates)
        .filter(|point| seen.insert(key(*point)))
        .collect();

    let names: HashMap<(u64, u64), String> = stream::iter(distinct)
        .map(|(lat, lng)| async move {
            (key((lat, lng)), geocoder.city_from_coordinates(lat, lng).await)
        })
        .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
        .collect()
        .await;

    places
        .iter()
        .map(|(coordinates, location)| match coordinates {
            Some(point) => names.get(&key(*point)).cloned(),
            None => free_text_location(*location),
        })
        .collect()
}
