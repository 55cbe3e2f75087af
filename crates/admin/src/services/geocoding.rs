//! Address geocoding for the distributor map.
//!
//! Talks to a Nominatim-compatible `/search` endpoint. Results are cached in
//! memory so re-geocoding an unchanged address never leaves the process.
//!
//! # API Reference
//!
//! - `GET {base}/search?format=json&limit=1&countrycodes=cl&q=<address>`
//! - Responds with an array of places; `lat` and `lon` are decimal strings.
//! - Nominatim's usage policy requires an identifying `User-Agent`.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use delicias_core::{Coordinates, GeoError};

use crate::config::GeocoderConfig;

/// How long a resolved address stays cached.
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Maximum number of cached addresses.
const CACHE_CAPACITY: u64 = 2_000;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when geocoding an address.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Geocoder returned an error status.
    #[error("API error: {status}")]
    Api { status: u16 },

    /// Rate limited by the geocoder.
    #[error("Rate limited by geocoder")]
    RateLimited,

    /// The configured base URL cannot be used.
    #[error("Invalid geocoder URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The response could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The geocoder returned coordinates outside the valid range.
    #[error("Invalid coordinates: {0}")]
    Coordinates(#[from] GeoError),

    /// No place matched the address.
    #[error("No results for address: {0}")]
    NotFound(String),
}

/// One place in a Nominatim search response.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl Place {
    fn coordinates(&self) -> Result<Coordinates, GeocodeError> {
        let parse = |value: &str, field: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|e| GeocodeError::Parse(format!("{field} {value:?}: {e}")))
        };
        Ok(Coordinates::new(parse(&self.lat, "lat")?, parse(&self.lon, "lon")?)?)
    }
}

/// Nominatim-compatible geocoding client with an in-memory cache.
#[derive(Clone)]
pub struct Geocoder {
    inner: Arc<GeocoderInner>,
}

struct GeocoderInner {
    client: reqwest::Client,
    search_url: Url,
    cache: Cache<String, Coordinates>,
}

impl Geocoder {
    /// Create a new geocoder.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client fails to build.
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let search_url = Url::parse(&format!("{}/search", config.base_url))?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(GeocoderInner {
                client,
                search_url,
                cache,
            }),
        })
    }

    /// Resolve a free-text address to coordinates.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no place matches, or a transport/parse error.
    #[tracing::instrument(skip(self))]
    pub async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let key = cache_key(address);
        if let Some(hit) = self.inner.cache.get(&key).await {
            tracing::debug!("Geocoder cache hit");
            return Ok(hit);
        }

        let url = self.request_url(address);
        let response = self.inner.client.get(url).send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GeocodeError::RateLimited);
        }
        if !status.is_success() {
            return Err(GeocodeError::Api {
                status: status.as_u16(),
            });
        }

        let places: Vec<Place> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(format!("Failed to parse response: {e}")))?;
        let coordinates = first_match(&places, address)?;

        self.inner.cache.insert(key, coordinates).await;
        Ok(coordinates)
    }

    fn request_url(&self, address: &str) -> Url {
        let mut url = self.inner.search_url.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("limit", "1")
            .append_pair("countrycodes", "cl")
            .append_pair("q", address);
        url
    }
}

/// Addresses differing only in case or spacing share a cache entry.
fn cache_key(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn first_match(places: &[Place], address: &str) -> Result<Coordinates, GeocodeError> {
    places
        .first()
        .ok_or_else(|| GeocodeError::NotFound(address.to_owned()))?
        .coordinates()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn geocoder() -> Geocoder {
        Geocoder::new(&GeocoderConfig {
            base_url: "https://nominatim.example.org".to_owned(),
            user_agent: "delicias-admin-test".to_owned(),
        })
        .unwrap()
    }

    #[test]
    fn test_request_url_encodes_address() {
        let url = geocoder().request_url("Av. Matta 1020, Santiago");
        assert_eq!(url.path(), "/search");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("format".to_owned(), "json".to_owned())));
        assert!(pairs.contains(&("q".to_owned(), "Av. Matta 1020, Santiago".to_owned())));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_parses_nominatim_response() {
        let body = r#"[{"place_id":1,"lat":"-33.4569","lon":"-70.6483","display_name":"Santiago"}]"#;
        let places: Vec<Place> = serde_json::from_str(body).unwrap();
        let coordinates = first_match(&places, "Santiago").unwrap();
        assert!((coordinates.latitude() - -33.4569).abs() < 1e-9);
        assert!((coordinates.longitude() - -70.6483).abs() < 1e-9);
    }

    #[test]
    fn test_empty_response_is_not_found() {
        assert!(matches!(
            first_match(&[], "Calle Falsa 123"),
            Err(GeocodeError::NotFound(_))
        ));
    }

    #[test]
    fn test_out_of_range_coordinates_are_rejected() {
        let place = Place {
            lat: "123.0".to_owned(),
            lon: "-70.0".to_owned(),
        };
        assert!(matches!(
            place.coordinates(),
            Err(GeocodeError::Coordinates(_))
        ));

        let place = Place {
            lat: "norte".to_owned(),
            lon: "-70.0".to_owned(),
        };
        assert!(matches!(place.coordinates(), Err(GeocodeError::Parse(_))));
    }

    #[test]
    fn test_cache_key_normalizes_spacing_and_case() {
        assert_eq!(
            cache_key("  Av.  Matta 1020,\tSANTIAGO "),
            "av. matta 1020, santiago"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = Geocoder::new(&GeocoderConfig {
            base_url: "not a url".to_owned(),
            user_agent: "x".to_owned(),
        });
        assert!(matches!(result, Err(GeocodeError::InvalidUrl(_))));
    }
}
