//! Free-text place name to coordinates, using the Nominatim search API.

use crate::config::IngesterConfig;
use crate::geocoding::error::GeocodeError;
use crate::types::coordinates::Coordinates;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Resolves city names to [`Coordinates`].
///
/// Ambiguous names resolve to whatever the provider ranks first. Successful lookups are
/// remembered for the lifetime of the resolver, so resolving the same name twice only
/// queries the provider once.
pub struct LocationResolver {
    client: Client,
    base_url: String,
    cache: Mutex<HashMap<String, Coordinates>>,
}

impl LocationResolver {
    pub fn new(config: &IngesterConfig) -> Result<Self, GeocodeError> {
        Ok(Self {
            client: config.http_client().map_err(GeocodeError::HttpClient)?,
            base_url: config.geocoder_url.clone(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Looks up `city`.
    ///
    /// # Errors
    ///
    /// [`GeocodeError::LocationNotFound`] when the provider has no match; every other variant
    /// means the provider could not be reached or answered with something unusable.
    pub async fn resolve(&self, city: &str) -> Result<Coordinates, GeocodeError> {
        let key = city.trim();
        if key.is_empty() {
            return Err(GeocodeError::LocationNotFound(city.to_string()));
        }

        if let Some(coordinates) = self.cache.lock().await.get(key) {
            debug!("Geocoding cache hit for '{}'", key);
            return Ok(*coordinates);
        }

        let coordinates = self.lookup(key).await?;
        self.cache.lock().await.insert(key.to_string(), coordinates);
        Ok(coordinates)
    }

    async fn lookup(&self, query: &str) -> Result<Coordinates, GeocodeError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        debug!("Geocoding '{}' via {}", query, url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {}", url, e);
                return Err(match e.status() {
                    Some(status) => GeocodeError::HttpStatus {
                        url,
                        status,
                        source: e,
                    },
                    None => GeocodeError::NetworkRequest(url, e),
                });
            }
        };

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(url.clone(), e))?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::LocationNotFound(query.to_string()))?;

        let invalid = || GeocodeError::InvalidCoordinates {
            query: query.to_string(),
            lat: place.lat.clone(),
            lon: place.lon.clone(),
        };
        let latitude: f64 = place.lat.trim().parse().map_err(|_| invalid())?;
        let longitude: f64 = place.lon.trim().parse().map_err(|_| invalid())?;
        let coordinates = Coordinates::new(latitude, longitude);
        if !coordinates.is_valid() {
            return Err(invalid());
        }

        info!(
            "Resolved '{}' to {} ({})",
            query, coordinates, place.display_name
        );
        Ok(coordinates)
    }
}
