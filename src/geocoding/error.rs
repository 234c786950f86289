use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("No location found for '{0}'")]
    LocationNotFound(String),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Geocoding request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Geocoding request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode geocoding response from {0}")]
    InvalidResponse(String, #[source] reqwest::Error),

    #[error("Geocoder returned invalid coordinates ({lat}, {lon}) for '{query}'")]
    InvalidCoordinates {
        query: String,
        lat: String,
        lon: String,
    },
}
