use crate::dates::InvalidDateFormat;
use crate::export::ExportError;
use crate::geocoding::error::GeocodeError;
use crate::weather_data::error::FetchError;
use thiserror::Error;
use tokio::task::JoinError;

/// Failure of an ingestion run, one variant per pipeline stage.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    InvalidDateFormat(#[from] InvalidDateFormat),

    #[error("Location '{0}' could not be resolved")]
    LocationNotFound(String),

    #[error("Location resolver unavailable")]
    ResolverUnavailable(#[source] GeocodeError),

    #[error("Failed to fetch observations")]
    Fetch(#[from] FetchError),

    #[error("Failed to write output file")]
    Write(#[from] ExportError),

    #[error("Background task failed")]
    TaskJoin(#[from] JoinError),
}

impl From<GeocodeError> for IngestError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::LocationNotFound(city) => IngestError::LocationNotFound(city),
            other => IngestError::ResolverUnavailable(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocode_errors_map_to_stages() {
        let not_found: IngestError = GeocodeError::LocationNotFound("Atlantis".into()).into();
        assert!(matches!(not_found, IngestError::LocationNotFound(ref c) if c == "Atlantis"));

        let invalid: IngestError = GeocodeError::InvalidCoordinates {
            query: "London".into(),
            lat: "x".into(),
            lon: "y".into(),
        }
        .into();
        assert!(matches!(invalid, IngestError::ResolverUnavailable(_)));
    }
}
