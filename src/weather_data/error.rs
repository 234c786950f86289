use crate::stations::error::LocateStationError;
use crate::types::coordinates::Coordinates;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading the daily data file of a single station.
#[derive(Debug, Error)]
pub enum WeatherDataError {
    #[error("Failed to read metadata for cache file '{0}'")]
    CacheMetadataRead(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing parquet cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to scan parquet cache file '{0}'")]
    ParquetScan(PathBuf, #[source] PolarsError),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Data download or decompression failed")]
    DownloadIo(#[from] std::io::Error),

    #[error("Parsing error processing CSV data for station '{station}'")]
    CsvReadPolars {
        station: String,
        #[source]
        source: PolarsError,
    },

    #[error("CSV column count ({found}) does not match the daily schema ({expected}) for station {station}")]
    SchemaMismatch {
        station: String,
        expected: usize,
        found: usize,
    },

    #[error("Polars operation failed for station {station}")]
    PolarsError {
        station: String,
        #[source]
        source: PolarsError,
    },

    #[error("Missing required column '{column}' for station {station}")]
    MissingColumnError {
        station: String,
        column: String,
        #[source]
        source: PolarsError,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl WeatherDataError {
    /// Meteostat answers 404 for stations that have no daily data file.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WeatherDataError::HttpStatus { status, .. } if *status == reqwest::StatusCode::NOT_FOUND
        )
    }
}

/// Failures of [`crate::ObservationFetcher::fetch`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    WeatherData(#[from] WeatherDataError),

    #[error(transparent)]
    LocateStation(#[from] LocateStationError),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("No weather station with daily data within {radius} km of {location}")]
    NoStationWithinRadius { radius: f64, location: Coordinates },
}
