use crate::utils::is_cache_fresh;
use crate::weather_data::error::WeatherDataError;
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use polars::prelude::*;
use reqwest::Client;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::task;
use tokio_util::io::StreamReader;

/// Column layout of the header-less Meteostat daily files.
pub const DAILY_COLUMNS: [&str; 11] = [
    "date", "tavg", "tmin", "tmax", "prcp", "snow", "wdir", "wspd", "wpgt", "pres", "tsun",
];

const CACHE_FILE_PREFIX: &str = "daily-";

/// Downloads Meteostat daily station files and keeps them as parquet in a cache directory.
pub struct WeatherDataLoader {
    cache_dir: PathBuf,
    base_url: String,
    max_age: Duration,
    download_client: Client,
}

impl WeatherDataLoader {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        cache_dir: &Path,
        max_age: Duration,
    ) -> WeatherDataLoader {
        WeatherDataLoader {
            cache_dir: cache_dir.to_path_buf(),
            base_url: base_url.into(),
            max_age,
            download_client: client,
        }
    }

    /// Returns the daily data of `station` as a LazyFrame with a `Date` typed `date` column
    /// and `Float64` measurement columns.
    ///
    /// The parquet cache is used while it is younger than the configured max age.
    pub async fn get_frame(&self, station: &str) -> Result<LazyFrame, WeatherDataError> {
        let parquet_path = self
            .cache_dir
            .join(format!("{}{}.parquet", CACHE_FILE_PREFIX, station));

        let fresh = is_cache_fresh(&parquet_path, self.max_age)
            .await
            .map_err(|e| WeatherDataError::CacheMetadataRead(parquet_path.clone(), e))?;

        if fresh {
            debug!(
                "Cache hit for daily data of station {} at {}",
                station,
                parquet_path.display()
            );
            match Self::scan_cached(&parquet_path) {
                Ok(frame) => return Ok(frame),
                Err(e) => warn!("Discarding unreadable cache for station {}: {}", station, e),
            }
        } else {
            info!(
                "Cache miss for daily data of station {}, downloading",
                station
            );
        }

        let raw_bytes = self.download(station).await?;
        let df = Self::csv_to_dataframe(raw_bytes, station).await?;
        Self::cache_dataframe(df, &parquet_path).await?;
        Self::scan_cached(&parquet_path)
    }

    /// Scans a cached parquet file, reading its footer so a truncated file fails here.
    fn scan_cached(parquet_path: &Path) -> Result<LazyFrame, WeatherDataError> {
        let mut frame = LazyFrame::scan_parquet(parquet_path, Default::default())
            .map_err(|e| WeatherDataError::ParquetScan(parquet_path.to_path_buf(), e))?;
        frame
            .collect_schema()
            .map_err(|e| WeatherDataError::ParquetScan(parquet_path.to_path_buf(), e))?;
        Ok(frame)
    }

    /// Downloads and decompresses the daily file of a station.
    async fn download(&self, station: &str) -> Result<Vec<u8>, WeatherDataError> {
        let url = format!(
            "{}/daily/{}.csv.gz",
            self.base_url.trim_end_matches('/'),
            station
        );
        info!("Downloading data from {}", url);

        let response = self
            .download_client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherDataError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {}", url, e);
                return Err(match e.status() {
                    Some(status) => WeatherDataError::HttpStatus {
                        url,
                        status,
                        source: e,
                    },
                    None => WeatherDataError::NetworkRequest(url, e),
                });
            }
        };

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let mut decoder = GzipDecoder::new(StreamReader::new(stream));
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).await?;
        debug!(
            "Downloaded and decompressed {} bytes for station {}",
            decompressed.len(),
            station
        );
        Ok(decompressed)
    }

    /// Parses raw header-less CSV bytes into a typed DataFrame on a blocking thread.
    async fn csv_to_dataframe(bytes: Vec<u8>, station: &str) -> Result<DataFrame, WeatherDataError> {
        let station = station.to_string();
        task::spawn_blocking(move || parse_daily_csv(bytes, &station)).await?
    }

    /// Writes the parquet file next to `path` and renames it into place, so concurrent
    /// readers never see a partially written cache.
    async fn cache_dataframe(mut df: DataFrame, path: &Path) -> Result<(), WeatherDataError> {
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let dir = path_buf.parent().unwrap_or_else(|| Path::new("."));
            let mut tmp = NamedTempFile::new_in(dir)
                .map_err(|e| WeatherDataError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(tmp.as_file_mut())
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| WeatherDataError::ParquetWritePolars(path_buf.clone(), e))?;
            tmp.persist(&path_buf)
                .map_err(|e| WeatherDataError::ParquetWriteIo(path_buf.clone(), e.error))?;
            debug!("Cached daily data to {}", path_buf.display());
            Ok::<(), WeatherDataError>(())
        })
        .await??;
        Ok(())
    }
}

pub(crate) fn parse_daily_csv(bytes: Vec<u8>, station: &str) -> Result<DataFrame, WeatherDataError> {
    // Full-file inference, otherwise a column that starts out integral fails on later decimals.
    let mut df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| WeatherDataError::CsvReadPolars {
            station: station.to_string(),
            source: e,
        })?;

    if df.width() != DAILY_COLUMNS.len() {
        warn!(
            "CSV column count ({}) does not match daily schema ({}) for station {}",
            df.width(),
            DAILY_COLUMNS.len(),
            station
        );
        return Err(WeatherDataError::SchemaMismatch {
            station: station.to_string(),
            expected: DAILY_COLUMNS.len(),
            found: df.width(),
        });
    }

    df.set_column_names(DAILY_COLUMNS.iter().copied())
        .map_err(|e| WeatherDataError::PolarsError {
            station: station.to_string(),
            source: e,
        })?;

    // Columns that are entirely empty are inferred as strings.
    let typed_columns: Vec<Expr> = std::iter::once(col("date").cast(DataType::Date))
        .chain(
            DAILY_COLUMNS[1..]
                .iter()
                .map(|name| col(*name).cast(DataType::Float64)),
        )
        .collect();

    df.lazy()
        .with_columns(typed_columns)
        .collect()
        .map_err(|e| WeatherDataError::PolarsError {
            station: station.to_string(),
            source: e,
        })
}
