use crate::cleaning::SeriesCleaner;
use crate::config::IngesterConfig;
use crate::dates::DateNormalizer;
use crate::error::IngestError;
use crate::export::CsvExporter;
use crate::geocoding::resolver::LocationResolver;
use crate::types::coordinates::Coordinates;
use crate::weather_data::fetcher::ObservationFetcher;
use bon::bon;
use chrono::NaiveDate;
use log::{info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::task;

/// A completed ingestion of the daily average temperature of one city.
///
/// Constructing an `Ingester` runs the whole pipeline: the date range is normalized, the
/// city is geocoded, the observations of the surrounding weather stations are fetched,
/// reduced to a forward filled `tavg` column and written to `<output_dir>/<city>.csv`.
/// The first failing stage aborts the run.
#[derive(Debug, Clone)]
pub struct Ingester {
    city: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    coordinates: Coordinates,
    output_path: PathBuf,
    rows: usize,
}

#[bon]
impl Ingester {
    /// Runs the ingestion for `city`.
    ///
    /// # Arguments
    ///
    /// * `city`: **Required.** Free-text place name, also used as output file name.
    /// * `.start_date(&str)`: Optional. First day (inclusive) as `YYYY-MM-DD`. Defaults to `2010-01-01`.
    /// * `.end_date(&str)`: Optional. Last day (exclusive) as `YYYY-MM-DD`. Defaults to yesterday.
    /// * `.config(IngesterConfig)`: Optional. Endpoints, directories and station search settings.
    ///
    /// # Errors
    ///
    /// * [`IngestError::InvalidDateFormat`] for a malformed date, before any request is made.
    /// * [`IngestError::LocationNotFound`] / [`IngestError::ResolverUnavailable`] from geocoding.
    /// * [`IngestError::Fetch`] when no observations could be retrieved.
    /// * [`IngestError::Write`] when the output file could not be written. No partial file is left.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use temp_ingester::{IngestError, Ingester};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), IngestError> {
    /// let ingester = Ingester::builder("Manchester")
    ///     .start_date("2011-3-2")
    ///     .end_date("2020-12-29")
    ///     .run()
    ///     .await?;
    /// println!("{} rows in {}", ingester.rows(), ingester.output_path().display());
    /// # Ok(())
    /// # }
    /// ```
    #[builder(finish_fn = run)]
    pub async fn new(
        #[builder(start_fn)] city: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        #[builder(default)] config: IngesterConfig,
    ) -> Result<Self, IngestError> {
        let start_date = match start_date {
            Some(text) => DateNormalizer::parse(text)?,
            None => DateNormalizer::default_start(),
        };
        let end_date = match end_date {
            Some(text) => DateNormalizer::parse(text)?,
            None => DateNormalizer::default_end(),
        };
        if start_date >= end_date {
            warn!(
                "Start date {} is not before end date {}, the output will be empty",
                start_date, end_date
            );
        }

        let city = city.trim().to_string();
        info!("Ingesting {} from {} until {}", city, start_date, end_date);

        let resolver = LocationResolver::new(&config)?;
        let coordinates = resolver.resolve(&city).await?;

        let fetcher = ObservationFetcher::new(&config)?;
        let observations = fetcher.fetch(coordinates, start_date, end_date).await?;

        let cleaned = SeriesCleaner::clean(observations);
        let rows = cleaned.len();

        let exporter = CsvExporter::new(config.output_dir.clone());
        let file_city = city.clone();
        let output_path =
            task::spawn_blocking(move || exporter.export(&cleaned, &file_city)).await??;

        Ok(Self {
            city,
            start_date,
            end_date,
            coordinates,
            output_path,
            rows,
        })
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Exclusive end of the ingested range.
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Number of data rows written, excluding the header.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl fmt::Display for Ingester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} from {} until {}",
            self.city, self.coordinates, self.start_date, self.end_date
        )
    }
}
