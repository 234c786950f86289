//! Turns a coordinate and a date range into a daily [`ObservationSeries`] using the
//! Meteostat bulk data of the stations around that coordinate.

use crate::config::IngesterConfig;
use crate::stations::locate_station::StationLocator;
use crate::types::coordinates::Coordinates;
use crate::types::observation::ObservationSeries;
use crate::types::required_data::RequiredData;
use crate::types::station::Station;
use crate::utils::ensure_cache_dir_exists;
use crate::weather_data::data_loader::WeatherDataLoader;
use crate::weather_data::error::FetchError;
use crate::weather_data::extractor::extract_daily_observations;
use chrono::{Days, NaiveDate};
use log::{debug, info, warn};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Retrieves daily weather observations for a coordinate.
///
/// Up to `station_limit` stations within `max_distance_km` are combined, nearest first:
/// for every day and every field the value of the closest station reporting it wins.
/// The station index is loaded lazily on the first fetch and reused afterwards.
pub struct ObservationFetcher {
    client: Client,
    base_url: String,
    cache_dir: PathBuf,
    max_cache_age: Duration,
    max_distance_km: f64,
    station_limit: usize,
    locator: OnceCell<StationLocator>,
    loader: WeatherDataLoader,
}

impl ObservationFetcher {
    pub fn new(config: &IngesterConfig) -> Result<Self, FetchError> {
        let client = config.http_client().map_err(FetchError::HttpClient)?;
        let cache_dir = config
            .resolve_cache_dir()
            .map_err(FetchError::CacheDirResolution)?;
        Ok(Self {
            loader: WeatherDataLoader::new(
                client.clone(),
                config.meteostat_url.clone(),
                &cache_dir,
                config.max_cache_age,
            ),
            client,
            base_url: config.meteostat_url.clone(),
            cache_dir,
            max_cache_age: config.max_cache_age,
            max_distance_km: config.max_distance_km,
            station_limit: config.station_limit,
            locator: OnceCell::new(),
        })
    }

    async fn locator(&self) -> Result<&StationLocator, FetchError> {
        self.locator
            .get_or_try_init(|| async {
                ensure_cache_dir_exists(&self.cache_dir)
                    .await
                    .map_err(|e| FetchError::CacheDirCreation(self.cache_dir.clone(), e))?;
                let locator = StationLocator::load(
                    &self.client,
                    &self.base_url,
                    &self.cache_dir,
                    self.max_cache_age,
                )
                .await?;
                info!("Station index holds {} stations", locator.len());
                Ok::<_, FetchError>(locator)
            })
            .await
    }

    /// Candidate stations, preferring those whose daily inventory covers the whole range.
    fn candidate_stations(
        &self,
        locator: &StationLocator,
        location: Coordinates,
        start: NaiveDate,
        last_day: NaiveDate,
    ) -> Vec<(Station, f64)> {
        let covering = locator.query(
            location,
            self.station_limit,
            self.max_distance_km,
            RequiredData::DateRange {
                start,
                end: last_day,
            },
        );
        if !covering.is_empty() {
            return covering;
        }
        debug!(
            "No station near {} covers {} - {}, falling back to any daily inventory",
            location, start, last_day
        );
        locator.query(
            location,
            self.station_limit,
            self.max_distance_km,
            RequiredData::Any,
        )
    }

    /// Fetches one observation per day in `[start, end)` for the area around `location`.
    ///
    /// Days no station reported are present with every field missing. A range with
    /// `start >= end` yields an empty series without contacting the provider.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NoStationWithinRadius`] when no station with daily data is near
    /// `location`, and the wrapped loader/locator errors for network, cache and parse failures.
    /// A station without a daily data file (HTTP 404) is skipped.
    pub async fn fetch(
        &self,
        location: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ObservationSeries, FetchError> {
        let mut series = ObservationSeries::spanning(start, end);
        let Some(last_day) = end.checked_sub_days(Days::new(1)).filter(|_| !series.is_empty())
        else {
            warn!(
                "Empty date range {} - {} (end is exclusive), nothing to fetch",
                start, end
            );
            return Ok(series);
        };

        let locator = self.locator().await?;
        let stations = self.candidate_stations(locator, location, start, last_day);
        if stations.is_empty() {
            return Err(FetchError::NoStationWithinRadius {
                radius: self.max_distance_km,
                location,
            });
        }

        for (station, distance_km) in &stations {
            let frame = match self.loader.get_frame(&station.id).await {
                Ok(frame) => frame,
                Err(e) if e.is_not_found() => {
                    warn!(
                        "Station {} ({}) has no daily data file, skipping",
                        station.id,
                        station.display_name()
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let observations = extract_daily_observations(frame, &station.id, start, end)?;
            info!(
                "Station {} ({}, {:.1} km) reported {} of {} days",
                station.id,
                station.display_name(),
                distance_km,
                observations.len(),
                series.len()
            );
            series.merge(&observations);
            if series.missing_tavg() == 0 {
                break;
            }
        }

        Ok(series)
    }
}
