use crate::stations::error::LocateStationError;
use crate::types::coordinates::Coordinates;
use crate::types::required_data::RequiredData;
use crate::types::station::Station;
use crate::utils::is_cache_fresh;
use async_compression::tokio::bufread::GzipDecoder;
use bincode::config::{Configuration, Fixint, LittleEndian};
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use ordered_float::OrderedFloat;
use reqwest::Client;
use rstar::{PointDistance, RTree};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

const STATIONS_PATH: &str = "stations/lite.json.gz";
const BINCODE_CACHE_FILE_NAME: &str = "stations_lite.bin";
/// Length of one degree of latitude on a 6371 km sphere.
const KM_PER_DEGREE: f64 = 111.19;
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Spatial index over the Meteostat station list.
#[derive(Debug, Clone)]
pub struct StationLocator {
    rtree: RTree<Station>,
}

struct StationCandidate<'a> {
    distance_km: OrderedFloat<f64>,
    station: &'a Station,
}
impl PartialEq for StationCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.distance_km == other.distance_km
    }
}
impl Eq for StationCandidate<'_> {}
impl PartialOrd for StationCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for StationCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_km.cmp(&other.distance_km)
    }
}

impl StationLocator {
    /// Loads the station index from `cache_dir`, downloading it from `base_url` when the
    /// cached copy is missing or older than `max_age`.
    pub async fn load(
        client: &Client,
        base_url: &str,
        cache_dir: &Path,
        max_age: Duration,
    ) -> Result<Self, LocateStationError> {
        let cache_file = cache_dir.join(BINCODE_CACHE_FILE_NAME);

        let fresh = is_cache_fresh(&cache_file, max_age)
            .await
            .map_err(|e| LocateStationError::CacheMetadataRead(cache_file.clone(), e))?;

        let cached = if fresh {
            debug!("Loading station index from {}", cache_file.display());
            let path = cache_file.clone();
            match tokio::task::spawn_blocking(move || Self::get_cached_stations(&path)).await? {
                Ok(stations) => Some(stations),
                Err(e) => {
                    warn!("Discarding unreadable station cache: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let stations = match cached {
            Some(stations) => stations,
            None => {
                let stations = Self::fetch_stations(client, base_url).await?;
                Self::cache_stations(stations.clone(), &cache_file).await?;
                stations
            }
        };

        Ok(Self::from_stations(stations))
    }

    pub fn from_stations(stations: Vec<Station>) -> Self {
        Self {
            rtree: RTree::bulk_load(stations),
        }
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    fn get_cached_stations(cache_path: &Path) -> Result<Vec<Station>, LocateStationError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| LocateStationError::CacheRead(cache_path.to_path_buf(), e))?;
        let (stations, _) =
            bincode::serde::decode_from_slice::<Vec<Station>, _>(&bytes, BINCODE_CONFIG).map_err(
                |e| LocateStationError::CacheDecode(cache_path.to_path_buf(), Box::new(e)),
            )?;
        Ok(stations)
    }

    async fn fetch_stations(
        client: &Client,
        base_url: &str,
    ) -> Result<Vec<Station>, LocateStationError> {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), STATIONS_PATH);
        info!("Downloading station index from {}", url);

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| LocateStationError::NetworkRequest(url.clone(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {}", url, e);
                return Err(match e.status() {
                    Some(status) => LocateStationError::HttpStatus {
                        url,
                        status,
                        source: e,
                    },
                    None => LocateStationError::NetworkRequest(url, e),
                });
            }
        };

        let stream = response.bytes_stream().map_err(io::Error::other);
        let decoder = GzipDecoder::new(BufReader::new(StreamReader::new(stream)));
        let mut decoder_reader = BufReader::new(decoder);
        let mut decompressed_json = Vec::new();
        decoder_reader.read_to_end(&mut decompressed_json).await?;

        let stations = tokio::task::spawn_blocking(move || {
            serde_json::from_slice::<Vec<Station>>(&decompressed_json)
                .map_err(LocateStationError::from)
        })
        .await??;
        info!("Parsed {} stations", stations.len());
        Ok(stations)
    }

    /// Writes the index next to `cache_path` and renames it into place, so readers never see
    /// a partially written cache.
    async fn cache_stations(
        stations: Vec<Station>,
        cache_path: &Path,
    ) -> Result<(), LocateStationError> {
        let path = cache_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let bincode_data = bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
                .map_err(|e| LocateStationError::CacheEncode(Box::new(e)))?;
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let mut tmp = NamedTempFile::new_in(dir)
                .map_err(|e| LocateStationError::CacheWrite(path.clone(), e))?;
            tmp.write_all(&bincode_data)
                .map_err(|e| LocateStationError::CacheWrite(path.clone(), e))?;
            tmp.persist(&path)
                .map_err(|e| LocateStationError::CacheWrite(path.clone(), e.error))?;
            debug!(
                "Wrote station cache ({} bytes) to {}",
                bincode_data.len(),
                path.display()
            );
            Ok::<(), LocateStationError>(())
        })
        .await??;
        Ok(())
    }

    /// Finds up to `n_results` stations within `max_distance_km` of `location`, closest first,
    /// whose daily inventory satisfies `required`.
    pub fn query(
        &self,
        location: Coordinates,
        n_results: usize,
        max_distance_km: f64,
        required: RequiredData,
    ) -> Vec<(Station, f64)> {
        if n_results == 0 {
            return vec![];
        }

        let point = [location.latitude, location.longitude];
        let walk_limit = walk_limit_deg2(location, max_distance_km);
        let mut heap: BinaryHeap<StationCandidate<'_>> = BinaryHeap::with_capacity(n_results);

        for station in self.rtree.nearest_neighbor_iter(&point) {
            if walk_limit.is_some_and(|limit| station.distance_2(&point) > limit) {
                // The walk is ordered by degree distance, nothing in range is left.
                break;
            }
            if !station.has_daily_data(required) {
                continue;
            }

            let dist_km = station.distance_km(location);
            if dist_km > max_distance_km {
                continue;
            }

            let candidate = StationCandidate {
                distance_km: OrderedFloat(dist_km),
                station,
            };
            if heap.len() < n_results {
                heap.push(candidate);
            } else if heap
                .peek()
                .is_some_and(|worst| candidate.distance_km < worst.distance_km)
            {
                heap.pop();
                heap.push(candidate);
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| (c.station.clone(), c.distance_km.into_inner()))
            .collect()
    }
}

/// Squared degree distance beyond which no station can be within `max_distance_km` of
/// `location`, doubled for slack. `None` near the poles, where longitude degrees shrink to
/// nothing and the whole index has to be walked.
fn walk_limit_deg2(location: Coordinates, max_distance_km: f64) -> Option<f64> {
    let lat_deg = max_distance_km / KM_PER_DEGREE;
    let max_lat = (location.latitude.abs() + lat_deg).min(90.0);
    let cos_lat = max_lat.to_radians().cos();
    if cos_lat < 1e-3 {
        return None;
    }
    let lon_deg = lat_deg / cos_lat;
    let radius_deg = 2.0 * (lat_deg * lat_deg + lon_deg * lon_deg).sqrt();
    Some(radius_deg * radius_deg)
}
