//! Settings shared by the pipeline stages.

use crate::utils::get_cache_dir;
use bon::Builder;
use reqwest::Client;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_METEOSTAT_URL: &str = "https://bulk.meteostat.net/v2";
pub const DEFAULT_USER_AGENT: &str = concat!("temp_ingester/", env!("CARGO_PKG_VERSION"));
/// Search radius for weather stations around the resolved city.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 35.0;
/// Number of nearby stations combined into one series.
pub const DEFAULT_STATION_LIMIT: usize = 4;
/// Meteostat refreshes its bulk files daily.
pub const DEFAULT_MAX_CACHE_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration of an [`crate::Ingester`] run.
///
/// Every field has a default, so `IngesterConfig::default()` talks to the public Nominatim
/// and Meteostat endpoints, caches in the user cache directory and writes the output file to
/// the current working directory.
///
/// # Examples
///
/// ```
/// use temp_ingester::IngesterConfig;
///
/// let config = IngesterConfig::builder()
///     .output_dir("/tmp/temperatures")
///     .station_limit(2)
///     .build();
/// assert_eq!(config.station_limit, 2);
/// assert_eq!(config.max_distance_km, 35.0);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct IngesterConfig {
    /// Base URL of the Nominatim geocoding service.
    #[builder(into, default = DEFAULT_GEOCODER_URL.to_string())]
    pub geocoder_url: String,

    /// Base URL of the Meteostat bulk data service.
    #[builder(into, default = DEFAULT_METEOSTAT_URL.to_string())]
    pub meteostat_url: String,

    /// Sent with every request, Nominatim rejects anonymous clients.
    #[builder(into, default = DEFAULT_USER_AGENT.to_string())]
    pub user_agent: String,

    /// Where station metadata and daily files are cached. Defaults to the user cache dir.
    #[builder(into)]
    pub cache_dir: Option<PathBuf>,

    /// Directory receiving `<city>.csv`.
    #[builder(into, default = PathBuf::from("."))]
    pub output_dir: PathBuf,

    #[builder(default = DEFAULT_MAX_DISTANCE_KM)]
    pub max_distance_km: f64,

    #[builder(default = DEFAULT_STATION_LIMIT)]
    pub station_limit: usize,

    /// Cached provider files older than this are downloaded again.
    #[builder(default = DEFAULT_MAX_CACHE_AGE)]
    pub max_cache_age: Duration,
}

impl Default for IngesterConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl IngesterConfig {
    pub(crate) fn resolve_cache_dir(&self) -> io::Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_cache_dir(),
        }
    }

    pub(crate) fn http_client(&self) -> reqwest::Result<Client> {
        Client::builder().user_agent(self.user_agent.as_str()).build()
    }
}
