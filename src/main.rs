//! Command line entry point: `temp-ingester <CITY> [--start-date ..] [--end-date ..]`.

use clap::Parser;
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use temp_ingester::{
    Ingester, IngesterConfig, DEFAULT_GEOCODER_URL, DEFAULT_MAX_DISTANCE_KM,
    DEFAULT_METEOSTAT_URL, DEFAULT_STATION_LIMIT,
};

/// Download the daily average temperature of a city into `<CITY>.csv`.
#[derive(Parser, Debug)]
#[command(name = "temp-ingester")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// City to ingest, e.g. "London"
    city: String,

    /// First day to ingest (inclusive), YYYY-MM-DD [default: 2010-01-01]
    #[arg(long, env = "TEMP_INGESTER_START_DATE")]
    start_date: Option<String>,

    /// Day to stop at (exclusive), YYYY-MM-DD [default: yesterday]
    #[arg(long, env = "TEMP_INGESTER_END_DATE")]
    end_date: Option<String>,

    /// Directory the CSV file is written to
    #[arg(long, env = "TEMP_INGESTER_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Cache directory for provider downloads [default: user cache dir]
    #[arg(long, env = "TEMP_INGESTER_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Nominatim base URL
    #[arg(long, env = "TEMP_INGESTER_GEOCODER_URL", default_value = DEFAULT_GEOCODER_URL)]
    geocoder_url: String,

    /// Meteostat bulk data base URL
    #[arg(long, env = "TEMP_INGESTER_METEOSTAT_URL", default_value = DEFAULT_METEOSTAT_URL)]
    meteostat_url: String,

    /// Search radius for weather stations in km
    #[arg(long, env = "TEMP_INGESTER_MAX_DISTANCE_KM", default_value_t = DEFAULT_MAX_DISTANCE_KM)]
    max_distance_km: f64,

    /// Maximum number of stations combined
    #[arg(long, env = "TEMP_INGESTER_STATION_LIMIT", default_value_t = DEFAULT_STATION_LIMIT)]
    station_limit: usize,
}

impl Cli {
    fn config(&self) -> IngesterConfig {
        IngesterConfig::builder()
            .geocoder_url(self.geocoder_url.as_str())
            .meteostat_url(self.meteostat_url.as_str())
            .maybe_cache_dir(self.cache_dir.clone())
            .output_dir(self.output_dir.clone())
            .max_distance_km(self.max_distance_km)
            .station_limit(self.station_limit)
            .build()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = Ingester::builder(&cli.city)
        .maybe_start_date(cli.start_date.as_deref())
        .maybe_end_date(cli.end_date.as_deref())
        .config(cli.config())
        .run()
        .await;

    match result {
        Ok(ingester) => {
            println!(
                "{}: {} rows written to {}",
                ingester,
                ingester.rows(),
                ingester.output_path().display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            let mut message = e.to_string();
            let mut source = e.source();
            while let Some(cause) = source {
                message.push_str(&format!(": {}", cause));
                source = cause.source();
            }
            error!("{}", message);
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
