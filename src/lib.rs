mod cleaning;
mod config;
mod dates;
mod error;
mod export;
mod geocoding;
mod ingester;
mod stations;
mod types;
mod utils;
mod weather_data;

pub use cleaning::SeriesCleaner;
pub use config::*;
pub use dates::{DateNormalizer, InvalidDateFormat, DATE_FORMAT};
pub use error::IngestError;
pub use export::{CsvExporter, ExportError, DATE_COLUMN, VALUE_COLUMN};
pub use ingester::Ingester;

pub use geocoding::error::GeocodeError;
pub use geocoding::resolver::LocationResolver;

pub use stations::error::LocateStationError;
pub use stations::locate_station::StationLocator;

pub use types::coordinates::Coordinates;
pub use types::observation::*;
pub use types::required_data::RequiredData;
pub use types::station::*;

pub use weather_data::data_loader::WeatherDataLoader;
pub use weather_data::error::{FetchError, WeatherDataError};
pub use weather_data::fetcher::ObservationFetcher;
