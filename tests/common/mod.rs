#![allow(dead_code)]

use async_compression::tokio::bufread::GzipEncoder;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::path::Path;
use temp_ingester::IngesterConfig;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mocked Nominatim + Meteostat bulk endpoint with scratch cache and output directories.
pub struct Provider {
    pub server: MockServer,
    pub cache_dir: TempDir,
    pub output_dir: TempDir,
}

impl Provider {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            cache_dir: tempfile::tempdir().unwrap(),
            output_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn config(&self) -> IngesterConfig {
        IngesterConfig::builder()
            .geocoder_url(self.server.uri())
            .meteostat_url(self.server.uri())
            .cache_dir(self.cache_dir.path())
            .output_dir(self.output_dir.path())
            .build()
    }

    pub fn output_files(&self) -> Vec<String> {
        list_files(self.output_dir.path())
    }

    pub async fn mount_city(&self, city: &str, latitude: f64, longitude: f64) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", city))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "lat": latitude.to_string(),
                "lon": longitude.to_string(),
                "display_name": city,
            }])))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_unknown_city(&self, city: &str) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", city))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_stations(&self, stations: Vec<Value>) {
        self.stations_mock(stations).await.mount(&self.server).await;
    }

    pub async fn mount_stations_expecting(&self, stations: Vec<Value>, times: u64) {
        self.stations_mock(stations)
            .await
            .expect(times)
            .mount(&self.server)
            .await;
    }

    async fn stations_mock(&self, stations: Vec<Value>) -> Mock {
        let body = gzip(Value::Array(stations).to_string().as_bytes()).await;
        Mock::given(method("GET"))
            .and(path("/stations/lite.json.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
    }

    pub async fn mount_daily(&self, station: &str, csv: String) {
        self.daily_mock(station, csv).await.mount(&self.server).await;
    }

    pub async fn mount_daily_expecting(&self, station: &str, csv: String, times: u64) {
        self.daily_mock(station, csv)
            .await
            .expect(times)
            .mount(&self.server)
            .await;
    }

    async fn daily_mock(&self, station: &str, csv: String) -> Mock {
        let body = gzip(csv.as_bytes()).await;
        Mock::given(method("GET"))
            .and(path(format!("/daily/{}.csv.gz", station)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
    }

    pub async fn mount_daily_missing(&self, station: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/daily/{}.csv.gz", station)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&self.server)
            .await;
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A station entry of the Meteostat `lite` index with daily data from 2000 until 2099.
pub fn station(id: &str, name: &str, latitude: f64, longitude: f64) -> Value {
    json!({
        "id": id,
        "name": { "en": name },
        "country": "GB",
        "region": "ENG",
        "identifiers": { "national": null, "wmo": id, "icao": null },
        "location": { "latitude": latitude, "longitude": longitude, "elevation": 50 },
        "timezone": "Europe/London",
        "inventory": {
            "model": { "start": null, "end": null },
            "hourly": { "start": null, "end": null },
            "daily": { "start": "2000-01-01", "end": "2099-12-31" },
            "monthly": { "start": 2000, "end": 2099 },
            "normals": { "start": null, "end": null }
        }
    })
}

/// Header-less Meteostat daily CSV for `[start, end)`, with `tavg` taken from `tavg` and
/// a fixed `tmin` so the frame has more than one populated column.
pub fn daily_csv(start: NaiveDate, end: NaiveDate, tavg: impl Fn(NaiveDate) -> Option<f64>) -> String {
    start
        .iter_days()
        .take_while(|date| *date < end)
        .map(|date| {
            let value = tavg(date).map(|v| v.to_string()).unwrap_or_default();
            format!("{},{},-2.5,,,,,,,,\n", date.format("%Y-%m-%d"), value)
        })
        .collect()
}

pub async fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzipEncoder::new(data);
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await.unwrap();
    compressed
}

pub fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Parses an exported file into `(date, tavg)` rows, asserting the header.
pub fn read_export(file: &Path) -> Vec<(NaiveDate, Option<f64>)> {
    let content = std::fs::read_to_string(file).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("time\ttavg"));
    lines
        .map(|line| {
            let (date, value) = line.split_once('\t').expect("tab separated row");
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
            let value = (!value.is_empty()).then(|| value.parse::<f64>().unwrap());
            (date, value)
        })
        .collect()
}
