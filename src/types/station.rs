//! Meteostat weather station metadata as published in the `stations/lite.json.gz` index,
//! plus the `rstar` glue that lets stations live in an R-tree.

use crate::types::coordinates::Coordinates;
use crate::types::required_data::RequiredData;
use chrono::NaiveDate;
use haversine::{distance, Location as HaversineLocation, Units};
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single Meteostat weather station.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// The Meteostat station identifier (e.g. "03772" for London Heathrow).
    pub id: String,
    /// ISO country code.
    pub country: String,
    pub region: Option<String>,
    pub timezone: Option<String>,
    /// Station names keyed by language code.
    pub name: HashMap<String, String>,
    pub identifiers: Identifiers,
    pub location: Location,
    pub inventory: Inventory,
}

impl Station {
    /// The English station name, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.name.get("en").map(String::as_str).unwrap_or(&self.id)
    }

    /// Great-circle distance between the station and `coordinates`, in kilometers.
    pub fn distance_km(&self, coordinates: Coordinates) -> f64 {
        distance(
            HaversineLocation {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            },
            HaversineLocation {
                latitude: self.location.latitude,
                longitude: self.location.longitude,
            },
            Units::Kilometers,
        )
    }

    /// Whether the station's daily inventory satisfies `required`.
    pub fn has_daily_data(&self, required: RequiredData) -> bool {
        let (Some(inv_start), Some(inv_end)) =
            (self.inventory.daily.start, self.inventory.daily.end)
        else {
            return false;
        };
        match required {
            RequiredData::Any => true,
            RequiredData::DateRange { start, end } => inv_start <= start && inv_end >= end,
        }
    }
}

/// Data availability of a station per frequency.
///
/// Only `daily` is consulted by this crate; the other ranges are kept so the
/// station index deserializes losslessly.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Inventory {
    pub daily: DateRange,
    pub hourly: DateRange,
    pub model: DateRange,
    pub monthly: YearRange,
    pub normals: YearRange,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct YearRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Identifiers {
    pub national: Option<String>,
    pub wmo: Option<String>,
    pub icao: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above sea level.
    pub elevation: Option<i32>,
}

// A station is a point, so its envelope is a degenerate box.
impl RTreeObject for Station {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.latitude, self.location.longitude])
    }
}

/// Squared euclidean distance in degrees. Only used to order the R-tree walk,
/// the real distance is computed with [`Station::distance_km`].
impl PointDistance for Station {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.location.latitude - point[0];
        let dy = self.location.longitude - point[1];
        dx * dx + dy * dy
    }
}
