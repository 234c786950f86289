//! Row types flowing through the pipeline: the raw daily observations returned by the
//! weather provider, and the single-column temperature series that gets exported.

use chrono::NaiveDate;

/// One day of Meteostat daily data.
///
/// Every measurement is optional, stations frequently miss individual fields or whole days.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailyObservation {
    pub date: NaiveDate,
    /// Average air temperature in °C.
    pub tavg: Option<f64>,
    /// Minimum air temperature in °C.
    pub tmin: Option<f64>,
    /// Maximum air temperature in °C.
    pub tmax: Option<f64>,
    /// Daily precipitation total in mm.
    pub prcp: Option<f64>,
    /// Maximum snow depth in mm.
    pub snow: Option<f64>,
    /// Average wind direction in degrees.
    pub wdir: Option<f64>,
    /// Average wind speed in km/h.
    pub wspd: Option<f64>,
    /// Peak wind gust in km/h.
    pub wpgt: Option<f64>,
    /// Average sea-level air pressure in hPa.
    pub pres: Option<f64>,
    /// Daily sunshine total in minutes.
    pub tsun: Option<f64>,
}

impl DailyObservation {
    /// An observation for `date` with every field missing.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            ..Default::default()
        }
    }

    /// Fills each missing field with the corresponding value of `other`.
    /// Present values are never overwritten.
    pub fn fill_gaps_from(&mut self, other: &DailyObservation) {
        self.tavg = self.tavg.or(other.tavg);
        self.tmin = self.tmin.or(other.tmin);
        self.tmax = self.tmax.or(other.tmax);
        self.prcp = self.prcp.or(other.prcp);
        self.snow = self.snow.or(other.snow);
        self.wdir = self.wdir.or(other.wdir);
        self.wspd = self.wspd.or(other.wspd);
        self.wpgt = self.wpgt.or(other.wpgt);
        self.pres = self.pres.or(other.pres);
        self.tsun = self.tsun.or(other.tsun);
    }
}

/// A date-ascending series with exactly one [`DailyObservation`] per calendar day
/// in `[start, end)`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use temp_ingester::ObservationSeries;
///
/// let start = NaiveDate::from_ymd_opt(2020, 12, 27).unwrap();
/// let end = NaiveDate::from_ymd_opt(2020, 12, 29).unwrap();
/// let series = ObservationSeries::spanning(start, end);
///
/// // The end date is exclusive.
/// assert_eq!(series.len(), 2);
/// assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2020, 12, 28));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationSeries {
    observations: Vec<DailyObservation>,
}

impl ObservationSeries {
    /// Creates a series of empty observations, one per day from `start` (inclusive)
    /// to `end` (exclusive). An inverted or empty range yields an empty series.
    pub fn spanning(start: NaiveDate, end: NaiveDate) -> Self {
        let observations = start
            .iter_days()
            .take_while(|date| *date < end)
            .map(DailyObservation::empty)
            .collect();
        Self { observations }
    }

    /// Merges observations from a single station into the series.
    ///
    /// Observations for dates outside the series are ignored, and only fields that are still
    /// missing get filled. Merging stations nearest-first therefore keeps, for every day and
    /// field, the value reported by the closest station that has one.
    pub fn merge(&mut self, observations: &[DailyObservation]) {
        let Some(start) = self.first_date() else {
            return;
        };
        for observation in observations {
            let offset = (observation.date - start).num_days();
            if offset < 0 {
                continue;
            }
            if let Some(slot) = self.observations.get_mut(offset as usize) {
                slot.fill_gaps_from(observation);
            }
        }
    }

    /// Number of days in the series whose average temperature is missing.
    pub fn missing_tavg(&self) -> usize {
        self.observations.iter().filter(|o| o.tavg.is_none()).count()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailyObservation> {
        self.observations.iter()
    }

    pub fn as_slice(&self) -> &[DailyObservation] {
        &self.observations
    }
}

/// One row of the exported file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    pub date: NaiveDate,
    pub tavg: Option<f64>,
}

/// The average temperature column of an [`ObservationSeries`], in date order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemperatureSeries {
    readings: Vec<TemperatureReading>,
}

impl TemperatureSeries {
    pub fn new(readings: Vec<TemperatureReading>) -> Self {
        Self { readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TemperatureReading> {
        self.readings.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, TemperatureReading> {
        self.readings.iter_mut()
    }

    pub fn first(&self) -> Option<&TemperatureReading> {
        self.readings.first()
    }

    pub fn last(&self) -> Option<&TemperatureReading> {
        self.readings.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.readings.iter().map(|r| r.date).collect()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.readings.iter().map(|r| r.tavg).collect()
    }
}

impl From<&ObservationSeries> for TemperatureSeries {
    fn from(series: &ObservationSeries) -> Self {
        Self::new(
            series
                .iter()
                .map(|o| TemperatureReading {
                    date: o.date,
                    tavg: o.tavg,
                })
                .collect(),
        )
    }
}

impl From<ObservationSeries> for TemperatureSeries {
    fn from(series: ObservationSeries) -> Self {
        Self::from(&series)
    }
}
