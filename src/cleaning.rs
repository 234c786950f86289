use crate::types::observation::TemperatureSeries;

/// Reduces raw observations to the average temperature column and closes gaps in it.
pub struct SeriesCleaner;

impl SeriesCleaner {
    /// Projects `series` onto its `tavg` column and forward fills missing values.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use temp_ingester::{DailyObservation, ObservationSeries, SeriesCleaner};
    ///
    /// let day = |d| NaiveDate::from_ymd_opt(2020, 1, d).unwrap();
    /// let mut raw = ObservationSeries::spanning(day(1), day(4));
    /// raw.merge(&[
    ///     DailyObservation { tavg: Some(5.0), ..DailyObservation::empty(day(2)) },
    /// ]);
    ///
    /// let cleaned = SeriesCleaner::clean(&raw);
    /// assert_eq!(cleaned.values(), vec![None, Some(5.0), Some(5.0)]);
    /// ```
    pub fn clean(series: impl Into<TemperatureSeries>) -> TemperatureSeries {
        let mut temperatures = series.into();
        Self::forward_fill(&mut temperatures);
        temperatures
    }

    /// Replaces every missing value with the most recent present value before it.
    ///
    /// Leading missing values have nothing to carry forward and stay missing.
    pub fn forward_fill(series: &mut TemperatureSeries) {
        let mut last_seen = None;
        for reading in series.iter_mut() {
            match reading.tavg {
                Some(value) => last_seen = Some(value),
                None => reading.tavg = last_seen,
            }
        }
    }
}
