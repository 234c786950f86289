//! Requirements used when checking whether a weather station has daily data
//! for the period being ingested.

use chrono::NaiveDate;

/// Specifies the criteria a station's daily inventory has to meet to be considered
/// by [`crate::StationLocator::query`].
///
/// These checks rely on the inventory metadata published by Meteostat; a station whose
/// inventory covers a period can still have gaps inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredData {
    /// The station reports *any* daily coverage (both inventory bounds are known).
    Any,

    /// The station's daily inventory fully encompasses `start..=end`.
    DateRange {
        /// The required start date (inclusive).
        start: NaiveDate,
        /// The required end date (inclusive).
        end: NaiveDate,
    },
}
