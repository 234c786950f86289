//! Parsing and defaults for the ingestion date range.

use chrono::{Days, Local, NaiveDate};
use thiserror::Error;

/// Accepted input format; chrono also accepts unpadded months and days (`2011-3-2`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
#[error("Invalid date '{input}', expected YYYY-MM-DD")]
pub struct InvalidDateFormat {
    pub input: String,
    /// `None` when the text was rejected before reaching chrono.
    #[source]
    pub source: Option<chrono::ParseError>,
}

pub struct DateNormalizer;

impl DateNormalizer {
    pub fn parse(text: &str) -> Result<NaiveDate, InvalidDateFormat> {
        // chrono skips whitespace and accepts a sign before numeric fields.
        let plain = text.starts_with(|c: char| c.is_ascii_digit())
            && text.chars().all(|c| c.is_ascii_digit() || c == '-');
        if !plain {
            return Err(InvalidDateFormat {
                input: text.to_string(),
                source: None,
            });
        }
        NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|source| InvalidDateFormat {
            input: text.to_string(),
            source: Some(source),
        })
    }

    /// First day of the default range, 2010-01-01.
    pub fn default_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default()
    }

    /// Yesterday according to the local clock.
    ///
    /// Meteostat lags about two days behind, and the end of the range is exclusive,
    /// so yesterday is the latest useful end.
    pub fn default_end() -> NaiveDate {
        Self::default_end_from(Local::now().date_naive())
    }

    pub fn default_end_from(today: NaiveDate) -> NaiveDate {
        today.checked_sub_days(Days::new(1)).unwrap_or(today)
    }
}
