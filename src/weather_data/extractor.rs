use crate::types::observation::DailyObservation;
use crate::weather_data::error::WeatherDataError;
use chrono::NaiveDate;
use polars::prelude::*;

fn get_column<'a>(
    df: &'a DataFrame,
    name: &str,
    station: &str,
) -> Result<&'a Column, WeatherDataError> {
    df.column(name)
        .map_err(|e| WeatherDataError::MissingColumnError {
            station: station.to_string(),
            column: name.to_string(),
            source: e,
        })
}

fn get_floats(
    df: &DataFrame,
    name: &str,
    station: &str,
) -> Result<Vec<Option<f64>>, WeatherDataError> {
    let column = get_column(df, name, station)?;
    let values = column
        .f64()
        .map_err(|e| WeatherDataError::PolarsError {
            station: station.to_string(),
            source: e,
        })?;
    Ok(values.into_iter().collect())
}

/// Collects the rows of a station's daily frame with `start <= date < end`.
pub fn extract_daily_observations(
    frame: LazyFrame,
    station: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyObservation>, WeatherDataError> {
    let df = frame
        .filter(col("date").gt_eq(lit(start)).and(col("date").lt(lit(end))))
        .collect()
        .map_err(|e| WeatherDataError::PolarsError {
            station: station.to_string(),
            source: e,
        })?;

    let dates: Vec<Option<NaiveDate>> = get_column(&df, "date", station)?
        .as_materialized_series()
        .date()
        .map_err(|e| WeatherDataError::PolarsError {
            station: station.to_string(),
            source: e,
        })?
        .as_date_iter()
        .collect();

    let tavg = get_floats(&df, "tavg", station)?;
    let tmin = get_floats(&df, "tmin", station)?;
    let tmax = get_floats(&df, "tmax", station)?;
    let prcp = get_floats(&df, "prcp", station)?;
    let snow = get_floats(&df, "snow", station)?;
    let wdir = get_floats(&df, "wdir", station)?;
    let wspd = get_floats(&df, "wspd", station)?;
    let wpgt = get_floats(&df, "wpgt", station)?;
    let pres = get_floats(&df, "pres", station)?;
    let tsun = get_floats(&df, "tsun", station)?;

    Ok(dates
        .into_iter()
        .enumerate()
        .filter_map(|(i, date)| {
            Some(DailyObservation {
                date: date?,
                tavg: tavg[i],
                tmin: tmin[i],
                tmax: tmax[i],
                prcp: prcp[i],
                snow: snow[i],
                wdir: wdir[i],
                wspd: wspd[i],
                wpgt: wpgt[i],
                pres: pres[i],
                tsun: tsun[i],
            })
        })
        .collect())
}
