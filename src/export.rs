//! Writes a [`TemperatureSeries`] to `<city>.csv` as tab separated text.

use crate::types::observation::TemperatureSeries;
use log::{debug, info};
use polars::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

/// Header of the date column.
pub const DATE_COLUMN: &str = "time";
/// Header of the temperature column.
pub const VALUE_COLUMN: &str = "tavg";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing {0}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to write CSV data for {0}")]
    Polars(PathBuf, #[source] PolarsError),

    #[error("Failed to move output into place at {0}")]
    Persist(PathBuf, #[source] tempfile::PersistError),
}

#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path the series of `city` is written to.
    ///
    /// Path separators in the city name are replaced by `_`, so the file always lands
    /// directly in the output directory.
    pub fn output_path(&self, city: &str) -> PathBuf {
        let file_stem: String = city
            .trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        self.output_dir.join(format!("{}.csv", file_stem))
    }

    /// Writes `series` to [`Self::output_path`], replacing any existing file.
    ///
    /// The data is written to a temporary file next to the target and renamed into place,
    /// so on failure the target is either untouched or absent.
    pub fn export(&self, series: &TemperatureSeries, city: &str) -> Result<PathBuf, ExportError> {
        let target = self.output_path(city);

        let mut df = to_dataframe(series).map_err(|e| ExportError::Polars(target.clone(), e))?;

        let existing_permissions = match fs::metadata(&target) {
            Ok(metadata) => Some(metadata.permissions()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(ExportError::Io(target, e)),
        };

        let mut tmp = self
            .temp_file()
            .map_err(|e| ExportError::Io(self.output_dir.clone(), e))?;
        debug!(
            "Writing {} rows to temporary file {}",
            df.height(),
            tmp.path().display()
        );

        CsvWriter::new(tmp.as_file_mut())
            .include_header(true)
            .with_separator(b'\t')
            .finish(&mut df)
            .map_err(|e| ExportError::Polars(target.clone(), e))?;

        // An overwritten file keeps its mode.
        if let Some(permissions) = existing_permissions {
            fs::set_permissions(tmp.path(), permissions)
                .map_err(|e| ExportError::Io(target.clone(), e))?;
        }

        tmp.persist(&target)
            .map_err(|e| ExportError::Persist(target.clone(), e))?;

        info!("Wrote {} rows to {}", series.len(), target.display());
        Ok(target)
    }

    /// A temporary file in the output directory, created with the mode a regular file gets
    /// under the process umask instead of the owner-only default of temporary files.
    fn temp_file(&self) -> io::Result<NamedTempFile> {
        let mut builder = Builder::new();
        builder.prefix(".").suffix(".csv.tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        builder.tempfile_in(&self.output_dir)
    }
}

fn to_dataframe(series: &TemperatureSeries) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Column::new(DATE_COLUMN.into(), series.dates()),
        Column::new(VALUE_COLUMN.into(), series.values()),
    ])
}
