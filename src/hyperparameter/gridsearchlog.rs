use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_derive::Serialize;

use crate::error::Result;

/// One evaluated hyperparameter combination.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct GridSearchRecord {
    pub iteration: usize,
    pub alpha: f64,
    pub beta: f64,
    pub neighborhood_size_k: usize,
    pub recall: f64,
}

/// Writes grid search records as CSV rows, with a header taken from the
/// field names of the first record.
pub struct GridSearchLog<W: Write> {
    wtr: csv::Writer<W>,
}

impl GridSearchLog<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(GridSearchLog {
            wtr: csv::Writer::from_path(path)?,
        })
    }
}

impl<W: Write> GridSearchLog<W> {
    pub fn from_writer(writer: W) -> Self {
        GridSearchLog {
            wtr: csv::Writer::from_writer(writer),
        }
    }

    pub fn write(&mut self, record: &GridSearchRecord) -> Result<()> {
        self.wtr.serialize(record)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }

    /// Flushes and hands back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.wtr
            .into_inner()
            .map_err(|err| err.into_error().into())
    }
}
