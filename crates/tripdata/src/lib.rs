//! Reader for trip-history CSV batches.
//!
//! Each batch file covers a fixed historical window of trips. Files are
//! discovered by directory scan and processed in filename order so the
//! importer's time-range dedup check stays stable across partially
//! completed runs.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::{error, fmt, io};

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use itertools::{Itertools, MinMaxResult};
use model::{Station, Trip};

pub mod data_model;
mod serde;

pub use data_model::RawTripRow;

#[derive(Debug)]
pub enum BatchError {
    Io(io::Error),
    Csv(csv::Error),
}

impl error::Error for BatchError {}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BatchError::Io(why) => write!(f, "batch io error: {}", why),
            BatchError::Csv(why) => write!(f, "batch csv error: {}", why),
        }
    }
}

impl From<io::Error> for BatchError {
    fn from(why: io::Error) -> Self {
        Self::Io(why)
    }
}

impl From<csv::Error> for BatchError {
    fn from(why: csv::Error) -> Self {
        Self::Csv(why)
    }
}

/// An in-memory trip batch: the rows that parsed, plus a count of rows that
/// did not.
#[derive(Debug, Clone)]
pub struct TripBatch {
    rows: Vec<RawTripRow>,
    skipped: usize,
}

impl TripBatch {
    /// Parses a batch file, dropping rows that fail to deserialize.
    pub fn read(path: &Path) -> Result<Self, BatchError> {
        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(file);
        let mut rows = Vec::new();
        let mut skipped = 0;
        for row in reader.deserialize() {
            match row {
                Ok(row) => rows.push(row),
                Err(why) => {
                    log::debug!("skipping malformed trip row: {}", why);
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            log::warn!(
                "{}: skipped {} malformed rows, kept {}",
                path.display(),
                skipped,
                rows.len()
            );
        }
        Ok(Self { rows, skipped })
    }

    pub fn from_rows(rows: Vec<RawTripRow>) -> Self {
        Self { rows, skipped: 0 }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn rows(&self) -> &[RawTripRow] {
        &self.rows
    }

    /// Inclusive range of `starttime` over the whole batch.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match self.rows.iter().map(|row| row.start_time).minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(only) => Some((only, only)),
            MinMaxResult::MinMax(first, last) => Some((first, last)),
        }
    }

    /// Stations referenced by the batch, keyed by id and grouped by first
    /// occurrence across the start and end columns. Rows without a station
    /// id, name or coordinates contribute nothing.
    pub fn stations(&self) -> IndexMap<String, Station> {
        let mut stations = IndexMap::new();
        for row in &self.rows {
            collect_station(
                &mut stations,
                &row.start_station_id,
                &row.start_station_name,
                row.start_station_latitude,
                row.start_station_longitude,
            );
            collect_station(
                &mut stations,
                &row.end_station_id,
                &row.end_station_name,
                row.end_station_latitude,
                row.end_station_longitude,
            );
        }
        stations
    }

    pub fn into_trips(self) -> Vec<Trip> {
        self.rows.into_iter().map(RawTripRow::into_trip).collect()
    }
}

fn collect_station(
    stations: &mut IndexMap<String, Station>,
    id: &Option<String>,
    name: &Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
) {
    let (Some(id), Some(name), Some(latitude), Some(longitude)) =
        (id, name, latitude, longitude)
    else {
        return;
    };
    stations.entry(id.clone()).or_insert_with(|| Station {
        id: id.clone(),
        name: name.clone(),
        latitude,
        longitude,
        region_name: None,
        capacity: None,
        has_kiosk: None,
    });
}

/// Batch files in `dir`, filtered to the `.csv` suffix and sorted by file
/// name.
pub fn batch_paths(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().map(|ext| ext == "csv").unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}
