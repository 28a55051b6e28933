//! Imports trip-history CSV batches into storage.
//!
//! Import is idempotent at batch granularity: a batch whose start-time
//! range is already covered by at least as many stored trips is skipped
//! wholesale. There is no per-row dedup; the range check is a cheap guard,
//! not a content hash. Files are deleted only after a successful import, so
//! a crashed run re-scans and skips the ranges it already covered.

use std::path::Path;
use std::{error, fmt, io};

use tripdata::{BatchError, TripBatch};

use crate::station_sync;
use crate::store::{StationStore, StoreError, TripStore};

/// Rows per bulk insert.
pub const INSERT_CHUNK_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The batch's time range was already covered.
    Skipped,
    /// Number of rows inserted.
    Imported(usize),
}

#[derive(Debug)]
pub enum ImportError {
    Batch(BatchError),
    Store(StoreError),
    Io(io::Error),
}

impl error::Error for ImportError {}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImportError::Batch(why) => write!(f, "trip import: {}", why),
            ImportError::Store(why) => write!(f, "trip import: {}", why),
            ImportError::Io(why) => write!(f, "trip import: {}", why),
        }
    }
}

impl From<BatchError> for ImportError {
    fn from(why: BatchError) -> Self {
        Self::Batch(why)
    }
}

impl From<StoreError> for ImportError {
    fn from(why: StoreError) -> Self {
        Self::Store(why)
    }
}

impl From<io::Error> for ImportError {
    fn from(why: io::Error) -> Self {
        Self::Io(why)
    }
}

/// Imports one parsed batch: dedup check, then station sync for every
/// station the batch references, then chunked trip inserts.
pub async fn import_batch<S>(
    store: &S,
    batch: TripBatch,
) -> Result<ImportOutcome, ImportError>
where
    S: StationStore + TripStore,
{
    let Some((first, last)) = batch.time_range() else {
        log::info!("trip import: batch is empty, nothing to do");
        return Ok(ImportOutcome::Skipped);
    };

    let existing = store.count_trips_in_range(first, last).await?;
    if existing >= batch.len() as u64 {
        log::info!(
            "trip import: {} trips already stored in [{}, {}], skipping batch of {}",
            existing,
            first,
            last,
            batch.len()
        );
        return Ok(ImportOutcome::Skipped);
    }

    // stations referenced by the batch must exist before any trip row
    // pointing at them
    station_sync::sync(store, batch.stations()).await?;

    let trips = batch.into_trips();
    let total = trips.len();
    let mut inserted = 0;
    for chunk in trips.chunks(INSERT_CHUNK_SIZE) {
        store.insert_trips(chunk).await?;
        inserted += chunk.len();
        log::info!(
            "trip import: {}/{} rows ({:.0}%)",
            inserted,
            total,
            inserted as f64 / total as f64 * 100.0
        );
    }
    Ok(ImportOutcome::Imported(total))
}

/// Imports every `.csv` batch in `dir` in filename order, deleting each
/// file once it has been imported (or found already covered). A failing
/// batch aborts the run and leaves its file in place for retry.
pub async fn import_dir<S>(store: &S, dir: &Path) -> Result<usize, ImportError>
where
    S: StationStore + TripStore,
{
    let paths = tripdata::batch_paths(dir)?;
    log::info!(
        "trip import: discovered {} batch files in {}",
        paths.len(),
        dir.display()
    );

    let mut total = 0;
    for path in paths {
        let batch = TripBatch::read(&path)?;
        match import_batch(store, batch).await? {
            ImportOutcome::Skipped => {
                log::info!("trip import: {} skipped", path.display());
            }
            ImportOutcome::Imported(count) => {
                log::info!("trip import: {} imported {} rows", path.display(), count);
                total += count;
            }
        }
        std::fs::remove_file(&path)?;
    }

    log::info!("trip import: done, {} rows imported", total);
    Ok(total)
}
