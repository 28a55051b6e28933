//! Storage seams of the pipeline.
//!
//! The pipeline only ever talks to an abstract store; the concrete
//! Postgres implementation lives in the `database` crate, and tests run
//! against an in-memory one. The store must provide at least
//! read-committed isolation so one task never observes another task's
//! half-written batch.

use std::collections::HashSet;
use std::{error, fmt, result};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use model::{Station, Trip, TripFeatures};
use uuid::Uuid;

use crate::predict::PredictionWindow;

#[derive(Debug)]
pub enum StoreError {
    Other(Box<dyn error::Error + Send + Sync>),
}

impl StoreError {
    pub fn other<E: error::Error + Send + Sync + 'static>(why: E) -> Self {
        Self::Other(Box::new(why))
    }
}

impl error::Error for StoreError {}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Other(why) => write!(f, "store error: {}", why),
        }
    }
}

pub type Result<T> = result::Result<T, StoreError>;

/// Station persistence. Stations are insert-only: the synchronizer never
/// updates an existing row, so there is no update operation here.
#[async_trait]
pub trait StationStore: Send + Sync {
    /// Ids of every station currently stored.
    async fn station_ids(&self) -> Result<HashSet<String>>;

    /// Inserts stations whose ids are known not to exist yet. Inserting a
    /// duplicate id is a caller bug and surfaces as an error.
    async fn insert_stations(&self, stations: &[Station]) -> Result<()>;
}

/// Trip persistence and the two post-creation mutations the pipeline
/// performs: applying a prediction and marking an actual as submitted.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Number of stored trips whose `start_time` lies in the inclusive
    /// range `[first, last]`.
    async fn count_trips_in_range(
        &self,
        first: NaiveDateTime,
        last: NaiveDateTime,
    ) -> Result<u64>;

    /// Bulk-inserts one chunk of freshly imported trips.
    async fn insert_trips(&self, trips: &[Trip]) -> Result<()>;

    /// Unscored trips inside the window, joined to their start station.
    /// Trips without a known start station cannot be scored and are not
    /// returned.
    async fn unpredicted_trips_in_window(
        &self,
        window: &PredictionWindow,
    ) -> Result<Vec<TripFeatures>>;

    /// Writes predictions back, one `(trip id, predicted duration)` pair
    /// per trip. A trip that already carries a prediction is left alone.
    /// Returns the number of rows updated.
    async fn apply_predictions(&self, predictions: &[(Uuid, f64)]) -> Result<u64>;

    /// Scored trips whose realized duration has not been reported yet, as
    /// `(trip id, actual duration)` pairs.
    async fn unsubmitted_actuals(&self) -> Result<Vec<(Uuid, f64)>>;

    /// Flips `submitted_actual` to true for the given trips. Only called
    /// after the external submission succeeded. Returns the number of rows
    /// updated.
    async fn mark_actuals_submitted(&self, trip_ids: &[Uuid]) -> Result<u64>;
}
