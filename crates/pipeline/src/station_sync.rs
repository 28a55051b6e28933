//! Reconciles fetched stations against stored stations.
//!
//! The synchronizer is insert-only: a station id seen before is never
//! touched again, even if the feed reports changed metadata. It runs daily
//! against the live feed, and once synchronously for the stations
//! referenced by a trip batch before that batch's trips are inserted.

use std::collections::HashSet;
use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;
use feed::FeedUrls;
use indexmap::IndexMap;
use model::Station;

use crate::store::{self, StationStore};
use crate::task::Task;

const SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);

/// Stations per bulk insert, keeping each statement below the bind
/// parameter limit of the store.
const INSERT_CHUNK_SIZE: usize = 1000;

/// Fetched stations whose ids are not yet stored, in feed order.
pub fn new_stations(
    existing: &HashSet<String>,
    fetched: IndexMap<String, Station>,
) -> Vec<Station> {
    fetched
        .into_iter()
        .filter(|(id, _)| !existing.contains(id))
        .map(|(_, station)| station)
        .collect()
}

/// Inserts every fetched station that is not stored yet and returns how
/// many were inserted.
pub async fn sync<S>(
    store: &S,
    fetched: IndexMap<String, Station>,
) -> store::Result<usize>
where
    S: StationStore,
{
    let existing = store.station_ids().await?;
    let stations = new_stations(&existing, fetched);
    if stations.is_empty() {
        log::info!("station sync: no new stations");
        return Ok(0);
    }

    for chunk in stations.chunks(INSERT_CHUNK_SIZE) {
        store.insert_stations(chunk).await?;
    }
    let ids: Vec<&str> = stations.iter().map(|station| station.id.as_str()).collect();
    log::info!(
        "station sync: inserted {} new stations: {}",
        stations.len(),
        ids.join(", ")
    );
    Ok(stations.len())
}

/// Daily re-sync against the live station feed.
pub struct StationSyncTask<S> {
    store: S,
    urls: FeedUrls,
    http: reqwest::Client,
}

impl<S> StationSyncTask<S> {
    pub fn new(store: S, urls: FeedUrls) -> Self {
        Self {
            store,
            urls,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl<S> Task for StationSyncTask<S>
where
    S: StationStore + 'static,
{
    type Error = Box<dyn Error + Send + Sync>;

    fn name(&self) -> &'static str {
        "station sync"
    }

    async fn run(&mut self) -> Result<(), Self::Error> {
        let fetched = feed::fetch_station_directory(&self.http, &self.urls).await?;
        sync(&self.store, fetched).await?;
        Ok(())
    }

    fn tick(&self) -> Duration {
        SYNC_INTERVAL
    }
}
