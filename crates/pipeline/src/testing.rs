//! In-memory store and scripted scoring service for pipeline tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use model::{Gender, Station, Trip, TripFeatures};
use scoring::{Actual, Prediction, ScoringApi, ScoringError};
use tripdata::RawTripRow;
use uuid::Uuid;

use crate::predict::PredictionWindow;
use crate::store::{Result, StationStore, StoreError, TripStore};

pub(crate) fn timestamp(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").unwrap()
}

/// Raw batch rows one minute apart, all between stations 107 and 191.
pub(crate) fn rows_starting_each_minute(count: usize) -> Vec<RawTripRow> {
    let base = timestamp("2019-08-01 00:00:00");
    (0..count)
        .map(|index| {
            let start_time = base + chrono::Duration::minutes(index as i64);
            RawTripRow {
                trip_duration: 372.0,
                start_time,
                stop_time: start_time + chrono::Duration::seconds(372),
                start_station_id: Some("107".to_owned()),
                start_station_name: Some("Ames St at Main St".to_owned()),
                start_station_latitude: Some(42.3625),
                start_station_longitude: Some(-71.0881),
                end_station_id: Some("191".to_owned()),
                end_station_name: Some("Beacon St at Mass Ave".to_owned()),
                end_station_latitude: Some(42.3508),
                end_station_longitude: Some(-71.0901),
                bike_id: 3768,
                user_type: "Subscriber".to_owned(),
                user_birth_year: Some(1989),
                user_gender: Gender::Female,
            }
        })
        .collect()
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub stations: Mutex<IndexMap<String, Station>>,
    pub trips: Mutex<Vec<Trip>>,
    pub station_insert_batches: Mutex<Vec<usize>>,
    pub trip_insert_batches: Mutex<Vec<usize>>,
    /// When set, every trip insert is rejected with a store error.
    pub fail_trip_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn seed_station(&self) {
        self.stations
            .lock()
            .unwrap()
            .entry("107".to_owned())
            .or_insert_with(|| Station {
                id: "107".to_owned(),
                name: "Ames St at Main St".to_owned(),
                latitude: 42.3625,
                longitude: -71.0881,
                region_name: Some("Boston".to_owned()),
                capacity: Some(19),
                has_kiosk: Some(true),
            });
    }

    fn seed_trips<const N: usize>(
        &self,
        start_times: [&str; N],
        predicted: Option<f64>,
    ) -> [Uuid; N] {
        self.seed_station();
        let mut trips = self.trips.lock().unwrap();
        start_times.map(|start_time| {
            let start_time = timestamp(start_time);
            let trip = Trip {
                id: Uuid::new_v4(),
                trip_duration: 372.0,
                predicted_trip_duration: predicted,
                start_station_id: Some("107".to_owned()),
                end_station_id: None,
                start_time,
                stop_time: start_time + chrono::Duration::seconds(372),
                bike_id: 3768,
                user_type: "Subscriber".to_owned(),
                user_birth_year: Some(1989),
                user_gender: Gender::Female,
                submitted_actual: false,
            };
            let id = trip.id;
            trips.push(trip);
            id
        })
    }

    /// Seeds unscored trips at the given start times.
    pub fn seed_unpredicted<const N: usize>(
        &self,
        start_times: [&str; N],
    ) -> [Uuid; N] {
        self.seed_trips(start_times, None)
    }

    /// Seeds scored trips whose actuals are still unsubmitted.
    pub fn seed_predicted<const N: usize>(&self, start_times: [&str; N]) -> [Uuid; N] {
        self.seed_trips(start_times, Some(400.0))
    }
}

#[async_trait]
impl StationStore for MemoryStore {
    async fn station_ids(&self) -> Result<HashSet<String>> {
        Ok(self.stations.lock().unwrap().keys().cloned().collect())
    }

    async fn insert_stations(&self, stations: &[Station]) -> Result<()> {
        self.station_insert_batches
            .lock()
            .unwrap()
            .push(stations.len());
        let mut stored = self.stations.lock().unwrap();
        for station in stations {
            if stored.contains_key(&station.id) {
                return Err(StoreError::Other(
                    format!("duplicate station id {}", station.id).into(),
                ));
            }
            stored.insert(station.id.clone(), station.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl TripStore for MemoryStore {
    async fn count_trips_in_range(
        &self,
        first: NaiveDateTime,
        last: NaiveDateTime,
    ) -> Result<u64> {
        let count = self
            .trips
            .lock()
            .unwrap()
            .iter()
            .filter(|trip| trip.start_time >= first && trip.start_time <= last)
            .count();
        Ok(count as u64)
    }

    async fn insert_trips(&self, trips: &[Trip]) -> Result<()> {
        if self.fail_trip_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Other("trip insert rejected".into()));
        }
        self.trip_insert_batches.lock().unwrap().push(trips.len());
        self.trips.lock().unwrap().extend_from_slice(trips);
        Ok(())
    }

    async fn unpredicted_trips_in_window(
        &self,
        window: &PredictionWindow,
    ) -> Result<Vec<TripFeatures>> {
        let stations = self.stations.lock().unwrap();
        let features = self
            .trips
            .lock()
            .unwrap()
            .iter()
            .filter(|trip| {
                trip.predicted_trip_duration.is_none()
                    && window.contains(trip.start_time)
            })
            .filter_map(|trip| {
                let station_id = trip.start_station_id.as_ref()?;
                let station = stations.get(station_id)?;
                Some(TripFeatures {
                    trip_id: trip.id,
                    start_time: trip.start_time,
                    start_station_id: station.id.clone(),
                    start_station_name: station.name.clone(),
                    start_station_region_name: station.region_name.clone(),
                    start_station_latitude: station.latitude,
                    start_station_longitude: station.longitude,
                    start_station_capacity: station.capacity,
                    start_station_has_kiosk: station.has_kiosk,
                    bike_id: trip.bike_id,
                    user_type: trip.user_type.clone(),
                    user_birth_year: trip.user_birth_year,
                    user_gender: trip.user_gender,
                })
            })
            .collect();
        Ok(features)
    }

    async fn apply_predictions(&self, predictions: &[(Uuid, f64)]) -> Result<u64> {
        let mut trips = self.trips.lock().unwrap();
        let mut updated = 0;
        for (trip_id, value) in predictions {
            let scored = trips.iter_mut().find(|trip| {
                trip.id == *trip_id && trip.predicted_trip_duration.is_none()
            });
            if let Some(trip) = scored {
                trip.predicted_trip_duration = Some(*value);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn unsubmitted_actuals(&self) -> Result<Vec<(Uuid, f64)>> {
        let pending = self
            .trips
            .lock()
            .unwrap()
            .iter()
            .filter(|trip| {
                trip.predicted_trip_duration.is_some() && !trip.submitted_actual
            })
            .map(|trip| (trip.id, trip.trip_duration))
            .collect();
        Ok(pending)
    }

    async fn mark_actuals_submitted(&self, trip_ids: &[Uuid]) -> Result<u64> {
        let mut trips = self.trips.lock().unwrap();
        let mut updated = 0;
        for trip_id in trip_ids {
            let pending = trips
                .iter_mut()
                .find(|trip| trip.id == *trip_id && !trip.submitted_actual);
            if let Some(trip) = pending {
                trip.submitted_actual = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

pub(crate) struct FakeScoring {
    predictions: Vec<Prediction>,
    fail_actuals: bool,
    predict_calls: AtomicUsize,
    actuals: Mutex<Vec<Vec<Actual>>>,
}

impl FakeScoring {
    /// Answers every prediction request with the given records.
    pub fn returning(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions,
            fail_actuals: false,
            predict_calls: AtomicUsize::new(0),
            actuals: Mutex::new(Vec::new()),
        }
    }

    /// Rejects every actuals submission with a non-2xx response.
    pub fn failing_actuals() -> Self {
        Self {
            predictions: Vec::new(),
            fail_actuals: true,
            predict_calls: AtomicUsize::new(0),
            actuals: Mutex::new(Vec::new()),
        }
    }

    pub fn prediction_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }

    pub fn actuals_calls(&self) -> usize {
        self.actuals.lock().unwrap().len()
    }

    pub fn submitted_actuals(&self) -> Vec<Actual> {
        self.actuals.lock().unwrap().concat()
    }
}

#[async_trait]
impl ScoringApi for FakeScoring {
    async fn predict(
        &self,
        _rows: &[TripFeatures],
    ) -> std::result::Result<Vec<Prediction>, ScoringError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.predictions.clone())
    }

    async fn submit_actuals(
        &self,
        actuals: &[Actual],
    ) -> std::result::Result<(), ScoringError> {
        if self.fail_actuals {
            return Err(ScoringError::InvalidResponse {
                status_code: reqwest::StatusCode::BAD_GATEWAY,
                response: None,
            });
        }
        self.actuals.lock().unwrap().push(actuals.to_vec());
        Ok(())
    }
}
