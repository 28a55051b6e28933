//! The prediction scheduler: SELECT, REQUEST, APPLY, every ten seconds.
//!
//! SELECT pulls unscored trips from a window ending at the last complete
//! minute boundary. The window looks back fifteen minutes rather than a
//! single one-minute slot, so a trip whose prediction silently fails to
//! come back is retried on later cycles until it ages out of the window.
//! Correlation is always through the echoed passthrough trip id; the
//! service neither preserves row order nor guarantees a row for every
//! input.

use std::collections::HashSet;
use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Timelike, Utc};
use scoring::ScoringApi;
use uuid::Uuid;

use crate::store::TripStore;
use crate::task::Task;

const CYCLE_INTERVAL: Duration = Duration::from_secs(10);
const LOOKBACK_MINUTES: i64 = 15;

/// A half-open scoring window `(begin, end]`, aligned to wall-clock minute
/// boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionWindow {
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl PredictionWindow {
    /// The window ending at the last complete minute boundary before
    /// `now`.
    pub fn ending_before(now: NaiveDateTime) -> Self {
        let end = now
            .with_second(0)
            .and_then(|now| now.with_nanosecond(0))
            .unwrap_or(now);
        Self {
            begin: end - chrono::Duration::minutes(LOOKBACK_MINUTES),
            end,
        }
    }

    pub fn contains(&self, time: NaiveDateTime) -> bool {
        time > self.begin && time <= self.end
    }
}

/// One SELECT → REQUEST → APPLY cycle. Returns how many trips gained a
/// prediction.
pub async fn run_cycle<S, C>(
    store: &S,
    api: &C,
    window: PredictionWindow,
) -> Result<usize, Box<dyn Error + Send + Sync>>
where
    S: TripStore,
    C: ScoringApi + Send + Sync,
{
    let candidates = store.unpredicted_trips_in_window(&window).await?;
    if candidates.is_empty() {
        return Ok(0);
    }

    let predictions = api.predict(&candidates).await?;

    // only apply predictions for trips this cycle asked about
    let asked: HashSet<Uuid> =
        candidates.iter().map(|features| features.trip_id).collect();
    let updates: Vec<(Uuid, f64)> = predictions
        .into_iter()
        .filter(|prediction| asked.contains(&prediction.trip_id))
        .map(|prediction| (prediction.trip_id, prediction.value))
        .collect();

    if updates.is_empty() {
        log::warn!(
            "prediction: no usable predictions for {} candidates",
            candidates.len()
        );
        return Ok(0);
    }

    let updated = store.apply_predictions(&updates).await?;
    log::info!(
        "prediction: scored {} of {} trips in ({}, {}]",
        updated,
        candidates.len(),
        window.begin,
        window.end
    );
    Ok(updated as usize)
}

pub struct PredictionTask<S, C> {
    store: S,
    api: C,
}

impl<S, C> PredictionTask<S, C> {
    pub fn new(store: S, api: C) -> Self {
        Self { store, api }
    }
}

#[async_trait]
impl<S, C> Task for PredictionTask<S, C>
where
    S: TripStore + 'static,
    C: ScoringApi + Send + Sync + 'static,
{
    type Error = Box<dyn Error + Send + Sync>;

    fn name(&self) -> &'static str {
        "prediction"
    }

    async fn run(&mut self) -> Result<(), Self::Error> {
        let window = PredictionWindow::ending_before(Utc::now().naive_utc());
        run_cycle(&self.store, &self.api, window).await?;
        Ok(())
    }

    fn tick(&self) -> Duration {
        CYCLE_INTERVAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{timestamp, FakeScoring, MemoryStore};
    use scoring::Prediction;

    #[test]
    fn window_aligns_to_the_last_complete_minute() {
        let window = PredictionWindow::ending_before(timestamp("2019-08-01 12:05:30"));
        assert_eq!(window.end, timestamp("2019-08-01 12:05:00"));
        assert_eq!(window.begin, timestamp("2019-08-01 11:50:00"));

        assert!(window.contains(timestamp("2019-08-01 12:04:59")));
        assert!(window.contains(timestamp("2019-08-01 12:05:00")));
        assert!(!window.contains(timestamp("2019-08-01 11:50:00")));
        assert!(!window.contains(timestamp("2019-08-01 12:05:01")));
    }

    #[tokio::test]
    async fn applies_only_returned_predictions() {
        let store = MemoryStore::new();
        let [a, _b, c] = store.seed_unpredicted([
            "2019-08-01 12:04:10",
            "2019-08-01 12:04:20",
            "2019-08-01 12:04:30",
        ]);

        // service answers for A and C only
        let api = FakeScoring::returning(vec![
            Prediction { trip_id: c, value: 350.0 },
            Prediction { trip_id: a, value: 410.0 },
        ]);

        let window = PredictionWindow::ending_before(timestamp("2019-08-01 12:05:30"));
        let scored = run_cycle(&store, &api, window).await.unwrap();
        assert_eq!(scored, 2);

        let trips = store.trips.lock().unwrap();
        let by_id = |id| {
            trips
                .iter()
                .find(|trip| trip.id == id)
                .unwrap()
                .predicted_trip_duration
        };
        assert_eq!(by_id(a), Some(410.0));
        assert_eq!(by_id(c), Some(350.0));
        // B stays unscored until a later cycle
        let unscored: Vec<_> = trips
            .iter()
            .filter(|trip| trip.predicted_trip_duration.is_none())
            .collect();
        assert_eq!(unscored.len(), 1);
    }

    #[tokio::test]
    async fn empty_select_is_a_no_op() {
        let store = MemoryStore::new();
        let api = FakeScoring::returning(Vec::new());

        let window = PredictionWindow::ending_before(timestamp("2019-08-01 12:05:30"));
        let scored = run_cycle(&store, &api, window).await.unwrap();
        assert_eq!(scored, 0);
        assert_eq!(api.prediction_calls(), 0);
    }

    #[tokio::test]
    async fn trips_outside_the_window_are_not_selected() {
        let store = MemoryStore::new();
        store.seed_unpredicted(["2019-08-01 11:00:00"]);

        let api = FakeScoring::returning(Vec::new());
        let window = PredictionWindow::ending_before(timestamp("2019-08-01 12:05:30"));
        run_cycle(&store, &api, window).await.unwrap();
        assert_eq!(api.prediction_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_passthrough_ids_are_ignored() {
        let store = MemoryStore::new();
        let [a] = store.seed_unpredicted(["2019-08-01 12:04:10"]);

        let api = FakeScoring::returning(vec![
            Prediction { trip_id: Uuid::new_v4(), value: 999.0 },
            Prediction { trip_id: a, value: 400.0 },
        ]);

        let window = PredictionWindow::ending_before(timestamp("2019-08-01 12:05:30"));
        let scored = run_cycle(&store, &api, window).await.unwrap();
        assert_eq!(scored, 1);
    }

    #[tokio::test]
    async fn a_prediction_is_never_overwritten() {
        let store = MemoryStore::new();
        let [a] = store.seed_unpredicted(["2019-08-01 12:04:10"]);

        let api = FakeScoring::returning(vec![Prediction {
            trip_id: a,
            value: 400.0,
        }]);
        let window = PredictionWindow::ending_before(timestamp("2019-08-01 12:05:30"));
        run_cycle(&store, &api, window).await.unwrap();

        // second cycle: the trip no longer matches the SELECT predicate
        let api = FakeScoring::returning(vec![Prediction {
            trip_id: a,
            value: 123.0,
        }]);
        run_cycle(&store, &api, window).await.unwrap();
        assert_eq!(api.prediction_calls(), 0);

        let trips = store.trips.lock().unwrap();
        assert_eq!(trips[0].predicted_trip_duration, Some(400.0));
    }
}
