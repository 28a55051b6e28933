use chrono::NaiveDateTime;
use model::TripFeatures;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Timestamp format the deployed model was trained on.
const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One row of a prediction request. `trip_id` is echoed back by the
/// service as a passthrough value and is the only way responses are
/// correlated to requests.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRow {
    pub trip_id: Uuid,
    pub start_time: String,
    pub start_station_id: String,
    pub start_station_name: String,
    pub start_station_region_name: Option<String>,
    pub start_station_latitude: f64,
    pub start_station_longitude: f64,
    pub station_capacity: Option<i32>,
    pub station_has_kiosk: Option<bool>,
    pub bike_id: i64,
    pub user_type: String,
    pub birth_year: Option<i32>,
    pub gender: &'static str,
}

impl From<&TripFeatures> for PredictionRow {
    fn from(features: &TripFeatures) -> Self {
        Self {
            trip_id: features.trip_id,
            start_time: format_start_time(features.start_time),
            start_station_id: features.start_station_id.clone(),
            start_station_name: features.start_station_name.clone(),
            start_station_region_name: features.start_station_region_name.clone(),
            start_station_latitude: features.start_station_latitude,
            start_station_longitude: features.start_station_longitude,
            station_capacity: features.start_station_capacity,
            station_has_kiosk: features.start_station_has_kiosk,
            bike_id: features.bike_id,
            user_type: features.user_type.clone(),
            birth_year: features.user_birth_year,
            gender: features.user_gender.label(),
        }
    }
}

pub(crate) fn format_start_time(start_time: NaiveDateTime) -> String {
    start_time.format(START_TIME_FORMAT).to_string()
}

/// A prediction correlated back to its trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub trip_id: Uuid,
    pub value: f64,
}

/// An actual (realized) trip duration, keyed by the id the prediction was
/// associated with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Actual {
    pub association_id: Uuid,
    pub actual_value: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PredictionResponse {
    #[serde(default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct PredictionRecord {
    #[serde(rename = "passthroughValues")]
    passthrough_values: PassthroughValues,
    prediction: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct PassthroughValues {
    trip_id: Uuid,
}

impl PredictionResponse {
    /// Decodes each returned record on its own; records without a usable
    /// passthrough id or prediction are dropped with a log line.
    pub fn into_predictions(self) -> Vec<Prediction> {
        let total = self.data.len();
        let predictions: Vec<Prediction> = self
            .data
            .into_iter()
            .filter_map(|value| {
                serde_json::from_value::<PredictionRecord>(value).ok()
            })
            .map(|record| Prediction {
                trip_id: record.passthrough_values.trip_id,
                value: record.prediction,
            })
            .collect();
        if predictions.len() < total {
            log::warn!(
                "dropped {} uncorrelatable prediction records",
                total - predictions.len()
            );
        }
        predictions
    }
}
