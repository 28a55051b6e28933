use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rider gender as found in the trip history exports.
///
/// The exports encode gender as a numeric code. Only `0` and `1` carry a
/// defined meaning; every other value (including a missing or non-numeric
/// one) collapses to [`Gender::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => Self::Male,
            Some(1) => Self::Female,
            _ => Self::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "Male" => Self::Male,
            "Female" => Self::Female,
            _ => Self::Other,
        }
    }
}

/// A single recorded trip.
///
/// The id is generated by this system when the row is imported; the source
/// CSV's own row identity is discarded. `predicted_trip_duration` is set at
/// most once by the prediction scheduler, `submitted_actual` flips
/// false-to-true exactly once when the realized duration has been reported
/// back to the scoring service. Trips are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub trip_duration: f64,
    pub predicted_trip_duration: Option<f64>,
    pub start_station_id: Option<String>,
    pub end_station_id: Option<String>,
    pub start_time: NaiveDateTime,
    pub stop_time: NaiveDateTime,
    pub bike_id: i64,
    pub user_type: String,
    pub user_birth_year: Option<i32>,
    pub user_gender: Gender,
    pub submitted_actual: bool,
}

/// A trip joined to its start station, as selected for a prediction
/// request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripFeatures {
    pub trip_id: Uuid,
    pub start_time: NaiveDateTime,
    pub start_station_id: String,
    pub start_station_name: String,
    pub start_station_region_name: Option<String>,
    pub start_station_latitude: f64,
    pub start_station_longitude: f64,
    pub start_station_capacity: Option<i32>,
    pub start_station_has_kiosk: Option<bool>,
    pub bike_id: i64,
    pub user_type: String,
    pub user_birth_year: Option<i32>,
    pub user_gender: Gender,
}
