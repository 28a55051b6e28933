use chrono::NaiveDateTime;
use model::{Gender, Trip};
use serde::Deserialize;
use uuid::Uuid;

use crate::serde::{gender_code, optional_float, optional_int, optional_string, timestamp};

/// One row of a trip history export, under the fixed column header the
/// batch provider uses.
///
/// Station columns may be empty when the station is unknown; birth year may
/// be empty or `\N`. Those become `None` rather than rejecting the row.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTripRow {
    #[serde(rename = "tripduration")]
    pub trip_duration: f64,
    #[serde(rename = "starttime", deserialize_with = "timestamp")]
    pub start_time: NaiveDateTime,
    #[serde(rename = "stoptime", deserialize_with = "timestamp")]
    pub stop_time: NaiveDateTime,
    #[serde(rename = "start station id", deserialize_with = "optional_string")]
    pub start_station_id: Option<String>,
    #[serde(rename = "start station name", deserialize_with = "optional_string")]
    pub start_station_name: Option<String>,
    #[serde(rename = "start station latitude", deserialize_with = "optional_float")]
    pub start_station_latitude: Option<f64>,
    #[serde(rename = "start station longitude", deserialize_with = "optional_float")]
    pub start_station_longitude: Option<f64>,
    #[serde(rename = "end station id", deserialize_with = "optional_string")]
    pub end_station_id: Option<String>,
    #[serde(rename = "end station name", deserialize_with = "optional_string")]
    pub end_station_name: Option<String>,
    #[serde(rename = "end station latitude", deserialize_with = "optional_float")]
    pub end_station_latitude: Option<f64>,
    #[serde(rename = "end station longitude", deserialize_with = "optional_float")]
    pub end_station_longitude: Option<f64>,
    #[serde(rename = "bikeid")]
    pub bike_id: i64,
    #[serde(rename = "usertype")]
    pub user_type: String,
    #[serde(rename = "birth year", deserialize_with = "optional_int")]
    pub user_birth_year: Option<i32>,
    #[serde(rename = "gender", deserialize_with = "gender_code")]
    pub user_gender: Gender,
}

impl RawTripRow {
    /// Converts the row into a storable trip with a freshly generated id.
    /// The export's own row identity is discarded.
    pub fn into_trip(self) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            trip_duration: self.trip_duration,
            predicted_trip_duration: None,
            start_station_id: self.start_station_id,
            end_station_id: self.end_station_id,
            start_time: self.start_time,
            stop_time: self.stop_time,
            bike_id: self.bike_id,
            user_type: self.user_type,
            user_birth_year: self.user_birth_year,
            user_gender: self.user_gender,
            submitted_actual: false,
        }
    }
}
