use chrono::NaiveDateTime;
use model::{Gender, TripFeatures};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use super::DatabaseRow;

/// The trip-joined-to-start-station row the prediction scheduler selects.
#[derive(Debug, Clone, FromRow)]
pub struct TripFeaturesRow {
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
    pub user_gender: String,
}

impl DatabaseRow for TripFeaturesRow {
    type Model = TripFeatures;

    fn to_model(self) -> Self::Model {
        TripFeatures {
            trip_id: self.trip_id,
            start_time: self.start_time,
            start_station_id: self.start_station_id,
            start_station_name: self.start_station_name,
            start_station_region_name: self.start_station_region_name,
            start_station_latitude: self.start_station_latitude,
            start_station_longitude: self.start_station_longitude,
            start_station_capacity: self.start_station_capacity,
            start_station_has_kiosk: self.start_station_has_kiosk,
            bike_id: self.bike_id,
            user_type: self.user_type,
            user_birth_year: self.user_birth_year,
            user_gender: Gender::from_label(&self.user_gender),
        }
    }
}
