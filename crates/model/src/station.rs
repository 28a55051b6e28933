use serde::{Deserialize, Serialize};

/// A bike-share station.
///
/// The id is the external feed id and stays the primary key for the
/// lifetime of the store. Stations are append-only: once inserted, a row is
/// never updated, even if the feed later reports different metadata.
///
/// Stations discovered inside a trip batch only carry id, name and
/// coordinates; `region_name`, `capacity` and `has_kiosk` stay empty for
/// those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub region_name: Option<String>,
    pub capacity: Option<i32>,
    pub has_kiosk: Option<bool>,
}
