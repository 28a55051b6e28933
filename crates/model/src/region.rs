use serde::{Deserialize, Serialize};

/// A system region as published by the feed, e.g. "Boston".
///
/// Regions are reference data only. They are fetched wholesale on every
/// station fetch and denormalized into [`Station::region_name`]; they are
/// never stored on their own.
///
/// [`Station::region_name`]: crate::station::Station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
}
