//! Reader for the live station/region feed.
//!
//! The feed serves two read-only JSON endpoints, each wrapped in a
//! `{"data": {...}}` envelope. Individual records are decoded one by one so
//! that a single malformed record is dropped instead of failing the whole
//! fetch.

use std::collections::HashMap;
use std::{env, error, fmt};

use indexmap::IndexMap;
use model::{Region, Station};
use serde::Deserialize;
use serde_json::Value;

pub mod sources {
    /// Station metadata of the Boston "Bluebikes" system.
    pub const BLUEBIKES_STATION_INFORMATION: &str =
        "https://gbfs.bluebikes.com/gbfs/en/station_information.json";

    /// Region list of the Boston "Bluebikes" system.
    pub const BLUEBIKES_SYSTEM_REGIONS: &str =
        "https://gbfs.bluebikes.com/gbfs/en/system_regions.json";
}

#[derive(Debug)]
pub enum FeedError {
    Request(reqwest::Error),
}

impl error::Error for FeedError {}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FeedError::Request(why) => write!(f, "feed request error: {}", why),
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(why: reqwest::Error) -> Self {
        Self::Request(why)
    }
}

/// The two feed endpoints, overridable through the environment.
#[derive(Debug, Clone)]
pub struct FeedUrls {
    pub station_information: String,
    pub system_regions: String,
}

impl FeedUrls {
    pub fn from_env() -> Self {
        Self {
            station_information: env::var("STATION_INFORMATION_URL")
                .unwrap_or_else(|_| sources::BLUEBIKES_STATION_INFORMATION.to_owned()),
            system_regions: env::var("SYSTEM_REGIONS_URL")
                .unwrap_or_else(|_| sources::BLUEBIKES_SYSTEM_REGIONS.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Response<T> {
    data: T,
}

#[derive(Debug, Clone, Deserialize)]
struct RegionList {
    regions: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct StationList {
    stations: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct RegionRecord {
    #[serde(deserialize_with = "lenient_string")]
    region_id: String,
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct StationRecord {
    station_id: String,
    name: String,
    #[serde(rename = "lat")]
    latitude: f64,
    #[serde(rename = "lon")]
    longitude: f64,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    region_id: Option<String>,
    capacity: Option<i32>,
    has_kiosk: Option<bool>,
}

/// Region and station ids appear both as JSON strings and as numbers in the
/// wild, depending on the feed operator.
fn lenient_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    match value {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn lenient_optional_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn parse_regions(list: RegionList) -> HashMap<String, Region> {
    let total = list.regions.len();
    let regions: HashMap<String, Region> = list
        .regions
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RegionRecord>(value).ok())
        .map(|record| {
            let region = Region {
                id: record.region_id,
                name: record.name,
            };
            (region.id.clone(), region)
        })
        .collect();
    if regions.len() < total {
        log::debug!("skipped {} malformed region records", total - regions.len());
    }
    regions
}

fn parse_stations(
    list: StationList,
    regions: &HashMap<String, Region>,
) -> IndexMap<String, Station> {
    let total = list.stations.len();
    let stations: IndexMap<String, Station> = list
        .stations
        .into_iter()
        .filter_map(|value| serde_json::from_value::<StationRecord>(value).ok())
        .map(|record| {
            let region_name = record
                .region_id
                .as_ref()
                .and_then(|id| regions.get(id))
                .map(|region| region.name.clone());
            (
                record.station_id.clone(),
                Station {
                    id: record.station_id,
                    name: record.name,
                    latitude: record.latitude,
                    longitude: record.longitude,
                    region_name,
                    capacity: record.capacity,
                    has_kiosk: record.has_kiosk,
                },
            )
        })
        .collect();
    if stations.len() < total {
        log::debug!(
            "skipped {} malformed station records",
            total - stations.len()
        );
    }
    stations
}

/// Fetches the region list, keyed by region id.
pub async fn fetch_regions(
    client: &reqwest::Client,
    url: &str,
) -> Result<HashMap<String, Region>, FeedError> {
    let response: Response<RegionList> =
        client.get(url).send().await?.error_for_status()?.json().await?;
    Ok(parse_regions(response.data))
}

/// Fetches the station list, denormalizing region names into each station.
pub async fn fetch_stations(
    client: &reqwest::Client,
    url: &str,
    regions: &HashMap<String, Region>,
) -> Result<IndexMap<String, Station>, FeedError> {
    let response: Response<StationList> =
        client.get(url).send().await?.error_for_status()?.json().await?;
    Ok(parse_stations(response.data, regions))
}

/// Fetches regions and stations in one go, keyed by external station id and
/// ordered as published by the feed.
pub async fn fetch_station_directory(
    client: &reqwest::Client,
    urls: &FeedUrls,
) -> Result<IndexMap<String, Station>, FeedError> {
    let regions = fetch_regions(client, &urls.system_regions).await?;
    fetch_stations(client, &urls.station_information, &regions).await
}
