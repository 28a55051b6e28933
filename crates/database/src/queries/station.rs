use std::collections::HashSet;

use model::Station;
use pipeline::store::Result;
use sqlx::{Executor, Postgres};

use super::convert_error;

pub async fn ids<'c, E>(executor: E) -> Result<HashSet<String>>
where
    E: Executor<'c, Database = Postgres>,
{
    let ids: Vec<(String,)> = sqlx::query_as("SELECT id FROM stations;")
        .fetch_all(executor)
        .await
        .map_err(convert_error)?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}

pub async fn insert_all<'c, E>(executor: E, stations: &[Station]) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    super::insert_all(
        executor,
        "stations",
        &[
            "id",
            "name",
            "latitude",
            "longitude",
            "region_name",
            "capacity",
            "has_kiosk",
        ],
        stations,
        |query, station| {
            query
                .bind(station.id.clone())
                .bind(station.name.clone())
                .bind(station.latitude)
                .bind(station.longitude)
                .bind(station.region_name.clone())
                .bind(station.capacity)
                .bind(station.has_kiosk)
        },
    )
    .await
    .map_err(convert_error)?;
    Ok(())
}
