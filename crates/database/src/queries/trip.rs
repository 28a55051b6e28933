use chrono::NaiveDateTime;
use model::{Trip, TripFeatures};
use pipeline::predict::PredictionWindow;
use pipeline::store::Result;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::data_model::trip::TripFeaturesRow;
use crate::data_model::DatabaseRow as _;

use super::convert_error;

pub async fn count_in_range<'c, E>(
    executor: E,
    first: NaiveDateTime,
    last: NaiveDateTime,
) -> Result<u64>
where
    E: Executor<'c, Database = Postgres>,
{
    let (count,): (i64,) = sqlx::query_as(
        "
        SELECT COUNT(*)
        FROM trips
        WHERE start_time >= $1 AND start_time <= $2;
        ",
    )
    .bind(first)
    .bind(last)
    .fetch_one(executor)
    .await
    .map_err(convert_error)?;
    Ok(count as u64)
}

pub async fn insert_all<'c, E>(executor: E, trips: &[Trip]) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    super::insert_all(
        executor,
        "trips",
        &[
            "id",
            "trip_duration",
            "predicted_trip_duration",
            "start_station_id",
            "end_station_id",
            "start_time",
            "stop_time",
            "bike_id",
            "user_type",
            "user_birth_year",
            "user_gender",
            "submitted_actual",
        ],
        trips,
        |query, trip| {
            query
                .bind(trip.id)
                .bind(trip.trip_duration)
                .bind(trip.predicted_trip_duration)
                .bind(trip.start_station_id.clone())
                .bind(trip.end_station_id.clone())
                .bind(trip.start_time)
                .bind(trip.stop_time)
                .bind(trip.bike_id)
                .bind(trip.user_type.clone())
                .bind(trip.user_birth_year)
                .bind(trip.user_gender.label())
                .bind(trip.submitted_actual)
        },
    )
    .await
    .map_err(convert_error)?;
    Ok(())
}

pub async fn unpredicted_in_window<'c, E>(
    executor: E,
    window: &PredictionWindow,
) -> Result<Vec<TripFeatures>>
where
    E: Executor<'c, Database = Postgres>,
{
    let rows: Vec<TripFeaturesRow> = sqlx::query_as(
        "
        SELECT
            trips.id AS trip_id,
            trips.start_time,
            stations.id AS start_station_id,
            stations.name AS start_station_name,
            stations.region_name AS start_station_region_name,
            stations.latitude AS start_station_latitude,
            stations.longitude AS start_station_longitude,
            stations.capacity AS start_station_capacity,
            stations.has_kiosk AS start_station_has_kiosk,
            trips.bike_id,
            trips.user_type,
            trips.user_birth_year,
            trips.user_gender
        FROM trips
        JOIN stations ON trips.start_station_id = stations.id
        WHERE
            trips.start_time > $1
            AND trips.start_time <= $2
            AND trips.predicted_trip_duration IS NULL
        ORDER BY trips.start_time;
        ",
    )
    .bind(window.begin)
    .bind(window.end)
    .fetch_all(executor)
    .await
    .map_err(convert_error)?;
    Ok(rows.into_iter().map(|row| row.to_model()).collect())
}

/// Writes each prediction to exactly its own trip. The `IS NULL` guard
/// keeps a prediction from ever being overwritten.
pub async fn apply_predictions<'c, E>(
    executor: E,
    predictions: &[(Uuid, f64)],
) -> Result<u64>
where
    E: Executor<'c, Database = Postgres> + Copy,
{
    let mut updated = 0;
    for (trip_id, value) in predictions {
        let result = sqlx::query(
            "
            UPDATE trips
            SET predicted_trip_duration = $2
            WHERE id = $1 AND predicted_trip_duration IS NULL;
            ",
        )
        .bind(trip_id)
        .bind(value)
        .execute(executor)
        .await
        .map_err(convert_error)?;
        updated += result.rows_affected();
    }
    Ok(updated)
}

pub async fn unsubmitted_actuals<'c, E>(executor: E) -> Result<Vec<(Uuid, f64)>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT id, trip_duration
        FROM trips
        WHERE predicted_trip_duration IS NOT NULL AND submitted_actual = FALSE;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)
}

pub async fn mark_actuals_submitted<'c, E>(
    executor: E,
    trip_ids: &[Uuid],
) -> Result<u64>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query(
        "
        UPDATE trips
        SET submitted_actual = TRUE
        WHERE id = ANY($1) AND submitted_actual = FALSE;
        ",
    )
    .bind(trip_ids)
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(result.rows_affected())
}
