use std::env;
use std::path::PathBuf;

use database::{DatabaseConnectionInfo, PgDatabase};
use feed::FeedUrls;
use pipeline::actuals::ActualsTask;
use pipeline::predict::PredictionTask;
use pipeline::station_sync::StationSyncTask;
use pipeline::{task, trip_import};
use scoring::{ScoringClient, ScoringCredentials};

#[tokio::main]
async fn main() {
    env_logger::init();

    // configuration: a partially configured process must not start
    let database_connection_info = DatabaseConnectionInfo::from_env()
        .expect("expected database connection info in env.");
    let credentials = ScoringCredentials::from_env()
        .expect("expected scoring credentials in env.");
    let feed_urls = FeedUrls::from_env();
    let trip_data_dir: PathBuf = env::var("TRIP_DATA_DIR")
        .unwrap_or_else(|_| "data".to_owned())
        .into();

    // database
    let database = PgDatabase::connect(database_connection_info)
        .await
        .expect("could not connect to database.");

    // historical backfill runs to completion before any periodic task, so
    // the prediction window never races an in-flight import
    let imported = trip_import::import_dir(&database, &trip_data_dir)
        .await
        .expect("trip import failed.");
    log::info!("backfill complete ({} trips), starting periodic tasks", imported);

    // periodic tasks, each on its own timer with its own failure handling
    let station_sync = task::spawn(StationSyncTask::new(database.clone(), feed_urls));
    let prediction = task::spawn(PredictionTask::new(
        database.clone(),
        ScoringClient::new(credentials.clone()).expect("could not build scoring client."),
    ));
    let actuals = task::spawn(ActualsTask::new(
        database,
        ScoringClient::new(credentials).expect("could not build scoring client."),
    ));

    let _ = futures::future::join3(station_sync, prediction, actuals).await;
}
