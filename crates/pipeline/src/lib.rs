//! The synchronization and prediction round-trip pipeline.
//!
//! Four components run against the storage layer: the station
//! synchronizer, the trip importer, the prediction scheduler and the
//! actuals submitter. The importer is a one-shot that runs to completion
//! before the periodic tasks start; the other three are supervised
//! [`task::Task`]s with independent timers. Components never share
//! in-memory state; all coordination goes through the store.

pub mod actuals;
pub mod predict;
pub mod station_sync;
pub mod store;
pub mod task;
pub mod trip_import;

#[cfg(test)]
pub(crate) mod testing;
