//! Reports realized trip durations back to the scoring service.
//!
//! Delivery is at-least-once: `submitted_actual` flips only after a
//! successful submission, so a failed call leaves every flag unchanged and
//! the same trips are retried on the next cycle. The scoring service
//! absorbs duplicates through idempotent upserts keyed by association id.

use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;
use scoring::ScoringApi;
use uuid::Uuid;

use crate::store::TripStore;
use crate::task::Task;

const CYCLE_INTERVAL: Duration = Duration::from_secs(60 * 10);

/// One submission cycle. Returns how many actuals were submitted.
pub async fn run_cycle<S, C>(
    store: &S,
    api: &C,
) -> Result<usize, Box<dyn Error + Send + Sync>>
where
    S: TripStore,
    C: ScoringApi + Send + Sync,
{
    let pending = store.unsubmitted_actuals().await?;
    if pending.is_empty() {
        return Ok(0);
    }

    let trip_ids: Vec<Uuid> = pending.iter().map(|(trip_id, _)| *trip_id).collect();
    log::info!("actuals: submitting {} realized durations", pending.len());
    log::debug!("actuals: trip ids {:?}", trip_ids);

    // the flags are only touched after the service accepted the batch
    api.submit_actuals(&scoring::actuals_for(&pending)).await?;
    let marked = store.mark_actuals_submitted(&trip_ids).await?;

    log::info!("actuals: submitted and marked {} trips", marked);
    Ok(pending.len())
}

pub struct ActualsTask<S, C> {
    store: S,
    api: C,
}

impl<S, C> ActualsTask<S, C> {
    pub fn new(store: S, api: C) -> Self {
        Self { store, api }
    }
}

#[async_trait]
impl<S, C> Task for ActualsTask<S, C>
where
    S: TripStore + 'static,
    C: ScoringApi + Send + Sync + 'static,
{
    type Error = Box<dyn Error + Send + Sync>;

    fn name(&self) -> &'static str {
        "actuals"
    }

    async fn run(&mut self) -> Result<(), Self::Error> {
        run_cycle(&self.store, &self.api).await?;
        Ok(())
    }

    fn tick(&self) -> Duration {
        CYCLE_INTERVAL
    }
}
