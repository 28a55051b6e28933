//! Supervised periodic tasks.
//!
//! Every periodic pipeline component implements [`Task`] and is driven by
//! [`spawn`]: run once per tick, catch errors and panics, log them, and
//! continue after an increasing backoff. A failing task never takes the
//! others down; the process lifetime is the task lifetime.

use std::fmt::Display;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{self, sleep};

#[async_trait]
pub trait Task: Send {
    type Error: Display + Send;

    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// One cycle of work. Suspends only at I/O boundaries.
    async fn run(&mut self) -> Result<(), Self::Error>;

    /// Delay between the start of consecutive cycles.
    fn tick(&self) -> Duration;

    /// Extra waiting time after a failed cycle, growing while failures
    /// persist.
    fn backoff(&self, last_backoff: Duration) -> Duration {
        last_backoff + self.tick()
    }
}

/// Runs a task forever on its own timer.
pub fn spawn<T>(mut task: T) -> JoinHandle<()>
where
    T: Task + 'static,
{
    tokio::spawn(async move {
        let mut interval = time::interval(task.tick());
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        let mut backoff = task.tick();
        loop {
            interval.tick().await;
            let result = AssertUnwindSafe(task.run()).catch_unwind().await;
            match result {
                Ok(Ok(())) => {
                    backoff = task.tick();
                }
                Ok(Err(why)) => {
                    log::error!("task '{}' failed: {}", task.name(), why);
                    backoff = task.backoff(backoff);
                    sleep(backoff).await;
                }
                Err(why) => {
                    log::error!("task '{}' panicked: {:?}", task.name(), why);
                    backoff = task.backoff(backoff);
                    sleep(backoff).await;
                }
            }
        }
    })
}
