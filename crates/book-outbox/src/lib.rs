//! The outbox relay worker (§4.8). Ticks on an interval, fans out
//! `count_workers` concurrent claimers per tick, and never starts a new
//! tick before the previous one's workers have all finished — the same
//! "no overlapping ticks" backpressure the daemon's heartbeat ticker uses.

use book_db::{book_store, event_store};
use book_publisher::EventPublisher;
use book_schemas::{error::Kind, BookEvent};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub struct OutboxProcessor {
    pool: PgPool,
    publisher: Arc<dyn EventPublisher>,
    interval: Duration,
    batch_size: i64,
    count_workers: usize,
}

impl OutboxProcessor {
    pub fn new(
        pool: PgPool,
        publisher: Arc<dyn EventPublisher>,
        interval: Duration,
        batch_size: i64,
        count_workers: usize,
    ) -> Self {
        Self {
            pool,
            publisher,
            interval,
            batch_size,
            count_workers: count_workers.max(1),
        }
    }

    /// Run until `shutdown` fires. Unlocks every row still `LOCK` before the
    /// first tick (§9 MUST) — that state only exists if a previous process
    /// died mid-claim, and nothing else in this process could have put rows
    /// in `LOCK` yet. A tick-time failure (anything other than an idle
    /// claim) propagates out of `run` so the supervisor sees it and
    /// restarts the process (§4.8 item 4, §7) — it is not swallowed here.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) -> anyhow::Result<()> {
        let unlocked = event_store::unlock_all(&self.pool)
            .await
            .map_err(|e| e.context("outbox_processor.run: startup unlock sweep"))?;
        if unlocked > 0 {
            tracing::warn!(count = unlocked, "unlocked stale LOCK rows from a previous run");
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once().await?;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("outbox processor shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// One tick: fan out `count_workers` claimers, each draining the
    /// backlog in a tight claim/publish/settle loop until it claims nothing
    /// (so a single slow tick does not leave work for the next one to pile
    /// on top of). Returns the first worker error encountered, if any —
    /// a worker failure is fatal for the tick and propagates to `run`.
    async fn run_once(&self) -> anyhow::Result<()> {
        let handles: Vec<_> = (0..self.count_workers)
            .map(|worker_id| {
                let pool = self.pool.clone();
                let publisher = self.publisher.clone();
                let batch_size = self.batch_size;
                tokio::spawn(async move { drain_worker(worker_id, pool, publisher, batch_size).await })
            })
            .collect();

        let mut first_err = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
                Err(e) => tracing::error!(error = %e, "outbox worker task panicked"),
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Claim up to `batch_size` rows and keep claiming until a claim comes back
/// empty — draining the backlog within one tick rather than one batch.
/// Stops and returns the error on the first batch-processing failure,
/// rather than pressing on with the rest of the backlog.
async fn drain_worker(
    worker_id: usize,
    pool: PgPool,
    publisher: Arc<dyn EventPublisher>,
    batch_size: i64,
) -> anyhow::Result<()> {
    loop {
        match process_batch(&pool, publisher.as_ref(), batch_size).await {
            Ok(0) => return Ok(()),
            Ok(_) => continue,
            Err(e) => {
                tracing::error!(worker_id, error = %e, "outbox batch processing failed");
                return Err(e);
            }
        }
    }
}

/// Claim, publish, and settle one batch. Returns the number of rows
/// claimed so the caller knows whether to loop for more (§4.8.a). An idle
/// claim (§4.4's `NotFound`) is not an error here — it just means 0 rows.
///
/// Publishing stops at the first failure within the batch (§4.8.a: `if
/// err: break`) — the failed event and every event after it in claim order
/// are unlocked for retry on a later tick; none of the ones after the
/// failure are ever attempted this tick.
async fn process_batch(
    pool: &PgPool,
    publisher: &dyn EventPublisher,
    batch_size: i64,
) -> anyhow::Result<usize> {
    let events = match event_store::lock(pool, batch_size).await {
        Ok(events) => events,
        Err(e) if Kind::is_not_found(&e) => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut published_ids = Vec::new();
    let mut failed_ids = Vec::new();

    let mut remaining = events.iter();
    for event in remaining.by_ref() {
        match publish_one(publisher, event).await {
            Ok(()) => published_ids.push(event.id),
            Err(e) => {
                tracing::warn!(event_id = event.id, error = %e, "publish failed, unlocking for retry");
                failed_ids.push(event.id);
                break;
            }
        }
    }
    failed_ids.extend(remaining.map(|e| e.id));

    if !published_ids.is_empty() {
        event_store::remove(pool, &published_ids).await?;
    }
    if !failed_ids.is_empty() {
        event_store::unlock(pool, &failed_ids).await?;
    }

    Ok(events.len())
}

async fn publish_one(publisher: &dyn EventPublisher, event: &BookEvent) -> anyhow::Result<()> {
    publisher.publish(event).await
}
