//! Deterministic test doubles for the outbox pipeline. No network I/O, no
//! randomness — every publish call is recorded in order and can be
//! inspected or made to fail on demand, the same shape as a paper broker
//! standing in for a live exchange connection.

use async_trait::async_trait;
use book_publisher::EventPublisher;
use book_schemas::BookEvent;
use std::sync::Mutex;

/// Records every event handed to it; optionally fails specific event ids so
/// tests can exercise the lock -> publish-fails -> unlock retry path.
pub struct FakePublisher {
    published: Mutex<Vec<BookEvent>>,
    fail_ids: Mutex<Vec<i64>>,
}

impl Default for FakePublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePublisher {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail_ids: Mutex::new(Vec::new()),
        }
    }

    /// Make the next `publish` call for `id` return an error instead of
    /// recording the event. One-shot: removed from the fail list once hit.
    pub fn fail_once(&self, id: i64) {
        self.fail_ids.lock().unwrap().push(id);
    }

    pub fn published(&self) -> Vec<BookEvent> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl EventPublisher for FakePublisher {
    async fn publish(&self, event: &BookEvent) -> anyhow::Result<()> {
        let mut fail_ids = self.fail_ids.lock().unwrap();
        if let Some(pos) = fail_ids.iter().position(|id| *id == event.id) {
            fail_ids.remove(pos);
            return Err(anyhow::anyhow!("fake_publisher: forced failure for event {}", event.id));
        }
        drop(fail_ids);

        self.published.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Connect to the DB named by `BOOK_DATABASE_URL` and ensure migrations are
/// applied; used by every `#[ignore]`d integration test in the workspace.
pub async fn testkit_db_pool() -> anyhow::Result<sqlx::PgPool> {
    let pool = book_db::connect_from_env().await?;
    book_db::migrate(&pool).await?;
    Ok(pool)
}
