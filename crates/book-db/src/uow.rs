//! Unit of work (§4.5): binds the book and event stores to one transaction
//! so a business-row write and its outbox row always commit — or roll
//! back — together. Mirrors the "begin, hand repositories to the caller,
//! commit on success" shape of a Go-style `Do(fn)` unit of work, adapted to
//! Rust by having the caller keep ownership of the bundle across the
//! `.await` instead of closing over it in a callback.

use crate::{book_store, event_store};
use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};

pub struct UnitOfWork {
    pool: PgPool,
}

impl UnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a transaction and return a [`Repositories`] bundle backed by it.
    /// The caller drives `books()`/`events()` through it, then calls
    /// `commit()`. Dropping the bundle without committing rolls back —
    /// sqlx's `Transaction::drop` issues `ROLLBACK` on the pooled
    /// connection, so this holds even if the caller's code panics.
    pub async fn begin(&self) -> anyhow::Result<Repositories> {
        let tx = self
            .pool
            .begin()
            .await
            .context("unit_of_work.begin: start transaction")?;
        Ok(Repositories { tx })
    }
}

pub struct Repositories {
    tx: Transaction<'static, Postgres>,
}

impl Repositories {
    pub async fn create_book(&mut self, input: book_store::NewBook) -> anyhow::Result<book_schemas::Book> {
        book_store::create(&mut *self.tx, input).await
    }

    pub async fn remove_books(&mut self, ids: &[i64]) -> anyhow::Result<u64> {
        book_store::remove(&mut *self.tx, ids).await
    }

    pub async fn create_event(&mut self, input: event_store::NewBookEvent) -> anyhow::Result<i64> {
        event_store::create(&mut *self.tx, input).await
    }

    /// Commit the transaction. Consumes `self`: there is no use of the
    /// bundle after this that wouldn't be a bug.
    pub async fn commit(self) -> anyhow::Result<()> {
        self.tx.commit().await.context("unit_of_work.commit")
    }

    /// Explicit rollback. Equivalent to dropping `self`, spelled out for
    /// call sites where that intent should be visible in the diff.
    pub async fn rollback(self) -> anyhow::Result<()> {
        self.tx.rollback().await.context("unit_of_work.rollback")
    }
}
