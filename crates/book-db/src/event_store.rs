//! `book_event` (outbox) table access (§4.4). `lock`/`unlock`/`remove` form
//! the claim/release/settle triad the outbox worker drives each tick; see
//! `book-outbox` for the algorithm that calls these in sequence.

use book_schemas::{error::Kind, BookEvent, EventStatus, EventType};
use sqlx::{Postgres, Row};

#[derive(Debug, Clone)]
pub struct NewBookEvent {
    pub book_id: i64,
    pub event_type: EventType,
    pub payload: Vec<u8>,
}

fn row_to_event(row: sqlx::postgres::PgRow) -> anyhow::Result<BookEvent> {
    let type_code: i16 = row.get("type");
    let status_code: i16 = row.get("status");
    Ok(BookEvent {
        id: row.get("id"),
        book_id: row.get("book_id"),
        event_type: EventType::from_i16(type_code)
            .ok_or_else(|| Kind::Invariant(format!("unknown event type code {type_code}")))?,
        status: EventStatus::from_i16(status_code)
            .ok_or_else(|| Kind::Invariant(format!("unknown event status code {status_code}")))?,
        payload: row.get("payload"),
        updated_at: row.get("updated_at"),
    })
}

/// Insert a `NEW` outbox row. Callers insert this in the same transaction as
/// the business-row write it describes — never standalone.
pub async fn create<'c, E>(exec: E, input: NewBookEvent) -> anyhow::Result<i64>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    let row = sqlx::query(
        r#"
        INSERT INTO book_event (book_id, type, status, payload)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(input.book_id)
    .bind(input.event_type.as_u16() as i16)
    .bind(EventStatus::New.as_i16())
    .bind(input.payload)
    .fetch_one(exec)
    .await
    .map_err(|e| anyhow::Error::new(e).context("event_store.create: insert"))?;

    Ok(row.get("id"))
}

/// Atomically claim up to `batch_size` eligible (`NEW` or `UNLOCK`) rows,
/// marking them `LOCK` and returning them in `id` order. `FOR UPDATE SKIP
/// LOCKED` lets concurrent workers claim disjoint batches with no shared
/// coordination beyond the row lock itself (§5). Reports
/// [`Kind::NotFound`] when nothing is eligible — the caller treats that as
/// an idle tick, not a failure.
pub async fn lock<'c, E>(exec: E, batch_size: i64) -> anyhow::Result<Vec<BookEvent>>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    let rows = sqlx::query(
        r#"
        UPDATE book_event
        SET status = $1
        WHERE id IN (
            SELECT id FROM book_event
            WHERE status = $2 OR status = $3
            ORDER BY id ASC
            LIMIT $4
            FOR UPDATE SKIP LOCKED
        )
        RETURNING id, book_id, type, status, payload, updated_at
        "#,
    )
    .bind(EventStatus::Lock.as_i16())
    .bind(EventStatus::New.as_i16())
    .bind(EventStatus::Unlock.as_i16())
    .bind(batch_size)
    .fetch_all(exec)
    .await
    .map_err(|e| anyhow::Error::new(e).context("event_store.lock: claim batch"))?;

    if rows.is_empty() {
        return Err(Kind::NotFound.into());
    }

    let mut events = rows
        .into_iter()
        .map(row_to_event)
        .collect::<anyhow::Result<Vec<_>>>()?;
    events.sort_by_key(|e| e.id);
    Ok(events)
}

/// Release `ids` back to `UNLOCK` so a later tick retries them. Used when
/// publish fails for a claimed row. Only rows currently `LOCK` are
/// eligible; rows-affected MUST equal `ids.len()` or the call fails with
/// [`Kind::Invariant`] — another actor touched a row this caller believed
/// it owned. Calling `unlock` twice on the same ids therefore fails the
/// second time (§8 property 8).
pub async fn unlock<'c, E>(exec: E, ids: &[i64]) -> anyhow::Result<()>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    if ids.is_empty() {
        return Ok(());
    }

    let result = sqlx::query("UPDATE book_event SET status = $1 WHERE id = ANY($2) AND status = $3")
        .bind(EventStatus::Unlock.as_i16())
        .bind(ids)
        .bind(EventStatus::Lock.as_i16())
        .execute(exec)
        .await
        .map_err(|e| anyhow::Error::new(e).context("event_store.unlock: update"))?;

    if result.rows_affected() as usize != ids.len() {
        return Err(Kind::Invariant(format!(
            "unlock: expected to affect {} rows, affected {}",
            ids.len(),
            result.rows_affected()
        ))
        .into());
    }
    Ok(())
}

/// Unlock every row still `LOCK`, regardless of id. Only safe to call
/// before any worker in this process has started claiming — see the
/// daemon's startup sweep.
pub async fn unlock_all<'c, E>(exec: E) -> anyhow::Result<u64>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    let result = sqlx::query("UPDATE book_event SET status = $1 WHERE status = $2")
        .bind(EventStatus::Unlock.as_i16())
        .bind(EventStatus::Lock.as_i16())
        .execute(exec)
        .await
        .map_err(|e| anyhow::Error::new(e).context("event_store.unlock_all: update"))?;

    Ok(result.rows_affected())
}

/// Delete `ids` after their events have been durably published. Only rows
/// currently `LOCK` are eligible; rows-affected MUST equal `ids.len()` or
/// the call fails with [`Kind::Invariant`] (§7).
pub async fn remove<'c, E>(exec: E, ids: &[i64]) -> anyhow::Result<()>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    if ids.is_empty() {
        return Ok(());
    }

    let result = sqlx::query("DELETE FROM book_event WHERE id = ANY($1) AND status = $2")
        .bind(ids)
        .bind(EventStatus::Lock.as_i16())
        .execute(exec)
        .await
        .map_err(|e| anyhow::Error::new(e).context("event_store.remove: delete"))?;

    if result.rows_affected() as usize != ids.len() {
        return Err(Kind::Invariant(format!(
            "remove: expected to delete {} rows, deleted {}",
            ids.len(),
            result.rows_affected()
        ))
        .into());
    }
    Ok(())
}
