//! `book` table access (§4.3). Every function takes a generic
//! [`sqlx::Executor`] so it runs equally well against a bare pool (reads) or
//! a `&mut Transaction` borrowed from a [`crate::uow::UnitOfWork`] (writes
//! that must land atomically with an outbox row).

use book_schemas::{error::Kind, Book, PaginationParams, ResponseBooks};
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder, Row};

#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub year: i16,
}

fn row_to_book(row: sqlx::postgres::PgRow) -> Book {
    Book {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        genre: row.get("genre"),
        year: row.get("year"),
        removed: row.get("removed"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Insert a new book. Returns the row with its server-assigned `id` and
/// timestamps.
pub async fn create<'c, E>(exec: E, input: NewBook) -> anyhow::Result<Book>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    let row = sqlx::query(
        r#"
        INSERT INTO book (title, description, genre, year)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, description, genre, year, removed, created_at, updated_at
        "#,
    )
    .bind(input.title)
    .bind(input.description)
    .bind(input.genre)
    .bind(input.year)
    .fetch_one(exec)
    .await
    .map_err(|e| anyhow::Error::new(e).context("book_store.create: insert"))?;

    Ok(row_to_book(row))
}

/// Fetch every non-removed book whose id is in `ids`. Partial hits are not
/// an error — the caller decides what to do with a short result — but a
/// completely empty result is [`Kind::NotFound`] (§4.3).
pub async fn get_by_ids<'c, E>(exec: E, ids: &[i64]) -> anyhow::Result<Vec<Book>>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    if ids.is_empty() {
        return Err(Kind::InvalidArgument("ids can not be empty".into()).into());
    }

    let rows = sqlx::query(
        r#"
        SELECT id, title, description, genre, year, removed, created_at, updated_at
        FROM book
        WHERE id = ANY($1) AND removed = false
        "#,
    )
    .bind(ids)
    .fetch_all(exec)
    .await
    .map_err(|e| anyhow::Error::new(e).context("book_store.get_by_ids: select"))?;

    if rows.is_empty() {
        return Err(Kind::NotFound.into());
    }

    Ok(rows.into_iter().map(row_to_book).collect())
}

/// Keyset-paginated listing of non-removed books (§4.2/§4.3). Reports
/// [`Kind::NotFound`] if the initial fetch (before lookahead truncation)
/// returns zero rows — distinct from "last page reached", which returns an
/// empty `next_cursor` with a non-empty page.
pub async fn list<'c, E>(exec: E, params: &PaginationParams) -> anyhow::Result<ResponseBooks>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, title, description, genre, year, removed, created_at, updated_at FROM book WHERE removed = false",
    );
    crate::pagination::push_keyset_predicate(&mut qb, params);
    crate::pagination::push_order_by(&mut qb, params);
    qb.push(" LIMIT ").push_bind(crate::pagination::lookahead_limit(params));

    let mut rows: Vec<Book> = qb
        .build()
        .fetch_all(exec)
        .await
        .map_err(|e| anyhow::Error::new(e).context("book_store.list: select"))?
        .into_iter()
        .map(row_to_book)
        .collect();

    if rows.is_empty() {
        return Err(Kind::NotFound.into());
    }

    let page_info = crate::pagination::paginate(&mut rows, params)?;
    Ok(ResponseBooks {
        data: rows,
        page_info,
    })
}

/// Tombstone `ids`: flips `removed` and bumps `updated_at`. Returns the
/// number of rows actually flipped, which the caller compares against
/// `ids.len()` to detect partially-missing input (§4.3 invariant: remove
/// must affect exactly the rows the caller believes exist).
pub async fn remove<'c, E>(exec: E, ids: &[i64]) -> anyhow::Result<u64>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    if ids.is_empty() {
        return Err(Kind::InvalidArgument("ids can not be empty".into()).into());
    }

    let result = sqlx::query(
        "UPDATE book SET removed = true, updated_at = $2 WHERE id = ANY($1) AND removed = false",
    )
    .bind(ids)
    .bind(Utc::now())
    .execute(exec)
    .await
    .map_err(|e| anyhow::Error::new(e).context("book_store.remove: update"))?;

    Ok(result.rows_affected())
}
