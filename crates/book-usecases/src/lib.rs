//! Producer-side use cases (§4.6): everything that mutates or reads the
//! `book` entity. `add`/`remove` always run inside a
//! [`book_db::UnitOfWork`] so the business write and its outbox row commit
//! together; `get`/`list` are plain reads against the pool.

use anyhow::Context;
use book_db::{book_store, event_store, UnitOfWork};
use book_schemas::{
    error::Kind, Book, EventType, PageInfo, PaginationParams, ResponseBooks, SortBy, SortOrder,
};
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct AddBookInput {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub year: i16,
}

#[derive(Serialize)]
struct BookEventPayload<'a> {
    book: &'a Book,
}

/// Insert `input` and its `Created` outbox event atomically (§4.6.a).
pub async fn add_book(uow: &UnitOfWork, input: AddBookInput) -> anyhow::Result<Book> {
    if input.title.is_empty() {
        return Err(Kind::InvalidArgument("title can not be empty".into()).into());
    }

    let mut repos = uow.begin().await?;

    let book = repos
        .create_book(book_store::NewBook {
            title: input.title,
            description: input.description,
            genre: input.genre,
            year: input.year,
        })
        .await?;

    let payload = serde_json::to_vec(&BookEventPayload { book: &book })
        .context("add_book: serialize event payload")?;

    repos
        .create_event(event_store::NewBookEvent {
            book_id: book.id,
            event_type: EventType::Created,
            payload,
        })
        .await?;

    repos.commit().await?;
    Ok(book)
}

/// Tombstone every id in `ids` and emit one `Deleted` event per row
/// actually flipped. Rolls back — and the whole batch fails — if the
/// number of rows flipped does not match `ids.len()`, since that means the
/// caller believed it owned a row (already removed, or never existed) that
/// it did not: reported as [`Kind::NotFound`] (§4.3).
pub async fn remove_books(uow: &UnitOfWork, ids: &[i64]) -> anyhow::Result<()> {
    if ids.is_empty() {
        return Err(Kind::InvalidArgument("ids can not be empty".into()).into());
    }

    let mut repos = uow.begin().await?;

    let affected = repos.remove_books(ids).await?;
    if affected as usize != ids.len() {
        repos.rollback().await?;
        return Err(Kind::NotFound.into());
    }

    for &id in ids {
        let payload =
            serde_json::to_vec(&serde_json::json!({ "id": id })).context("remove_books: serialize event payload")?;
        repos
            .create_event(event_store::NewBookEvent {
                book_id: id,
                event_type: EventType::Deleted,
                payload,
            })
            .await?;
    }

    repos.commit().await?;
    Ok(())
}

/// Fetch a single non-removed book by id.
pub async fn get_book(pool: &PgPool, id: i64) -> anyhow::Result<Book> {
    let mut books = book_store::get_by_ids(pool, &[id]).await?;
    books.pop().ok_or_else(|| Kind::NotFound.into())
}

#[derive(Debug, Clone)]
pub struct ListBooksInput {
    pub limit: u64,
    pub cursor: Option<String>,
    pub sort_by: String,
    pub descending: bool,
}

/// Keyset-paginated listing (§4.2). Decodes and validates the caller's
/// opaque cursor and sort key before touching the database.
pub async fn list_books(pool: &PgPool, input: ListBooksInput) -> anyhow::Result<ResponseBooks> {
    if input.limit == 0 {
        return Err(Kind::InvalidArgument("limit must be greater than zero".into()).into());
    }

    let sort_by = SortBy::parse(&input.sort_by)
        .ok_or_else(|| Kind::InvalidArgument(format!("unknown sort field: {}", input.sort_by)))?;

    let cursor = input
        .cursor
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(book_db::cursor::decode)
        .transpose()?;

    let params = PaginationParams {
        limit: input.limit,
        cursor,
        sort_by,
        sort_order: if input.descending { SortOrder::Desc } else { SortOrder::Asc },
    };

    book_store::list(pool, &params).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_pool() -> PgPool {
        book_testkit::testkit_db_pool().await.expect("connect + migrate")
    }

    #[tokio::test]
    #[ignore = "requires BOOK_DATABASE_URL; run: BOOK_DATABASE_URL=postgres://localhost/book_test cargo test -p book-usecases -- --ignored"]
    async fn add_book_creates_matching_outbox_event() {
        let pool = seed_pool().await;
        let uow = UnitOfWork::new(pool.clone());

        let book = add_book(
            &uow,
            AddBookInput {
                title: "Dune".into(),
                description: "Desert planet".into(),
                genre: "sci-fi".into(),
                year: 1965,
            },
        )
        .await
        .expect("add book");

        let events = book_db::event_store::lock(&pool, 10).await.expect("lock");
        let event = events.iter().find(|e| e.book_id == book.id).expect("matching event");
        assert_eq!(event.event_type, EventType::Created);
    }

    #[tokio::test]
    #[ignore = "requires BOOK_DATABASE_URL; run: BOOK_DATABASE_URL=postgres://localhost/book_test cargo test -p book-usecases -- --ignored"]
    async fn remove_books_rejects_ids_it_does_not_own() {
        let pool = seed_pool().await;
        let uow = UnitOfWork::new(pool.clone());

        let err = remove_books(&uow, &[i64::MAX]).await.unwrap_err();
        assert!(Kind::is_not_found(&err));
    }

    #[tokio::test]
    #[ignore = "requires BOOK_DATABASE_URL; run: BOOK_DATABASE_URL=postgres://localhost/book_test cargo test -p book-usecases -- --ignored"]
    async fn get_book_reports_not_found_for_removed_rows() {
        let pool = seed_pool().await;
        let uow = UnitOfWork::new(pool.clone());

        let book = add_book(
            &uow,
            AddBookInput {
                title: "Ephemeral".into(),
                description: String::new(),
                genre: "test".into(),
                year: 2000,
            },
        )
        .await
        .expect("add book");

        remove_books(&uow, &[book.id]).await.expect("remove");

        let err = get_book(&pool, book.id).await.unwrap_err();
        assert!(Kind::is_not_found(&err));
    }
}
