//! A failure partway through a unit of work must leave neither the book row
//! nor its outbox row behind (§4.5 invariant).

use book_db::{book_store::NewBook, event_store::NewBookEvent, UnitOfWork};
use book_schemas::{error::Kind, EventType};

async fn seed_pool() -> sqlx::PgPool {
    let pool = book_db::connect_from_env().await.expect("connect");
    book_db::migrate(&pool).await.expect("migrate");
    pool
}

#[tokio::test]
#[ignore = "requires BOOK_DATABASE_URL; run: BOOK_DATABASE_URL=postgres://localhost/book_test cargo test -p book-db -- --ignored"]
async fn unit_of_work_rolls_back_both_writes_on_error() {
    let pool = seed_pool().await;
    let uow = UnitOfWork::new(pool.clone());

    let mut repos = uow.begin().await.expect("begin");
    let book = repos
        .create_book(NewBook {
            title: "Rolled Back".into(),
            description: String::new(),
            genre: "test".into(),
            year: 2024,
        })
        .await
        .expect("create book");
    repos
        .create_event(NewBookEvent {
            book_id: book.id,
            event_type: EventType::Created,
            payload: b"{}".to_vec(),
        })
        .await
        .expect("create event");
    repos.rollback().await.expect("rollback");

    let err = book_db::book_store::get_by_ids(&pool, &[book.id]).await.unwrap_err();
    assert!(Kind::is_not_found(&err), "book row must not survive rollback");
}
