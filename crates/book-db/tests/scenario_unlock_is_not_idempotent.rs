//! Calling `unlock` a second time on the same ids must fail: the row is no
//! longer `LOCK` after the first call, so the rows-affected count comes up
//! short and the call reports `Invariant` (§8 property 8).

use book_db::{book_store::NewBook, event_store::NewBookEvent};
use book_schemas::{error::Kind, EventType};

async fn seed_pool() -> sqlx::PgPool {
    let pool = book_db::connect_from_env().await.expect("connect");
    book_db::migrate(&pool).await.expect("migrate");
    pool
}

#[tokio::test]
#[ignore = "requires BOOK_DATABASE_URL; run: BOOK_DATABASE_URL=postgres://localhost/book_test cargo test -p book-db -- --ignored"]
async fn unlock_twice_on_the_same_ids_fails_the_second_time() {
    let pool = seed_pool().await;

    let book = book_db::book_store::create(
        &pool,
        NewBook {
            title: "Double Unlock".into(),
            description: String::new(),
            genre: "test".into(),
            year: 2024,
        },
    )
    .await
    .expect("create book");

    book_db::event_store::create(
        &pool,
        NewBookEvent {
            book_id: book.id,
            event_type: EventType::Created,
            payload: b"{}".to_vec(),
        },
    )
    .await
    .expect("create event");

    let claimed = book_db::event_store::lock(&pool, 10).await.expect("lock");
    let ids: Vec<i64> = claimed.iter().map(|e| e.id).collect();

    book_db::event_store::unlock(&pool, &ids).await.expect("first unlock succeeds");

    let err = book_db::event_store::unlock(&pool, &ids).await.unwrap_err();
    assert!(Kind::is_invariant(&err), "second unlock must report Invariant");
}
