//! Two concurrent `lock` calls against the same outbox backlog must claim
//! disjoint batches — `FOR UPDATE SKIP LOCKED` is what makes that true
//! without any coordination between callers (§5).

use book_db::{book_store::NewBook, event_store::NewBookEvent};
use book_schemas::EventType;

async fn seed_pool() -> sqlx::PgPool {
    let pool = book_db::connect_from_env().await.expect("connect");
    book_db::migrate(&pool).await.expect("migrate");
    pool
}

#[tokio::test]
#[ignore = "requires BOOK_DATABASE_URL; run: BOOK_DATABASE_URL=postgres://localhost/book_test cargo test -p book-db -- --ignored"]
async fn outbox_claim_lock_prevents_double_dispatch() {
    let pool = seed_pool().await;

    let book = book_db::book_store::create(
        &pool,
        NewBook {
            title: "Double Claim".into(),
            description: String::new(),
            genre: "test".into(),
            year: 2024,
        },
    )
    .await
    .expect("create book");

    for _ in 0..5 {
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
    }

    let (a, b) = tokio::join!(
        book_db::event_store::lock(&pool, 3),
        book_db::event_store::lock(&pool, 3),
    );
    let a = a.expect("lock a");
    let b = b.expect("lock b");

    let mut claimed: Vec<i64> = a.iter().chain(b.iter()).map(|e| e.id).collect();
    claimed.sort_unstable();
    let mut unique = claimed.clone();
    unique.dedup();

    assert_eq!(claimed.len(), unique.len(), "no id claimed by both workers");
    assert_eq!(claimed.len(), 5, "every backlog row was claimed exactly once");
}
