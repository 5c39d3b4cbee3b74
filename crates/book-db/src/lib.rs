//! Postgres-backed storage for the book entity and its transactional
//! outbox. Connection setup and migrations follow the same
//! `connect_from_env` + `migrate` shape the rest of the corpus uses; the
//! domain logic lives in [`book_store`], [`event_store`], [`cursor`],
//! [`pagination`], and [`uow`].

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod book_store;
pub mod cursor;
pub mod event_store;
pub mod pagination;
pub mod uow;

pub use uow::UnitOfWork;

pub const ENV_DB_URL: &str = "BOOK_DATABASE_URL";

/// Connect to Postgres using `BOOK_DATABASE_URL`.
pub async fn connect_from_env() -> anyhow::Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url).await
}

pub async fn connect(url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_book_table: bool,
}

/// Connectivity + schema-presence check, used by the daemon's readiness
/// logging at startup.
pub async fn status(pool: &PgPool) -> anyhow::Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as(
        r#"
        select exists (
            select 1 from information_schema.tables
            where table_schema = 'public' and table_name = 'book'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_book_table: exists,
    })
}
