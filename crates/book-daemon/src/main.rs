//! book-daemon entry point.
//!
//! Thin on purpose: load config, connect the DB, build the publisher, spawn
//! the outbox relay, wait for a shutdown signal. No HTTP surface — this
//! process has nothing to serve, only the relay loop to run.

use std::time::Duration;

use anyhow::Context;
use book_config::Config;
use book_outbox::OutboxProcessor;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    book_daemon::init_tracing();

    let config_path = std::env::var("BOOK_CONFIG_PATH").unwrap_or_else(|_| "config/base.yaml".to_string());
    let config = Config::load(&[&config_path]).context("main: load config")?;

    let pool = book_daemon::connect_and_migrate(&config).await?;
    let status = book_db::status(&pool).await?;
    info!(ok = status.ok, has_book_table = status.has_book_table, "connected to Postgres");

    let publisher = book_daemon::build_publisher(&config)?;

    let processor = OutboxProcessor::new(
        pool,
        publisher,
        Duration::from_millis(config.kafka.publisher.interval_ms),
        config.kafka.publisher.batch_size,
        config.kafka.publisher.count_workers,
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let relay = tokio::spawn(async move { processor.run(shutdown_rx).await });

    book_daemon::wait_for_shutdown_signal().await;
    info!("shutdown signal received, stopping outbox relay");
    let _ = shutdown_tx.send(true);

    relay.await.context("main: outbox relay task panicked")??;
    Ok(())
}
