//! book-daemon library target: the pieces of the process `main.rs` wires
//! together, exposed so integration tests can build the same components
//! without going through the binary.

use anyhow::Context;
use book_config::Config;
use book_publisher::{EventPublisher, KafkaEventPublisher};
use sqlx::PgPool;
use std::sync::Arc;

/// Connect to Postgres and run migrations, per `config.database.url`.
pub async fn connect_and_migrate(config: &Config) -> anyhow::Result<PgPool> {
    let pool = book_db::connect(&config.database.url)
        .await
        .context("connect_and_migrate: connect")?;
    book_db::migrate(&pool)
        .await
        .context("connect_and_migrate: migrate")?;
    Ok(pool)
}

/// Build the production Kafka publisher from config.
pub fn build_publisher(config: &Config) -> anyhow::Result<Arc<dyn EventPublisher>> {
    let brokers = config.kafka.brokers.join(",");
    let publisher = KafkaEventPublisher::new(&brokers, config.kafka.topics.book_events.clone())
        .context("build_publisher: construct Kafka producer")?;
    Ok(Arc::new(publisher))
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Resolve `shutdown_tx` on SIGINT/SIGTERM so `OutboxProcessor::run` exits
/// its tick loop cleanly instead of being killed mid-batch.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
