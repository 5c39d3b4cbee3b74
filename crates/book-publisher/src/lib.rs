//! Outbound event publishing (§4.7). [`EventPublisher`] is the seam the
//! outbox worker drives against; [`KafkaEventPublisher`] is the production
//! implementation, `book-testkit::FakePublisher` the deterministic one used
//! in tests.

use async_trait::async_trait;
use book_schemas::BookEvent;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;
use std::time::Duration;

/// One event handed to the bus. Implementors own delivery semantics
/// (retries, acks) — the outbox worker only needs to know whether the send
/// ultimately succeeded.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &BookEvent) -> anyhow::Result<()>;
}

/// Publishes to Kafka. Key is the event id as a decimal string (stable
/// per-book ordering is not required — the outbox table is the ordering
/// authority — but a stable key keeps retries of the same event on the same
/// partition). The `event_type` header carries the numeric wire code so
/// consumers can route without decoding the payload.
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl KafkaEventPublisher {
    pub fn new(brokers: &str, topic: impl Into<String>) -> anyhow::Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "30000")
            .create()
            .map_err(|e| anyhow::anyhow!("kafka_event_publisher.new: build producer: {e}"))?;

        Ok(Self {
            producer,
            topic: topic.into(),
            send_timeout: Duration::from_secs(10),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, event: &BookEvent) -> anyhow::Result<()> {
        let key = event.id.to_string();
        let event_type_header = event.event_type.as_u16().to_be_bytes();

        let record = FutureRecord::to(&self.topic)
            .key(&key)
            .payload(&event.payload)
            .headers(
                rdkafka::message::OwnedHeaders::new()
                    .insert(rdkafka::message::Header {
                        key: "event_type",
                        value: Some(&event_type_header[..]),
                    }),
            );

        self.producer
            .send(record, Timeout::After(self.send_timeout))
            .await
            .map_err(|(e, _)| anyhow::anyhow!("kafka_event_publisher.publish: event {}: {e}", event.id))?;

        Ok(())
    }
}
