use anyhow::Result;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use shared::StockHazard;
use std::time::Duration;
use tracing::error;

/// Destination for stock-consistency hazards.
#[async_trait]
pub trait HazardSink: Send + Sync {
    async fn report(&self, hazard: &StockHazard) -> Result<()>;
}

fn log_hazard(hazard: &StockHazard) {
    error!(
        target: "stock_hazard",
        hazard_id = %hazard.id,
        kind = %hazard.kind,
        item_id = %hazard.item_id,
        quantity = hazard.quantity,
        cause = %hazard.cause,
        unresolved = %hazard.unresolved,
        "Stock and ledger may disagree; manual reconciliation required"
    );
}

// Kafka (key, payload) for one hazard.
fn hazard_message(hazard: &StockHazard) -> Result<(String, String)> {
    Ok((hazard.item_id.to_string(), serde_json::to_string(hazard)?))
}

pub struct LogHazardSink;

#[async_trait]
impl HazardSink for LogHazardSink {
    async fn report(&self, hazard: &StockHazard) -> Result<()> {
        log_hazard(hazard);
        Ok(())
    }
}

/// Logs the hazard, then publishes it to a Kafka topic keyed by item id.
pub struct KafkaHazardSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaHazardSink {
    pub fn new(producer: FutureProducer, topic: String) -> Self {
        Self { producer, topic }
    }
}

#[async_trait]
impl HazardSink for KafkaHazardSink {
    async fn report(&self, hazard: &StockHazard) -> Result<()> {
        log_hazard(hazard);

        let (key, json) = hazard_message(hazard)?;
        let record = FutureRecord::to(&self.topic)
            .payload(&json)
            .key(&key);

        self.producer.send(record, Duration::from_secs(5)).await
            .map_err(|(e, _)| anyhow::anyhow!("Failed to publish stock hazard: {}", e))?;

        Ok(())
    }
}
