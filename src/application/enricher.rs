use super::optimistic::read_modify_replace;
use super::worker::{Disposition, StageHandler};
use crate::domain::message::{Delivery, Message, Queue};
use crate::domain::ports::{MessageBrokerRef, TransactionStoreRef};
use crate::domain::scoring::RiskScorer;
use crate::domain::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{error, info};

pub const ENRICHED_TAG: &str = "enriched";
pub const HIGH_VALUE_TAG: &str = "high-value";
pub const STANDARD_TAG: &str = "standard";

/// Amounts strictly above this are tagged high-value.
pub const HIGH_VALUE_THRESHOLD: Decimal = dec!(10000);

pub fn value_tag(amount: Decimal) -> &'static str {
    if amount > HIGH_VALUE_THRESHOLD {
        HIGH_VALUE_TAG
    } else {
        STANDARD_TAG
    }
}

/// Scores and tags a transaction in place. Returns false if it was already
/// enriched, so a redelivered message leaves the document untouched.
fn apply_enrichment(tx: &mut Transaction, scorer: &dyn RiskScorer) -> bool {
    if tx.has_tag(ENRICHED_TAG) {
        return false;
    }
    let score = scorer.score(tx);
    tx.raise_risk_score(score);
    tx.add_tag(ENRICHED_TAG);
    tx.add_tag(value_tag(tx.amount));
    true
}

/// Second stage: computes risk attributes and forwards for routing.
pub struct Enricher {
    store: TransactionStoreRef,
    broker: MessageBrokerRef,
    scorer: Arc<dyn RiskScorer>,
    replace_attempts: u32,
}

impl Enricher {
    pub fn new(
        store: TransactionStoreRef,
        broker: MessageBrokerRef,
        scorer: Arc<dyn RiskScorer>,
        replace_attempts: u32,
    ) -> Self {
        Self {
            store,
            broker,
            scorer,
            replace_attempts,
        }
    }

    pub async fn enrich(&self, transaction_id: &str) -> Result<Transaction> {
        let scorer = self.scorer.as_ref();
        let tx = read_modify_replace(
            self.store.as_ref(),
            transaction_id,
            self.replace_attempts,
            |tx| apply_enrichment(tx, scorer),
        )
        .await?;

        self.broker
            .send(Queue::Routing, Message::pointer(tx.id.as_str()))
            .await?;
        info!(
            transaction_id = %tx.id,
            risk_score = tx.risk_score,
            tags = ?tx.tags,
            "Enriched and forwarded transaction"
        );
        Ok(tx)
    }
}

#[async_trait]
impl StageHandler for Enricher {
    fn name(&self) -> &'static str {
        "enricher"
    }

    fn input(&self) -> Queue {
        Queue::Validated
    }

    async fn handle(&self, delivery: &Delivery) -> Disposition {
        let id = delivery.transaction_id();
        info!(transaction_id = %id, "Enriching transaction");

        match self.enrich(id).await {
            Ok(_) => Disposition::Complete,
            Err(e) => {
                error!(transaction_id = %id, error = %e, "Failed to enrich transaction");
                Disposition::Abandon {
                    error: e.to_string(),
                }
            }
        }
    }
}
