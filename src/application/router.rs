use super::optimistic::read_modify_replace;
use super::worker::{Disposition, StageHandler};
use crate::domain::message::{Delivery, Message, Queue};
use crate::domain::ports::{MessageBrokerRef, TransactionStoreRef};
use crate::domain::routing::Destination;
use crate::error::Result;
use async_trait::async_trait;
use tracing::{error, info};

/// Final stage: sends each enriched transaction to fraud, audit or approval.
pub struct Router {
    store: TransactionStoreRef,
    broker: MessageBrokerRef,
    replace_attempts: u32,
}

impl Router {
    pub fn new(store: TransactionStoreRef, broker: MessageBrokerRef, replace_attempts: u32) -> Self {
        Self {
            store,
            broker,
            replace_attempts,
        }
    }

    pub async fn route(&self, transaction_id: &str) -> Result<Destination> {
        let tx = read_modify_replace(
            self.store.as_ref(),
            transaction_id,
            self.replace_attempts,
            |tx| {
                let destination = Destination::classify(tx);
                tx.add_tag(destination.tag())
            },
        )
        .await?;

        // The mutation leaves score and amount alone, so this matches the
        // tag that was written.
        let destination = Destination::classify(&tx);
        self.broker
            .send(destination.queue(), Message::pointer(tx.id.as_str()))
            .await?;
        info!(
            transaction_id = %tx.id,
            %destination,
            risk_score = tx.risk_score,
            amount = %tx.amount,
            "Routed transaction"
        );
        Ok(destination)
    }
}

#[async_trait]
impl StageHandler for Router {
    fn name(&self) -> &'static str {
        "router"
    }

    fn input(&self) -> Queue {
        Queue::Routing
    }

    async fn handle(&self, delivery: &Delivery) -> Disposition {
        let id = delivery.transaction_id();
        info!(transaction_id = %id, "Routing transaction");

        match self.route(id).await {
            Ok(_) => Disposition::Complete,
            Err(e) => {
                error!(transaction_id = %id, error = %e, "Failed to route transaction");
                Disposition::Abandon {
                    error: e.to_string(),
                }
            }
        }
    }
}
