use crate::config::PipelineConfig;
use crate::domain::message::{DeadLetterInfo, Delivery, Queue};
use crate::domain::ports::MessageBrokerRef;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// How a handled message is settled with the broker.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Done; remove the message.
    Complete,
    /// Release the message for redelivery.
    Abandon { error: String },
    /// Park the message on the dead-letter sub-queue.
    DeadLetter(DeadLetterInfo),
}

/// One pipeline stage: consumes a single input queue.
#[async_trait]
pub trait StageHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn input(&self) -> Queue;
    async fn handle(&self, delivery: &Delivery) -> Disposition;
}

/// Competing consumer for one stage.
///
/// Receives from the stage's input queue, runs up to `concurrency` handlers at
/// once and settles each message according to the handler's [`Disposition`].
/// When the shutdown signal flips it stops receiving and waits for in-flight
/// handlers to finish.
pub struct Worker {
    handler: Arc<dyn StageHandler>,
    broker: MessageBrokerRef,
    config: PipelineConfig,
}

impl Worker {
    pub fn new(handler: Arc<dyn StageHandler>, broker: MessageBrokerRef, config: PipelineConfig) -> Self {
        Self {
            handler,
            broker,
            config,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let stage = self.handler.name();
        let queue = self.handler.input();
        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut in_flight = JoinSet::new();

        info!(stage, queue = %queue, concurrency = self.config.concurrency, "Worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }
            while let Some(joined) = in_flight.try_join_next() {
                if let Err(e) = joined {
                    error!(stage, error = %e, "Message handler task failed");
                }
            }

            let permit = tokio::select! {
                _ = shutdown.changed() => break,
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let delivery = match self.broker.receive(queue).await {
                Ok(Some(delivery)) => delivery,
                Ok(None) => {
                    drop(permit);
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => continue,
                    }
                }
                Err(e) => {
                    drop(permit);
                    error!(stage, queue = %queue, error = %e, "Receive failed");
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => continue,
                    }
                }
            };

            let handler = self.handler.clone();
            let broker = self.broker.clone();
            in_flight.spawn(async move {
                let _permit = permit;
                settle(handler.as_ref(), &broker, delivery).await;
            });
        }

        info!(stage, in_flight = in_flight.len(), "Worker stopping, draining in-flight messages");
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!(stage, error = %e, "Message handler task failed");
            }
        }
        info!(stage, "Worker stopped");
    }
}

async fn settle(handler: &dyn StageHandler, broker: &MessageBrokerRef, delivery: Delivery) {
    let stage = handler.name();
    let transaction_id = delivery.transaction_id().to_string();
    let disposition = handler.handle(&delivery).await;

    let settled = match disposition {
        Disposition::Complete => {
            debug!(stage, transaction_id = %transaction_id, "Completing message");
            broker.complete(&delivery).await
        }
        Disposition::Abandon { error } => {
            warn!(
                stage,
                transaction_id = %transaction_id,
                delivery_count = delivery.message.delivery_count,
                error = %error,
                "Abandoning message for redelivery"
            );
            broker.abandon(&delivery).await
        }
        Disposition::DeadLetter(info) => {
            warn!(
                stage,
                transaction_id = %transaction_id,
                reason = %info.reason,
                description = %info.description,
                "Dead-lettering message"
            );
            broker.dead_letter(&delivery, info).await
        }
    };

    if let Err(e) = settled {
        error!(stage, transaction_id = %transaction_id, error = %e, "Failed to settle message");
    }
}
