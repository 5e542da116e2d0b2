use super::enricher::Enricher;
use super::router::Router;
use super::submission::Submitter;
use super::validator::Validator;
use super::worker::{StageHandler, Worker};
use crate::config::PipelineConfig;
use crate::domain::message::Queue;
use crate::domain::ports::{MessageBrokerRef, TransactionStoreRef};
use crate::domain::scoring::RiskScorer;
use crate::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Queues that hold a transaction while it is still moving.
const MAIN_PATH: [Queue; 3] = [Queue::Inbound, Queue::Validated, Queue::Routing];

/// Wires the three stages to a shared store and broker.
///
/// The stages only ever talk through the broker and the store; running them
/// in one process is a deployment choice, not a coupling.
pub struct Pipeline {
    store: TransactionStoreRef,
    broker: MessageBrokerRef,
    scorer: Arc<dyn RiskScorer>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        store: TransactionStoreRef,
        broker: MessageBrokerRef,
        scorer: Arc<dyn RiskScorer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            broker,
            scorer,
            config,
        }
    }

    pub fn submitter(&self) -> Submitter {
        Submitter::new(self.store.clone(), self.broker.clone())
    }

    fn stages(&self) -> Vec<Arc<dyn StageHandler>> {
        vec![
            Arc::new(Validator::new(self.store.clone(), self.broker.clone())),
            Arc::new(Enricher::new(
                self.store.clone(),
                self.broker.clone(),
                self.scorer.clone(),
                self.config.replace_attempts,
            )),
            Arc::new(Router::new(
                self.store.clone(),
                self.broker.clone(),
                self.config.replace_attempts,
            )),
        ]
    }

    /// Starts one worker per stage.
    pub fn spawn(&self) -> RunningPipeline {
        let (shutdown, signal) = watch::channel(false);
        let workers = self
            .stages()
            .into_iter()
            .map(|stage| {
                let worker = Worker::new(stage, self.broker.clone(), self.config.clone());
                tokio::spawn(worker.run(signal.clone()))
            })
            .collect();
        RunningPipeline {
            shutdown,
            workers,
            broker: self.broker.clone(),
            config: self.config.clone(),
        }
    }
}

/// How a batch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Drained,
    Interrupted,
}

pub struct RunningPipeline {
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
    broker: MessageBrokerRef,
    config: PipelineConfig,
}

impl RunningPipeline {
    /// Waits until no transaction is waiting on or being handled from a
    /// main-path queue.
    ///
    /// Stages publish downstream before settling their input, so checking the
    /// queues in pipeline order cannot miss a message in transit.
    pub async fn wait_until_drained(&self) -> Result<()> {
        loop {
            let mut drained = true;
            for queue in MAIN_PATH {
                if !self.broker.depth(queue).await?.is_drained() {
                    drained = false;
                    break;
                }
            }
            if drained {
                return Ok(());
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Waits for the pipeline to drain unless `interrupt` resolves first,
    /// then shuts the workers down either way.
    pub async fn finish<F>(self, interrupt: F) -> Result<RunOutcome>
    where
        F: Future<Output = ()>,
    {
        let outcome = tokio::select! {
            drained = self.wait_until_drained() => drained.map(|()| RunOutcome::Drained),
            () = interrupt => {
                warn!("Interrupted before the pipeline drained");
                Ok(RunOutcome::Interrupted)
            }
        };
        self.shutdown().await;
        outcome
    }

    /// Signals every worker to stop and waits for in-flight handlers.
    pub async fn shutdown(self) {
        info!("Shutting down pipeline workers");
        let _ = self.shutdown.send(true);
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = %e, "Worker task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::submission::TransactionRequest;
    use crate::domain::ports::MessageBroker;
    use crate::domain::scoring::FixedRiskScorer;
    use crate::infrastructure::in_memory::{InMemoryBroker, InMemoryTransactionStore};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn pipeline(broker: &InMemoryBroker) -> Pipeline {
        let config = PipelineConfig {
            poll_interval: Duration::from_millis(5),
            ..PipelineConfig::default()
        };
        Pipeline::new(
            Arc::new(InMemoryTransactionStore::new()),
            Arc::new(broker.clone()),
            Arc::new(FixedRiskScorer(10)),
            config,
        )
    }

    async fn submit(pipeline: &Pipeline, count: usize) {
        let submitter = pipeline.submitter();
        for _ in 0..count {
            submitter
                .submit(TransactionRequest {
                    from_account: "a".to_string(),
                    to_account: "b".to_string(),
                    amount: dec!(100),
                    currency: "EUR".to_string(),
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_finish_waits_for_drain() {
        let broker = InMemoryBroker::default();
        let pipeline = pipeline(&broker);
        submit(&pipeline, 5).await;

        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            pipeline.spawn().finish(std::future::pending()),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(outcome, RunOutcome::Drained);
        assert_eq!(broker.peek(Queue::Approval, 10).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_interrupt_stops_workers_without_losing_messages() {
        let broker = InMemoryBroker::default();
        let pipeline = pipeline(&broker);
        submit(&pipeline, 20).await;

        let outcome = pipeline
            .spawn()
            .finish(std::future::ready(()))
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Interrupted);
        // In-flight handlers were settled before the workers stopped, so
        // every transaction is either still queued or already routed.
        let mut accounted = broker.peek(Queue::Approval, 100).await.unwrap().len();
        for queue in MAIN_PATH {
            let depth = broker.depth(queue).await.unwrap();
            assert_eq!(depth.in_flight, 0);
            assert_eq!(depth.dead_lettered, 0);
            accounted += depth.active;
        }
        assert!(accounted >= 20);
    }
}
