#![allow(dead_code)]

use rust_decimal::Decimal;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tx_pipeline::application::pipeline::Pipeline;
use tx_pipeline::application::submission::TransactionRequest;
use tx_pipeline::config::{BrokerConfig, PipelineConfig};
use tx_pipeline::domain::message::{Message, Queue};
use tx_pipeline::domain::ports::{MessageBrokerRef, TransactionStoreRef};
use tx_pipeline::domain::scoring::RiskScorer;
use tx_pipeline::domain::transaction::Transaction;
use tx_pipeline::infrastructure::in_memory::{InMemoryBroker, InMemoryTransactionStore};

pub fn request(amount: Decimal, currency: &str) -> TransactionRequest {
    TransactionRequest {
        from_account: "acc-from".to_string(),
        to_account: "acc-to".to_string(),
        amount,
        currency: currency.to_string(),
    }
}

/// A pipeline over shared in-process adapters.
pub struct Harness {
    pub store: TransactionStoreRef,
    pub broker: MessageBrokerRef,
    pub pipeline: Pipeline,
}

impl Harness {
    pub fn new(scorer: impl RiskScorer + 'static) -> Self {
        Self::with_store(Arc::new(InMemoryTransactionStore::new()), scorer, BrokerConfig::default())
    }

    pub fn with_store(
        store: TransactionStoreRef,
        scorer: impl RiskScorer + 'static,
        broker_config: BrokerConfig,
    ) -> Self {
        let broker: MessageBrokerRef = Arc::new(InMemoryBroker::new(broker_config));
        let config = PipelineConfig {
            poll_interval: Duration::from_millis(5),
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(store.clone(), broker.clone(), Arc::new(scorer), config);
        Self {
            store,
            broker,
            pipeline,
        }
    }

    /// Submits every request, runs the stages until the main path is empty,
    /// then stops them.
    pub async fn run(&self, requests: Vec<TransactionRequest>) -> Vec<Transaction> {
        let running = self.pipeline.spawn();
        let submitter = self.pipeline.submitter();
        let mut submitted = Vec::new();
        for request in requests {
            submitted.push(submitter.submit(request).await.unwrap());
        }
        tokio::time::timeout(Duration::from_secs(10), running.wait_until_drained())
            .await
            .expect("pipeline did not drain in time")
            .unwrap();
        running.shutdown().await;
        submitted
    }

    pub async fn ids_on(&self, queue: Queue) -> Vec<String> {
        self.broker
            .peek(queue, usize::MAX)
            .await
            .unwrap()
            .iter()
            .map(|m| m.transaction_id().to_string())
            .collect()
    }

    pub async fn messages_on(&self, queue: Queue) -> Vec<Message> {
        self.broker.peek(queue, usize::MAX).await.unwrap()
    }

    pub async fn dead_letters(&self, queue: Queue) -> Vec<Message> {
        self.broker.peek_dead_letters(queue, usize::MAX).await.unwrap()
    }

    pub async fn stored(&self, id: &str) -> Transaction {
        self.store.read(id).await.unwrap().transaction
    }
}

pub fn generate_csv(path: &Path, rows: &[(&str, &str)]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["from_account", "to_account", "amount", "currency"])?;
    for (i, (amount, currency)) in rows.iter().enumerate() {
        let from = format!("acc-{i}");
        wtr.write_record([from.as_str(), "acc-sink", amount, currency])?;
    }

    wtr.flush()?;
    Ok(())
}
