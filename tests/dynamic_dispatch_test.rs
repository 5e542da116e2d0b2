use rust_decimal_macros::dec;
use std::sync::Arc;
use tx_pipeline::domain::message::{Message, Queue};
use tx_pipeline::domain::ports::{MessageBrokerRef, TransactionStoreRef};
use tx_pipeline::domain::scoring::{AmountRiskScorer, FixedRiskScorer, RiskScorer};
use tx_pipeline::domain::transaction::{Revision, Transaction};
use tx_pipeline::infrastructure::in_memory::{InMemoryBroker, InMemoryTransactionStore};

#[tokio::test]
async fn test_adapters_as_trait_objects() {
    let store: TransactionStoreRef = Arc::new(InMemoryTransactionStore::new());
    let broker: MessageBrokerRef = Arc::new(InMemoryBroker::default());

    let tx = Transaction::new("acc-1", "acc-2", dec!(100.0), "EUR");
    let id = tx.id.clone();

    // Verify Send + Sync by spawning tasks
    let store_handle = {
        let store = store.clone();
        tokio::spawn(async move {
            store.create(tx).await.unwrap();
            store.read(&id).await.unwrap()
        })
    };

    let broker_handle = {
        let broker = broker.clone();
        tokio::spawn(async move {
            broker
                .send(Queue::Inbound, Message::pointer("tx-1"))
                .await
                .unwrap();
            broker.receive(Queue::Inbound).await.unwrap().unwrap()
        })
    };

    let stored = store_handle.await.unwrap();
    assert_eq!(stored.revision, Revision::INITIAL);
    assert_eq!(stored.transaction.amount, dec!(100.0));

    let delivery = broker_handle.await.unwrap();
    assert_eq!(delivery.transaction_id(), "tx-1");
    assert_eq!(delivery.message.delivery_count, 1);
    broker.complete(&delivery).await.unwrap();
    assert!(broker.depth(Queue::Inbound).await.unwrap().is_drained());
}

#[tokio::test]
async fn test_scorers_as_trait_objects() {
    let scorers: Vec<Arc<dyn RiskScorer>> = vec![Arc::new(FixedRiskScorer(42)), Arc::new(AmountRiskScorer)];
    let tx = Transaction::new("acc-1", "acc-2", dec!(2000), "BTC");

    let handles: Vec<_> = scorers
        .into_iter()
        .map(|scorer| {
            let tx = tx.clone();
            tokio::spawn(async move { scorer.score(&tx) })
        })
        .collect();

    let mut scores = Vec::new();
    for handle in handles {
        scores.push(handle.await.unwrap());
    }
    assert_eq!(scores, vec![42, 40]);
}
