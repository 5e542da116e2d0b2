use crate::domain::message::{Message, Queue};
use crate::domain::ports::{MessageBrokerRef, TransactionStoreRef};
use crate::domain::transaction::Transaction;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

/// What a producer supplies to start a transaction down the pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionRequest {
    pub from_account: String,
    pub to_account: String,
    pub amount: Decimal,
    pub currency: String,
}

/// Producer side of the pipeline.
#[derive(Clone)]
pub struct Submitter {
    store: TransactionStoreRef,
    broker: MessageBrokerRef,
}

impl Submitter {
    pub fn new(store: TransactionStoreRef, broker: MessageBrokerRef) -> Self {
        Self { store, broker }
    }

    /// Persists a new transaction, then enqueues its id on the inbound queue.
    ///
    /// The record exists before any message names it.
    pub async fn submit(&self, request: TransactionRequest) -> Result<Transaction> {
        let tx = Transaction::new(
            request.from_account,
            request.to_account,
            request.amount,
            request.currency,
        );
        self.store.create(tx.clone()).await?;
        self.broker
            .send(Queue::Inbound, Message::pointer(tx.id.as_str()))
            .await?;
        info!(transaction_id = %tx.id, amount = %tx.amount, currency = %tx.currency, "Transaction submitted");
        Ok(tx)
    }
}
