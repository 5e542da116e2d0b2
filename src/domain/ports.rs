use super::message::{DeadLetterInfo, Delivery, Message, Queue};
use super::transaction::{Revision, StoredTransaction, Transaction};
use crate::error::{BrokerError, StoreError};
use async_trait::async_trait;
use std::sync::Arc;

/// Document store keyed by transaction id.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persists a new document. Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, tx: Transaction) -> Result<Revision, StoreError>;
    /// Point read. Fails with `NotFound` for an unknown id.
    async fn read(&self, id: &str) -> Result<StoredTransaction, StoreError>;
    /// Full-document replace, accepted only if the stored revision still
    /// equals `expected`. Fails with `Conflict` otherwise.
    async fn replace(&self, tx: Transaction, expected: Revision) -> Result<Revision, StoreError>;
}

/// Message counts of one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueDepth {
    pub active: usize,
    pub in_flight: usize,
    pub dead_lettered: usize,
}

impl QueueDepth {
    /// No message waiting or locked by a consumer.
    pub fn is_drained(&self) -> bool {
        self.active == 0 && self.in_flight == 0
    }
}

/// Named durable queues with competing-consumer receive.
///
/// A received message stays locked to its consumer until it is completed,
/// abandoned or dead-lettered, or until the lock expires.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    async fn send(&self, queue: Queue, message: Message) -> Result<(), BrokerError>;
    /// Locks and returns the next available message, if any.
    async fn receive(&self, queue: Queue) -> Result<Option<Delivery>, BrokerError>;
    /// Removes the message for good.
    async fn complete(&self, delivery: &Delivery) -> Result<(), BrokerError>;
    /// Releases the lock so the message can be redelivered.
    async fn abandon(&self, delivery: &Delivery) -> Result<(), BrokerError>;
    /// Moves the message to the queue's dead-letter sub-queue.
    async fn dead_letter(&self, delivery: &Delivery, info: DeadLetterInfo) -> Result<(), BrokerError>;
    /// Returns up to `max` waiting messages without locking them.
    async fn peek(&self, queue: Queue, max: usize) -> Result<Vec<Message>, BrokerError>;
    async fn peek_dead_letters(&self, queue: Queue, max: usize) -> Result<Vec<Message>, BrokerError>;
    async fn depth(&self, queue: Queue) -> Result<QueueDepth, BrokerError>;
}

pub type TransactionStoreRef = Arc<dyn TransactionStore>;
pub type MessageBrokerRef = Arc<dyn MessageBroker>;
