use crate::config::BrokerConfig;
use crate::domain::message::{DeadLetterInfo, DeadLetterReason, Delivery, Message, Queue};
use crate::domain::ports::{MessageBroker, QueueDepth, TransactionStore};
use crate::domain::transaction::{Revision, StoredTransaction, Transaction};
use crate::error::{BrokerError, StoreError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::warn;
use uuid::Uuid;

/// A thread-safe in-memory transaction store.
///
/// Uses `Arc<RwLock<HashMap<String, StoredTransaction>>>`; the revision check
/// and the write of a replace happen under the same write lock.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    documents: Arc<RwLock<HashMap<String, StoredTransaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, tx: Transaction) -> Result<Revision, StoreError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&tx.id) {
            return Err(StoreError::AlreadyExists(tx.id));
        }
        documents.insert(
            tx.id.clone(),
            StoredTransaction {
                revision: Revision::INITIAL,
                transaction: tx,
            },
        );
        Ok(Revision::INITIAL)
    }

    async fn read(&self, id: &str) -> Result<StoredTransaction, StoreError> {
        let documents = self.documents.read().await;
        documents
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn replace(&self, tx: Transaction, expected: Revision) -> Result<Revision, StoreError> {
        let mut documents = self.documents.write().await;
        let stored = documents
            .get_mut(&tx.id)
            .ok_or_else(|| StoreError::NotFound(tx.id.clone()))?;
        if stored.revision != expected {
            return Err(StoreError::Conflict {
                id: tx.id,
                expected,
                actual: stored.revision,
            });
        }
        stored.revision = stored.revision.next();
        stored.transaction = tx;
        Ok(stored.revision)
    }
}

struct LockedMessage {
    message: Message,
    locked_until: Instant,
}

#[derive(Default)]
struct QueueState {
    active: VecDeque<Message>,
    in_flight: HashMap<Uuid, LockedMessage>,
    dead_letters: Vec<Message>,
}

impl QueueState {
    /// Puts an unsettled message back, or dead-letters it once it has used
    /// up its deliveries.
    fn release(&mut self, queue: Queue, mut message: Message, max_delivery_count: u32) {
        if message.delivery_count >= max_delivery_count {
            warn!(
                queue = %queue,
                message_id = %message.message_id,
                transaction_id = %message.transaction_id(),
                delivery_count = message.delivery_count,
                "Max delivery count reached, dead-lettering message"
            );
            message.dead_letter = Some(DeadLetterInfo {
                reason: DeadLetterReason::MaxDeliveryCountExceeded,
                description: format!(
                    "Message was delivered {} times without being completed",
                    message.delivery_count
                ),
                transaction: None,
            });
            self.dead_letters.push(message);
        } else {
            self.active.push_front(message);
        }
    }

    fn reclaim_expired(&mut self, queue: Queue, now: Instant, max_delivery_count: u32) {
        let expired: Vec<Uuid> = self
            .in_flight
            .iter()
            .filter(|(_, locked)| locked.locked_until <= now)
            .map(|(token, _)| *token)
            .collect();
        for token in expired {
            if let Some(locked) = self.in_flight.remove(&token) {
                self.release(queue, locked.message, max_delivery_count);
            }
        }
    }

    /// Removes the locked message for `delivery`, failing if the lock is
    /// unknown or has expired.
    fn take_locked(&mut self, delivery: &Delivery, max_delivery_count: u32) -> Result<Message, BrokerError> {
        let lock_lost = || BrokerError::LockLost {
            queue: delivery.queue,
            lock_token: delivery.lock_token,
        };
        let locked = self.in_flight.remove(&delivery.lock_token).ok_or_else(lock_lost)?;
        if locked.locked_until <= Instant::now() {
            self.release(delivery.queue, locked.message, max_delivery_count);
            return Err(lock_lost());
        }
        Ok(locked.message)
    }
}

/// A thread-safe in-memory message broker.
///
/// Each [`Queue`] holds its waiting messages, the messages currently locked
/// by consumers, and a dead-letter sub-queue. Clones share the same queues.
#[derive(Clone)]
pub struct InMemoryBroker {
    queues: Arc<Mutex<HashMap<Queue, QueueState>>>,
    config: BrokerConfig,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

impl InMemoryBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn send(&self, queue: Queue, message: Message) -> Result<(), BrokerError> {
        let mut queues = self.queues.lock().await;
        queues.entry(queue).or_default().active.push_back(message);
        Ok(())
    }

    async fn receive(&self, queue: Queue) -> Result<Option<Delivery>, BrokerError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(queue).or_default();
        let now = Instant::now();
        state.reclaim_expired(queue, now, self.config.max_delivery_count);

        let Some(mut message) = state.active.pop_front() else {
            return Ok(None);
        };
        message.delivery_count += 1;
        let lock_token = Uuid::new_v4();
        state.in_flight.insert(
            lock_token,
            LockedMessage {
                message: message.clone(),
                locked_until: now + self.config.lock_duration,
            },
        );
        Ok(Some(Delivery {
            queue,
            lock_token,
            message,
        }))
    }

    async fn complete(&self, delivery: &Delivery) -> Result<(), BrokerError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(delivery.queue).or_default();
        state.take_locked(delivery, self.config.max_delivery_count)?;
        Ok(())
    }

    async fn abandon(&self, delivery: &Delivery) -> Result<(), BrokerError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(delivery.queue).or_default();
        let message = state.take_locked(delivery, self.config.max_delivery_count)?;
        state.release(delivery.queue, message, self.config.max_delivery_count);
        Ok(())
    }

    async fn dead_letter(&self, delivery: &Delivery, info: DeadLetterInfo) -> Result<(), BrokerError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(delivery.queue).or_default();
        let mut message = state.take_locked(delivery, self.config.max_delivery_count)?;
        message.dead_letter = Some(info);
        state.dead_letters.push(message);
        Ok(())
    }

    async fn peek(&self, queue: Queue, max: usize) -> Result<Vec<Message>, BrokerError> {
        let queues = self.queues.lock().await;
        Ok(queues
            .get(&queue)
            .map(|state| state.active.iter().take(max).cloned().collect())
            .unwrap_or_default())
    }

    async fn peek_dead_letters(&self, queue: Queue, max: usize) -> Result<Vec<Message>, BrokerError> {
        let queues = self.queues.lock().await;
        Ok(queues
            .get(&queue)
            .map(|state| state.dead_letters.iter().take(max).cloned().collect())
            .unwrap_or_default())
    }

    async fn depth(&self, queue: Queue) -> Result<QueueDepth, BrokerError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(queue).or_default();
        state.reclaim_expired(queue, Instant::now(), self.config.max_delivery_count);
        Ok(QueueDepth {
            active: state.active.len(),
            in_flight: state.in_flight.len(),
            dead_lettered: state.dead_letters.len(),
        })
    }
}
