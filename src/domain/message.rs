//! Queue names and the envelope carried between stages.
//!
//! Main-path messages carry only a transaction id. Messages that leave the
//! main path (high-risk side channel, dead letters) carry the full document,
//! since their consumers have no guaranteed lookup path into the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::transaction::Transaction;

/// Subject set on high-risk side-channel publications.
pub const SUBJECT_HIGH_RISK: &str = "HighRiskTransaction";
/// Application property holding the comma-joined trigger reasons.
pub const REASON_PROPERTY: &str = "Reason";

/// The fixed set of logical queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Queue {
    Inbound,
    HighRisk,
    Validated,
    Routing,
    Fraud,
    Audit,
    Approval,
}

impl Queue {
    pub const ALL: [Queue; 7] = [
        Queue::Inbound,
        Queue::HighRisk,
        Queue::Validated,
        Queue::Routing,
        Queue::Fraud,
        Queue::Audit,
        Queue::Approval,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Queue::Inbound => "transactions-inbound",
            Queue::HighRisk => "transactions-highrisk",
            Queue::Validated => "transactions-validated",
            Queue::Routing => "transactions-routing",
            Queue::Fraud => "transactions-fraud",
            Queue::Audit => "transactions-audit",
            Queue::Approval => "transactions-approval",
        }
    }

    /// Name of the queue's dead-letter sub-queue.
    pub fn dead_letter_name(&self) -> String {
        format!("{}/$DeadLetterQueue", self.name())
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MessageBody {
    TransactionId(String),
    Transaction(Box<Transaction>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeadLetterReason {
    /// Structural validation rejected the transaction.
    ValidationFailed,
    /// The handler could not complete (store, broker or unexpected failure).
    ProcessingError,
    /// Broker-side: the message was delivered too many times.
    MaxDeliveryCountExceeded,
}

impl DeadLetterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadLetterReason::ValidationFailed => "ValidationFailed",
            DeadLetterReason::ProcessingError => "ProcessingError",
            DeadLetterReason::MaxDeliveryCountExceeded => "MaxDeliveryCountExceeded",
        }
    }
}

impl fmt::Display for DeadLetterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterInfo {
    pub reason: DeadLetterReason,
    pub description: String,
    /// Snapshot of the transaction when the handler managed to read it.
    pub transaction: Option<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: Uuid,
    pub subject: Option<String>,
    pub body: MessageBody,
    pub properties: BTreeMap<String, String>,
    pub enqueued_at: DateTime<Utc>,
    /// Incremented by the broker on every receive.
    pub delivery_count: u32,
    pub dead_letter: Option<DeadLetterInfo>,
}

impl Message {
    fn with_body(body: MessageBody) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            subject: None,
            body,
            properties: BTreeMap::new(),
            enqueued_at: Utc::now(),
            delivery_count: 0,
            dead_letter: None,
        }
    }

    /// A main-path message carrying only the transaction id.
    pub fn pointer(transaction_id: impl Into<String>) -> Self {
        Self::with_body(MessageBody::TransactionId(transaction_id.into()))
    }

    /// A side-channel message carrying the full transaction, a subject and
    /// the comma-joined reasons under [`REASON_PROPERTY`].
    pub fn payload(transaction: Transaction, subject: &str, reasons: &[String]) -> Self {
        let mut message = Self::with_body(MessageBody::Transaction(Box::new(transaction)));
        message.subject = Some(subject.to_string());
        message
            .properties
            .insert(REASON_PROPERTY.to_string(), reasons.join(","));
        message
    }

    pub fn transaction_id(&self) -> &str {
        match &self.body {
            MessageBody::TransactionId(id) => id,
            MessageBody::Transaction(tx) => &tx.id,
        }
    }

    /// The reasons attached under [`REASON_PROPERTY`], if any.
    pub fn reasons(&self) -> Vec<&str> {
        self.properties
            .get(REASON_PROPERTY)
            .map(|joined| joined.split(',').filter(|r| !r.is_empty()).collect())
            .unwrap_or_default()
    }
}

/// A message handed to one consumer under an exclusive lock.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub queue: Queue,
    pub lock_token: Uuid,
    pub message: Message,
}

impl Delivery {
    pub fn transaction_id(&self) -> &str {
        self.message.transaction_id()
    }
}
