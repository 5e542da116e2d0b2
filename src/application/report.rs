//! Snapshot of where transactions ended up, for operators.

use crate::domain::message::{Message, MessageBody, Queue};
use crate::domain::ports::{MessageBroker, TransactionStore};
use crate::domain::transaction::Transaction;
use crate::error::{Result, StoreError};
use rust_decimal::Decimal;
use serde::Serialize;

/// Queues whose messages have left the main path.
const TERMINAL_QUEUES: [Queue; 4] = [Queue::Fraud, Queue::Audit, Queue::Approval, Queue::HighRisk];

/// One message found on a terminal or dead-letter queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub queue: String,
    pub transaction_id: String,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub risk_score: Option<u32>,
    pub tags: String,
    pub subject: Option<String>,
    pub reason: Option<String>,
    pub description: Option<String>,
}

impl ReportRow {
    fn new(queue: String, message: &Message, tx: Option<&Transaction>) -> Self {
        Self {
            queue,
            transaction_id: message.transaction_id().to_string(),
            amount: tx.map(|t| t.amount),
            currency: tx.map(|t| t.currency.clone()),
            risk_score: tx.map(|t| t.risk_score),
            tags: tx.map(|t| t.tags.join(";")).unwrap_or_default(),
            subject: message.subject.clone(),
            reason: None,
            description: None,
        }
    }
}

/// Payload messages describe themselves; pointer messages are resolved
/// against the store.
async fn resolve(store: &dyn TransactionStore, message: &Message) -> Result<Option<Transaction>> {
    match &message.body {
        MessageBody::Transaction(tx) => Ok(Some(tx.as_ref().clone())),
        MessageBody::TransactionId(id) => match store.read(id).await {
            Ok(stored) => Ok(Some(stored.transaction)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        },
    }
}

/// Collects every message on the terminal queues, then every dead letter,
/// without consuming anything.
pub async fn snapshot(store: &dyn TransactionStore, broker: &dyn MessageBroker) -> Result<Vec<ReportRow>> {
    let mut rows = Vec::new();

    for queue in TERMINAL_QUEUES {
        for message in broker.peek(queue, usize::MAX).await? {
            let tx = resolve(store, &message).await?;
            let mut row = ReportRow::new(queue.name().to_string(), &message, tx.as_ref());
            if !message.properties.is_empty() {
                row.reason = Some(message.reasons().join(";"));
            }
            rows.push(row);
        }
    }

    for queue in Queue::ALL {
        for message in broker.peek_dead_letters(queue, usize::MAX).await? {
            let info = message.dead_letter.clone();
            let tx = match info.as_ref().and_then(|i| i.transaction.clone()) {
                Some(tx) => Some(tx),
                None => resolve(store, &message).await?,
            };
            let mut row = ReportRow::new(queue.dead_letter_name(), &message, tx.as_ref());
            if let Some(info) = info {
                row.reason = Some(info.reason.to_string());
                row.description = Some(info.description);
            }
            rows.push(row);
        }
    }

    Ok(rows)
}
