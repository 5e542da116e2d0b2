use thiserror::Error;

use crate::domain::message::Queue;
use crate::domain::transaction::Revision;

/// Failures raised by a [`TransactionStore`](crate::domain::ports::TransactionStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Transaction {0} not found")]
    NotFound(String),
    #[error("Transaction {0} already exists")]
    AlreadyExists(String),
    #[error("Revision conflict on transaction {id}: expected {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: Revision,
        actual: Revision,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Failures raised by a [`MessageBroker`](crate::domain::ports::MessageBroker).
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Lock {lock_token} on queue {queue} is no longer held")]
    LockLost { queue: Queue, lock_token: uuid::Uuid },
    #[error("Broker backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Gave up replacing transaction {id} after {attempts} conflicting attempts")]
    ConflictRetriesExhausted { id: String, attempts: u32 },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_names_both_revisions() {
        let err = StoreError::Conflict {
            id: "tx-1".to_string(),
            expected: Revision::new(2),
            actual: Revision::new(3),
        };
        assert_eq!(
            err.to_string(),
            "Revision conflict on transaction tx-1: expected 2, found 3"
        );
    }

    #[test]
    fn test_store_error_converts_into_pipeline_error() {
        let err: PipelineError = StoreError::NotFound("tx-9".to_string()).into();
        assert!(matches!(err, PipelineError::Store(StoreError::NotFound(_))));
        assert_eq!(err.to_string(), "Store error: Transaction tx-9 not found");
    }
}
