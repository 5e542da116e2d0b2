use crate::domain::ports::TransactionStore;
use crate::domain::transaction::{Revision, StoredTransaction, Transaction};
use crate::error::StoreError;
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family holding transaction documents.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent transaction store backed by RocksDB.
///
/// Documents are stored as JSON [`StoredTransaction`] values keyed by id.
/// RocksDB has no compare-and-set, so creates and replaces are serialised
/// through a write lock shared by every clone of the store.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn load(&self, id: &str) -> Result<Option<StoredTransaction>, StoreError> {
        let cf = self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
            StoreError::Backend("Transactions column family not found".to_string())
        })?;
        match self.db.get_pinned_cf(&cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, stored: &StoredTransaction) -> Result<(), StoreError> {
        let cf = self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
            StoreError::Backend("Transactions column family not found".to_string())
        })?;
        let value = serde_json::to_vec(stored)?;
        self.db.put_cf(&cf, stored.transaction.id.as_bytes(), value)?;
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn create(&self, tx: Transaction) -> Result<Revision, StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.load(&tx.id)?.is_some() {
            return Err(StoreError::AlreadyExists(tx.id));
        }
        self.save(&StoredTransaction {
            revision: Revision::INITIAL,
            transaction: tx,
        })?;
        Ok(Revision::INITIAL)
    }

    async fn read(&self, id: &str) -> Result<StoredTransaction, StoreError> {
        self.load(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn replace(&self, tx: Transaction, expected: Revision) -> Result<Revision, StoreError> {
        let _guard = self.write_lock.lock().await;
        let current = self
            .load(&tx.id)?
            .ok_or_else(|| StoreError::NotFound(tx.id.clone()))?;
        if current.revision != expected {
            return Err(StoreError::Conflict {
                id: tx.id,
                expected,
                actual: current.revision,
            });
        }
        let revision = current.revision.next();
        self.save(&StoredTransaction {
            revision,
            transaction: tx,
        })?;
        Ok(revision)
    }
}
