use crate::domain::ports::TransactionStore;
use crate::domain::transaction::Transaction;
use crate::error::{PipelineError, Result, StoreError};
use tracing::debug;

/// Reads a transaction, applies `mutate` and replaces it against the revision
/// that was read.
///
/// On a revision conflict the document is re-read and `mutate` reapplied, up
/// to `attempts` times in total. `mutate` returns whether it changed
/// anything; an unchanged document is not written back.
pub async fn read_modify_replace<F>(
    store: &dyn TransactionStore,
    id: &str,
    attempts: u32,
    mut mutate: F,
) -> Result<Transaction>
where
    F: FnMut(&mut Transaction) -> bool + Send,
{
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        let stored = store.read(id).await?;
        let mut tx = stored.transaction;
        if !mutate(&mut tx) {
            return Ok(tx);
        }
        match store.replace(tx.clone(), stored.revision).await {
            Ok(_) => return Ok(tx),
            Err(StoreError::Conflict { expected, actual, .. }) => {
                debug!(
                    transaction_id = %id,
                    attempt,
                    %expected,
                    %actual,
                    "Replace conflicted, re-reading"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(PipelineError::ConflictRetriesExhausted {
        id: id.to_string(),
        attempts,
    })
}
