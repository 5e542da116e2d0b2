use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Concurrency token of a stored document.
///
/// Every successful create or replace yields a new revision. A replace must
/// present the revision it read, otherwise the store reports a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Revision(u64);

impl Revision {
    pub const INITIAL: Self = Self(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single domain entity moved through the pipeline.
///
/// Only `risk_score` and `tags` change after creation, and both only grow:
/// the score is combined with [`Transaction::raise_risk_score`] and tags are
/// appended with [`Transaction::add_tag`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub risk_score: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Transaction {
    /// Creates a fresh transaction with a newly assigned id.
    pub fn new(
        from_account: impl Into<String>,
        to_account: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from_account: from_account.into(),
            to_account: to_account.into(),
            amount,
            currency: currency.into(),
            created_at: Utc::now(),
            risk_score: 0,
            tags: Vec::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Appends `tag` unless it is already present. Returns whether it was added.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.has_tag(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Sets the risk score, never lowering a previously stored one.
    pub fn raise_risk_score(&mut self, score: u32) {
        self.risk_score = self.risk_score.max(score);
    }
}

/// A transaction as read from the store, paired with its revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub revision: Revision,
    pub transaction: Transaction,
}
