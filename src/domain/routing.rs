use super::message::Queue;
use super::transaction::Transaction;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk scores strictly above this go to fraud review.
pub const FRAUD_RISK_THRESHOLD: u32 = 80;
/// Amounts strictly above this go to audit.
pub const AUDIT_AMOUNT_THRESHOLD: Decimal = dec!(10000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Fraud,
    Audit,
    Approval,
}

impl Destination {
    /// Risk takes precedence over amount.
    pub fn classify(tx: &Transaction) -> Self {
        if tx.risk_score > FRAUD_RISK_THRESHOLD {
            Destination::Fraud
        } else if tx.amount > AUDIT_AMOUNT_THRESHOLD {
            Destination::Audit
        } else {
            Destination::Approval
        }
    }

    pub fn queue(&self) -> Queue {
        match self {
            Destination::Fraud => Queue::Fraud,
            Destination::Audit => Queue::Audit,
            Destination::Approval => Queue::Approval,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Fraud => "fraud",
            Destination::Audit => "audit",
            Destination::Approval => "approval",
        }
    }

    /// Stage-history marker appended when routing to this destination.
    pub fn tag(&self) -> String {
        format!("routed:{}", self.as_str())
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
