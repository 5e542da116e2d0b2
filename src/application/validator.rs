use super::worker::{Disposition, StageHandler};
use crate::domain::message::{
    DeadLetterInfo, DeadLetterReason, Delivery, Message, Queue, SUBJECT_HIGH_RISK,
};
use crate::domain::ports::{MessageBrokerRef, TransactionStoreRef};
use crate::domain::rules::{RiskRules, RuleSet, StructuralRules};
use crate::domain::transaction::Transaction;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Forwarded to the validated queue. Non-empty `risk_reasons` means a
    /// copy was also published to the high-risk side channel.
    Accepted { risk_reasons: Vec<String> },
    /// Structurally invalid; the pipeline stops for this transaction.
    Rejected {
        reasons: Vec<String>,
        transaction: Transaction,
    },
}

impl ValidationOutcome {
    pub fn is_risk_flagged(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted { risk_reasons } if !risk_reasons.is_empty())
    }
}

/// First stage: structural and risk validation of submitted transactions.
pub struct Validator {
    store: TransactionStoreRef,
    broker: MessageBrokerRef,
    structural: StructuralRules,
    risk: RiskRules,
}

impl Validator {
    pub fn new(store: TransactionStoreRef, broker: MessageBrokerRef) -> Self {
        Self {
            store,
            broker,
            structural: StructuralRules,
            risk: RiskRules,
        }
    }

    /// Validates one transaction and performs the publications its outcome
    /// calls for. A rejected transaction is not forwarded anywhere; settling
    /// its message is left to the caller.
    pub async fn validate(&self, transaction_id: &str) -> Result<ValidationOutcome> {
        let tx = self.load(transaction_id).await?;
        self.check(tx).await
    }

    async fn load(&self, transaction_id: &str) -> Result<Transaction> {
        Ok(self.store.read(transaction_id).await?.transaction)
    }

    async fn check(&self, tx: Transaction) -> Result<ValidationOutcome> {
        let violations = self.structural.violations(&tx);
        if !violations.is_empty() {
            return Ok(ValidationOutcome::Rejected {
                reasons: violations,
                transaction: tx,
            });
        }

        // The side channel only ever names transactions that were forwarded.
        self.broker
            .send(Queue::Validated, Message::pointer(tx.id.as_str()))
            .await?;
        info!(transaction_id = %tx.id, "Transaction validated and forwarded");

        let risk_reasons = self.risk.violations(&tx);
        if !risk_reasons.is_empty() {
            warn!(
                transaction_id = %tx.id,
                reasons = ?risk_reasons,
                "Transaction flagged as high risk"
            );
            self.broker
                .send(
                    Queue::HighRisk,
                    Message::payload(tx, SUBJECT_HIGH_RISK, &risk_reasons),
                )
                .await?;
        }

        Ok(ValidationOutcome::Accepted { risk_reasons })
    }
}

#[async_trait]
impl StageHandler for Validator {
    fn name(&self) -> &'static str {
        "validator"
    }

    fn input(&self) -> Queue {
        Queue::Inbound
    }

    async fn handle(&self, delivery: &Delivery) -> Disposition {
        let id = delivery.transaction_id();
        info!(transaction_id = %id, "Received transaction for validation");

        let tx = match self.load(id).await {
            Ok(tx) => tx,
            Err(e) => return processing_error(id, e, None),
        };

        match self.check(tx.clone()).await {
            Ok(ValidationOutcome::Accepted { .. }) => Disposition::Complete,
            Ok(ValidationOutcome::Rejected {
                reasons,
                transaction,
            }) => Disposition::DeadLetter(DeadLetterInfo {
                reason: DeadLetterReason::ValidationFailed,
                description: format!(
                    "Transaction validation failed for ID {id}. Reasons: {}",
                    reasons.join(", ")
                ),
                transaction: Some(transaction),
            }),
            Err(e) => processing_error(id, e, Some(tx)),
        }
    }
}

fn processing_error(id: &str, e: PipelineError, transaction: Option<Transaction>) -> Disposition {
    error!(transaction_id = %id, error = %e, "Failed to validate transaction");
    Disposition::DeadLetter(DeadLetterInfo {
        reason: DeadLetterReason::ProcessingError,
        description: e.to_string(),
        transaction,
    })
}
