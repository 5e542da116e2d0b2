//! Validation rule sets applied by the validator stage.
//!
//! Structural violations reject a transaction outright. Risk rules only flag
//! it; a flagged transaction still continues down the main path.

use super::transaction::Transaction;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const MISSING_ID: &str = "Missing transaction ID.";
pub const NON_POSITIVE_AMOUNT: &str = "Amount must be greater than zero.";
pub const HIGH_RISK_AMOUNT: &str = "Transaction contains high risk amount.";
pub const HIGH_RISK_CURRENCY: &str = "Transaction contains a high-risk cryptocurrency.";

/// Amounts strictly above this are flagged as high risk.
pub const HIGH_RISK_AMOUNT_THRESHOLD: Decimal = dec!(1000);

/// Currency codes flagged as high risk, compared case-insensitively.
pub const HIGH_RISK_CURRENCIES: [&str; 10] = [
    "BTC", "ETH", "USDT", "BNB", "XRP", "SOL", "ADA", "DOGE", "DOT", "TRX",
];

/// A set of rules evaluated against one transaction.
///
/// Returns the messages of every rule the transaction violates, in rule
/// order. An empty list means the transaction passes.
pub trait RuleSet: Send + Sync {
    fn violations(&self, tx: &Transaction) -> Vec<String>;
}

pub fn is_high_risk_currency(currency: &str) -> bool {
    let currency = currency.trim();
    HIGH_RISK_CURRENCIES
        .iter()
        .any(|code| code.eq_ignore_ascii_case(currency))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralRules;

impl RuleSet for StructuralRules {
    fn violations(&self, tx: &Transaction) -> Vec<String> {
        let mut violations = Vec::new();
        if tx.id.trim().is_empty() {
            violations.push(MISSING_ID.to_string());
        }
        if tx.amount <= Decimal::ZERO {
            violations.push(NON_POSITIVE_AMOUNT.to_string());
        }
        violations
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RiskRules;

impl RuleSet for RiskRules {
    fn violations(&self, tx: &Transaction) -> Vec<String> {
        let mut reasons = Vec::new();
        if tx.amount > HIGH_RISK_AMOUNT_THRESHOLD {
            reasons.push(HIGH_RISK_AMOUNT.to_string());
        }
        if is_high_risk_currency(&tx.currency) {
            reasons.push(HIGH_RISK_CURRENCY.to_string());
        }
        reasons
    }
}
