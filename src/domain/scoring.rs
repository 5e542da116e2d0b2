//! Risk scoring policies used by the enricher stage.

use super::rules::is_high_risk_currency;
use super::transaction::Transaction;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;

pub const MAX_RISK_SCORE: u32 = 100;

/// Computes a risk score for a transaction.
///
/// The policy is replaceable: production may use a randomised or external
/// model, tests substitute a deterministic one.
pub trait RiskScorer: Send + Sync {
    fn score(&self, tx: &Transaction) -> u32;
}

/// Uniformly random score in `1..100`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRiskScorer;

impl RiskScorer for RandomRiskScorer {
    fn score(&self, _tx: &Transaction) -> u32 {
        rand::thread_rng().gen_range(1..100)
    }
}

/// Deterministic score: one point per 200 units up to 70, plus 30 for a
/// high-risk currency.
#[derive(Debug, Default, Clone, Copy)]
pub struct AmountRiskScorer;

const AMOUNT_POINT: Decimal = dec!(200);
const AMOUNT_POINTS_CAP: u32 = 70;
const CURRENCY_POINTS: u32 = 30;

impl RiskScorer for AmountRiskScorer {
    fn score(&self, tx: &Transaction) -> u32 {
        let amount_points = (tx.amount.max(Decimal::ZERO) / AMOUNT_POINT)
            .floor()
            .min(Decimal::from(AMOUNT_POINTS_CAP))
            .to_u32()
            .unwrap_or(0);
        let currency_points = if is_high_risk_currency(&tx.currency) {
            CURRENCY_POINTS
        } else {
            0
        };
        (amount_points + currency_points).min(MAX_RISK_SCORE)
    }
}

/// Always returns the same score.
#[derive(Debug, Clone, Copy)]
pub struct FixedRiskScorer(pub u32);

impl RiskScorer for FixedRiskScorer {
    fn score(&self, _tx: &Transaction) -> u32 {
        self.0
    }
}
