//! Fraud scoring
//!
//! Scoring is simulated: a latency model shaped like a real scoring engine
//! (base delay, jitter, rare long tail) followed by a uniform risk score.
//! The verdict rule itself is pure and tested separately from the latency.

use std::time::Duration;

use loadlab_domain::{constants, FraudVerdict, PaymentEvent};
use rand::Rng;
use tracing::{info, warn};

/// Scores payment events for fraud.
#[derive(Debug, Clone, Copy, Default)]
pub struct FraudAnalyzer;

impl FraudAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Score one payment event, simulating the engine's latency profile.
    pub async fn analyze(&self, event: &PaymentEvent) -> FraudVerdict {
        let mut delay = constants::SCORING_BASE_DELAY;
        delay += Duration::from_millis(
            rand::thread_rng().gen_range(0..=constants::SCORING_JITTER_MAX_MS),
        );
        if rand::thread_rng().gen::<f64>() < constants::SCORING_TAIL_PROBABILITY {
            delay += constants::SCORING_TAIL_EXTRA;
            warn!(
                payment_id = %event.payment_id,
                delay_ms = delay.as_millis() as u64,
                "slow scoring simulated"
            );
        }
        tokio::time::sleep(delay).await;

        let risk_score = rand::thread_rng().gen::<f64>() * constants::RISK_SCORE_MAX;
        let verdict = Self::verdict(event, risk_score);

        if verdict.fraud_detected {
            warn!(
                payment_id = %verdict.payment_id,
                risk_score = verdict.risk_score,
                correlation_id = %verdict.correlation_id,
                "fraud detected"
            );
        } else {
            info!(
                payment_id = %verdict.payment_id,
                risk_score = verdict.risk_score,
                correlation_id = %verdict.correlation_id,
                "payment scored clean"
            );
        }

        verdict
    }

    /// Apply the verdict rule to a known score.
    pub fn verdict(event: &PaymentEvent, risk_score: f64) -> FraudVerdict {
        FraudVerdict {
            payment_id: event.payment_id.clone(),
            risk_score,
            fraud_detected: risk_score > constants::FRAUD_SCORE_THRESHOLD,
            correlation_id: event.correlation_id.clone(),
        }
    }
}
