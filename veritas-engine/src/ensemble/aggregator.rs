//! Ensemble Aggregator
//!
//! Combines the successful model scores into one overall score and an
//! agreement analysis. Every statistic is order-independent, so results may
//! arrive in any completion order.

use crate::types::{EnsembleAnalysis, ModelResult, RecommendedAction};
use veritas_common::EnsemblePolicy;

/// Maximum possible spread of scores on the 0-100 scale
const MAX_SPREAD: f64 = 100.0;

/// Aggregation output: overall score plus agreement analysis
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub overall_score: u8,
    pub analysis: EnsembleAnalysis,
}

/// Ensemble Aggregator
///
/// **Decision rule:**
/// - `reject` when `overall >= reject_threshold` and consensus reached
/// - `accept` when `overall <= accept_threshold` and consensus reached
/// - `review` otherwise (including every case without consensus)
#[derive(Debug, Clone)]
pub struct EnsembleAggregator {
    policy: EnsemblePolicy,
}

impl EnsembleAggregator {
    pub fn new(policy: EnsemblePolicy) -> Self {
        Self { policy }
    }

    /// Aggregate successful results
    ///
    /// Returns `None` for an empty set; there is no meaningful ensemble
    /// over zero models.
    pub fn aggregate(&self, results: &[ModelResult]) -> Option<Aggregate> {
        let scores: Vec<u8> = results.iter().map(|r| r.score).collect();
        let overall_score = mean_score(&scores)?;
        let agreement_score = agreement_score(&scores);
        let consensus_reached = agreement_score >= self.policy.consensus_threshold;
        let recommended_action = self.recommend(overall_score, consensus_reached);

        Some(Aggregate {
            overall_score,
            analysis: EnsembleAnalysis {
                agreement_score,
                consensus_reached,
                recommended_action,
                explanation: explain(
                    recommended_action,
                    consensus_reached,
                    scores.len(),
                    overall_score,
                    agreement_score,
                ),
            },
        })
    }

    fn recommend(&self, overall_score: u8, consensus_reached: bool) -> RecommendedAction {
        if !consensus_reached {
            RecommendedAction::Review
        } else if overall_score >= self.policy.reject_threshold {
            RecommendedAction::Reject
        } else if overall_score <= self.policy.accept_threshold {
            RecommendedAction::Accept
        } else {
            RecommendedAction::Review
        }
    }
}

impl Default for EnsembleAggregator {
    fn default() -> Self {
        Self::new(EnsemblePolicy::default())
    }
}

/// Arithmetic mean rounded to the nearest integer (halves round up)
pub fn mean_score(scores: &[u8]) -> Option<u8> {
    if scores.is_empty() {
        return None;
    }
    let sum: f64 = scores.iter().map(|&s| f64::from(s)).sum();
    Some((sum / scores.len() as f64).round().clamp(0.0, 100.0) as u8)
}

/// 100 minus the population standard deviation normalized by `MAX_SPREAD`
///
/// A single score (or all-identical scores) yields 100.
pub fn agreement_score(scores: &[u8]) -> u8 {
    if scores.len() < 2 {
        return 100;
    }
    let n = scores.len() as f64;
    let mean = scores.iter().map(|&s| f64::from(s)).sum::<f64>() / n;
    let variance = scores
        .iter()
        .map(|&s| (f64::from(s) - mean).powi(2))
        .sum::<f64>()
        / n;
    let normalized_spread = variance.sqrt() / MAX_SPREAD * 100.0;

    (100.0 - normalized_spread).round().clamp(0.0, 100.0) as u8
}

fn explain(
    action: RecommendedAction,
    consensus_reached: bool,
    model_count: usize,
    overall_score: u8,
    agreement_score: u8,
) -> String {
    let basis = if model_count == 1 {
        "A single model".to_string()
    } else {
        format!("{} models", model_count)
    };

    match (action, consensus_reached) {
        (RecommendedAction::Reject, _) if model_count == 1 => format!(
            "{} rated this content {} / 100, a strong indication of manipulation. \
             No corroborating models responded; rejection is based on one opinion.",
            basis, overall_score
        ),
        (RecommendedAction::Reject, _) => format!(
            "{} agree ({}% agreement) that this content is likely manipulated, \
             with an overall risk of {} / 100.",
            basis, agreement_score, overall_score
        ),
        (RecommendedAction::Accept, _) if model_count == 1 => format!(
            "{} rated this content {} / 100 and found no significant signs of manipulation. \
             No corroborating models responded.",
            basis, overall_score
        ),
        (RecommendedAction::Accept, _) => format!(
            "{} agree ({}% agreement) that this content appears authentic, \
             with an overall risk of {} / 100.",
            basis, agreement_score, overall_score
        ),
        (RecommendedAction::Review, false) => format!(
            "{} disagree ({}% agreement) on this content; the overall risk of {} / 100 \
             is not reliable enough to act on without human review.",
            basis, agreement_score, overall_score
        ),
        (RecommendedAction::Review, true) => format!(
            "{} broadly agree ({}% agreement), but the overall risk of {} / 100 is \
             inconclusive. Human review is recommended.",
            basis, agreement_score, overall_score
        ),
    }
}
