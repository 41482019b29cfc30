//! Confidence Classifier
//!
//! Confidence reflects agreement between models, not the magnitude of the
//! risk score: a unanimous "authentic" verdict is as confident as a
//! unanimous "deepfake" verdict.

use crate::types::ConfidenceTier;
use veritas_common::EnsemblePolicy;

#[derive(Debug, Clone)]
pub struct ConfidenceClassifier {
    high_threshold: u8,
    medium_threshold: u8,
}

impl ConfidenceClassifier {
    pub fn new(policy: &EnsemblePolicy) -> Self {
        Self {
            high_threshold: policy.high_confidence_threshold,
            medium_threshold: policy.medium_confidence_threshold,
        }
    }

    /// Map `(overall_score, agreement_score)` to a confidence tier
    ///
    /// `overall_score` does not influence the tier.
    pub fn classify(&self, _overall_score: u8, agreement_score: u8) -> ConfidenceTier {
        if agreement_score >= self.high_threshold {
            ConfidenceTier::High
        } else if agreement_score >= self.medium_threshold {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

impl Default for ConfidenceClassifier {
    fn default() -> Self {
        Self::new(&EnsemblePolicy::default())
    }
}
