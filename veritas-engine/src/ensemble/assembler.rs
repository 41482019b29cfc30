//! Result Assembler
//!
//! Final stage of a detection request: aggregates the dispatch outcome,
//! classifies confidence, stamps the deepfake flag, id and timing, and
//! produces the immutable `EnhancedDetectionResult`. Zero successful results
//! is surfaced as `DetectionError::NoResults`, never as a synthetic score.

use super::{ConfidenceClassifier, EnsembleAggregator};
use crate::dispatcher::DispatchOutcome;
use crate::types::{DetectionError, EnhancedDetectionResult};
use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;
use veritas_common::EnsemblePolicy;

#[derive(Debug, Clone)]
pub struct ResultAssembler {
    aggregator: EnsembleAggregator,
    classifier: ConfidenceClassifier,
    deepfake_threshold: u8,
}

impl ResultAssembler {
    pub fn new(policy: EnsemblePolicy) -> Self {
        Self {
            classifier: ConfidenceClassifier::new(&policy),
            deepfake_threshold: policy.deepfake_threshold,
            aggregator: EnsembleAggregator::new(policy),
        }
    }

    /// Build the final result for a dispatch that started at `started`
    ///
    /// Model results and failures are sorted by model id so the output is
    /// deterministic regardless of completion order.
    ///
    /// # Errors
    /// `DetectionError::NoResults` (carrying every failure) when no model
    /// produced a result.
    pub fn assemble(
        &self,
        outcome: DispatchOutcome,
        started: Instant,
    ) -> Result<EnhancedDetectionResult, DetectionError> {
        let DispatchOutcome {
            mut results,
            mut failures,
            attempted,
        } = outcome;
        failures.sort_by(|a, b| a.model_id.cmp(&b.model_id));

        let Some(aggregate) = self.aggregator.aggregate(&results) else {
            return Err(DetectionError::NoResults { failures });
        };
        results.sort_by(|a, b| a.model_id.cmp(&b.model_id));

        let confidence = self
            .classifier
            .classify(aggregate.overall_score, aggregate.analysis.agreement_score);

        Ok(EnhancedDetectionResult {
            id: Uuid::new_v4(),
            is_deepfake: aggregate.overall_score > self.deepfake_threshold,
            overall_score: aggregate.overall_score,
            confidence,
            model_results: results,
            failures,
            ensemble_analysis: aggregate.analysis,
            processing_time_ms: started.elapsed().as_millis() as u64,
            requested_models: attempted,
            created_at: Utc::now(),
        })
    }
}

impl Default for ResultAssembler {
    fn default() -> Self {
        Self::new(EnsemblePolicy::default())
    }
}
