//! Ensemble stage
//!
//! Aggregator → Classifier → Assembler. Pure computation over the dispatch
//! outcome; no I/O.

pub mod aggregator;
pub mod assembler;
pub mod classifier;

pub use aggregator::{Aggregate, EnsembleAggregator};
pub use assembler::ResultAssembler;
pub use classifier::ConfidenceClassifier;
