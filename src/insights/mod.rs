//! AAR Insight Engine
//!
//! Pipeline: collect each bucket across AARs → first-match keyword
//! classification → frequency scoring → templated descriptions.
//!
//! Output is deterministic for a given input and sample seed.

pub mod analyzer;
pub mod categories;
pub mod classifier;
pub mod scorer;
pub mod sentences;

pub use analyzer::{InsightAnalyzer, RuleBasedAnalyzer};
pub use categories::{BucketConfig, CategoryRule};
pub use classifier::{ClassifiedItems, classify};
pub use scorer::InsightScorer;
pub use sentences::{SentenceSampler, split_sentences};
