//! Report generation over a set of AARs.

use tracing::{debug, info};

use super::categories::BucketConfig;
use super::classifier::classify;
use super::scorer::InsightScorer;
use crate::config::InsightsConfig;
use crate::constants::insights::INSUFFICIENT_DATA_CATEGORY;
use crate::types::{Aar, Bucket, InsightReport, Level, Trend, collect_bucket};

/// Produces an insight report from AARs the caller may already see.
///
/// Implementations must be pure with respect to their input: access
/// filtering happens before this call.
pub trait InsightAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze(&self, aars: &[Aar]) -> InsightReport;
}

/// Deterministic keyword-and-frequency analyzer.
pub struct RuleBasedAnalyzer {
    scorer: InsightScorer,
    sustain: BucketConfig,
    improve: BucketConfig,
    action: BucketConfig,
}

impl Default for RuleBasedAnalyzer {
    fn default() -> Self {
        Self::new(InsightsConfig::default())
    }
}

impl RuleBasedAnalyzer {
    pub fn new(config: InsightsConfig) -> Self {
        Self {
            scorer: InsightScorer::new(config),
            sustain: BucketConfig::sustain(),
            improve: BucketConfig::improve(),
            action: BucketConfig::action(),
        }
    }

    /// Replace the keyword registry for one bucket.
    pub fn with_bucket_config(mut self, config: BucketConfig) -> Self {
        match config.bucket {
            Bucket::Sustain => self.sustain = config,
            Bucket::Improve => self.improve = config,
            Bucket::Action => self.action = config,
        }
        self
    }

    /// Placeholder report for fewer AARs than the analysis minimum.
    /// Frequency is the exact AAR count.
    pub fn insufficient_data(&self, count: usize) -> InsightReport {
        let min = self.scorer.config().min_aars;
        let description = if count == 0 {
            "No AARs are available for analysis.".to_string()
        } else {
            format!(
                "Only {} AAR{} submitted; at least {} are needed to identify trends.",
                count,
                if count == 1 { "" } else { "s" },
                min
            )
        };

        InsightReport {
            trends: vec![Trend {
                category: INSUFFICIENT_DATA_CATEGORY.to_string(),
                description,
                frequency: count,
                severity: Level::Low,
            }],
            friction_points: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

impl InsightAnalyzer for RuleBasedAnalyzer {
    fn name(&self) -> &'static str {
        "rule-based"
    }

    fn analyze(&self, aars: &[Aar]) -> InsightReport {
        let live: Vec<&Aar> = aars.iter().filter(|a| !a.is_deleted).collect();

        if live.len() < self.scorer.config().min_aars {
            debug!(aars = live.len(), "Too few AARs for categorization");
            return self.insufficient_data(live.len());
        }

        let sustain = classify(&collect_bucket(live.iter().copied(), Bucket::Sustain), &self.sustain);
        let improve = classify(&collect_bucket(live.iter().copied(), Bucket::Improve), &self.improve);
        let action = classify(&collect_bucket(live.iter().copied(), Bucket::Action), &self.action);

        let report = InsightReport {
            trends: self.scorer.score_trends(&sustain),
            friction_points: self.scorer.score_friction(&improve),
            recommendations: self.scorer.score_recommendations(&action),
        };

        info!(
            aars = live.len(),
            trends = report.trends.len(),
            friction = report.friction_points.len(),
            recommendations = report.recommendations.len(),
            "Generated insight report"
        );

        report
    }
}
