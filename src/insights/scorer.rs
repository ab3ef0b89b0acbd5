//! Insight scoring: turns classified items into ranked report entries.
//!
//! Every label comes from a share `frequency / denominator` checked against
//! strict thresholds:
//!
//! | Output         | Denominator            | High  | Medium |
//! |----------------|------------------------|-------|--------|
//! | Trend severity | sustain items          | > 0.7 | > 0.3  |
//! | Friction impact| improve items          | > 0.5 | > 0.2  |
//! | Priority       | see [`PriorityBasis`]  | > 0.6 | > 0.3  |

use tracing::debug;

use super::classifier::ClassifiedItems;
use super::sentences::SentenceSampler;
use crate::config::{InsightsConfig, PriorityBasis};
use crate::constants::thresholds;
use crate::types::{AarItem, FrictionPoint, Level, Recommendation, Trend};

/// Fixed recommendation text per action category
const CANNED_RECOMMENDATIONS: &[(&str, &str)] = &[
    (
        "Communication",
        "Standardize radio procedures and rehearse the PACE plan before every operation.",
    ),
    (
        "Training",
        "Schedule focused drills on the identified skill gaps and track proficiency over time.",
    ),
    (
        "Equipment",
        "Run pre-combat inspections and maintenance checks so equipment is ready before step-off.",
    ),
    (
        "Planning",
        "Allocate more time for planning and conduct full rehearsals before execution.",
    ),
    (
        "Leadership",
        "Reinforce leader development through mentoring and clear delegation of responsibilities.",
    ),
    (
        "Safety",
        "Review risk assessments and brief mitigation measures to every participant.",
    ),
];

pub fn canned_recommendation(category: &str) -> Option<&'static str> {
    CANNED_RECOMMENDATIONS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, text)| *text)
}

fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// "a; b; c." or empty when there are no examples
fn join_examples(examples: &[String]) -> String {
    if examples.is_empty() {
        String::new()
    } else {
        format!(": {}.", examples.join("; "))
    }
}

pub struct InsightScorer {
    config: InsightsConfig,
}

impl InsightScorer {
    pub fn new(config: InsightsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    fn sampler(&self) -> SentenceSampler {
        SentenceSampler::new(
            self.config.sample_seed,
            self.config.max_examples,
            self.config.sentence_min_len,
            self.config.sentence_max_len,
        )
    }

    fn examples(sampler: &mut SentenceSampler, items: &[AarItem]) -> String {
        join_examples(&sampler.sample(items))
    }

    /// Sustain categories ranked by frequency, highest first.
    pub fn score_trends(&self, classified: &ClassifiedItems) -> Vec<Trend> {
        let total = classified.total_items();
        let mut sampler = self.sampler();

        let mut trends: Vec<Trend> = classified
            .iter()
            .map(|(category, items)| {
                let frequency = items.len();
                Trend {
                    category: category.to_string(),
                    description: format!(
                        "{} was a recurring strength ({}){}",
                        category,
                        plural(frequency, "mention"),
                        Self::examples(&mut sampler, items)
                    ),
                    frequency,
                    severity: Level::from_share(
                        share(frequency, total),
                        thresholds::TREND_HIGH,
                        thresholds::TREND_MEDIUM,
                    ),
                }
            })
            .collect();

        // Stable: ties keep category order
        trends.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        trends.truncate(self.config.top_n);
        trends
    }

    /// Improve categories ranked by description length, longest first.
    pub fn score_friction(&self, classified: &ClassifiedItems) -> Vec<FrictionPoint> {
        let total = classified.total_items();
        let mut sampler = self.sampler();

        let mut points: Vec<FrictionPoint> = classified
            .iter()
            .map(|(category, items)| FrictionPoint {
                category: category.to_string(),
                description: format!(
                    "{} reported {}{}",
                    category,
                    plural(items.len(), "time"),
                    Self::examples(&mut sampler, items)
                ),
                impact: Level::from_share(
                    share(items.len(), total),
                    thresholds::FRICTION_HIGH,
                    thresholds::FRICTION_MEDIUM,
                ),
            })
            .collect();

        points.sort_by(|a, b| b.description.chars().count().cmp(&a.description.chars().count()));
        points.truncate(self.config.top_n);
        points
    }

    /// Action categories in alphabetical order.
    pub fn score_recommendations(&self, classified: &ClassifiedItems) -> Vec<Recommendation> {
        let total = classified.total_items();
        let mut sampler = self.sampler();

        let mut recs: Vec<Recommendation> = classified
            .iter()
            .map(|(category, items)| {
                let denominator = match self.config.priority_basis {
                    PriorityBasis::CategorySize => items.len(),
                    PriorityBasis::BucketShare => total,
                };
                let description = match canned_recommendation(category) {
                    Some(text) => text.to_string(),
                    None => format!(
                        "Address {} raised in {}{}",
                        category.to_lowercase(),
                        plural(items.len(), "action item"),
                        Self::examples(&mut sampler, items)
                    ),
                };
                Recommendation {
                    category: category.to_string(),
                    description,
                    priority: Level::from_share(
                        share(items.len(), denominator),
                        thresholds::PRIORITY_HIGH,
                        thresholds::PRIORITY_MEDIUM,
                    ),
                }
            })
            .collect();

        recs.sort_by(|a, b| a.category.cmp(&b.category));
        recs.truncate(self.config.top_n);

        debug!(
            categories = classified.len(),
            kept = recs.len(),
            basis = ?self.config.priority_basis,
            "Scored recommendations"
        );
        recs
    }
}
