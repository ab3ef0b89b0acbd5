//! Keyword category registries, one per bucket.
//!
//! Order is significant: the classifier assigns each item to the FIRST
//! category whose keywords it contains, so reordering entries changes
//! results. Keywords are lowercase and matched by substring.

use crate::types::Bucket;

/// Registry entry
struct CategoryDef {
    name: &'static str,
    keywords: &'static [&'static str],
}

const SUSTAIN_CATEGORIES: &[CategoryDef] = &[
    CategoryDef {
        name: "Communication",
        keywords: &["communication", "radio", "comms", "relay", "signal", "brief"],
    },
    CategoryDef {
        name: "Teamwork",
        keywords: &["team", "together", "cooperation", "coordination", "support"],
    },
    CategoryDef {
        name: "Leadership",
        keywords: &["leader", "initiative", "decision", "command"],
    },
    CategoryDef {
        name: "Planning",
        keywords: &["plan", "rehearsal", "preparation", "timeline"],
    },
    CategoryDef {
        name: "Tactics",
        keywords: &["security", "movement", "maneuver", "formation", "cover", "tactic"],
    },
    CategoryDef {
        name: "Equipment",
        keywords: &["equipment", "gear", "vehicle", "weapon", "maintenance"],
    },
];
const SUSTAIN_DEFAULT: &str = "General Strengths";

const IMPROVE_CATEGORIES: &[CategoryDef] = &[
    CategoryDef {
        name: "Communication Problems",
        keywords: &["communication", "radio", "comms", "relay", "signal", "net call"],
    },
    CategoryDef {
        name: "Planning Issues",
        keywords: &["plan", "rehearsal", "brief", "preparation", "timeline", "opord"],
    },
    CategoryDef {
        name: "Equipment Issues",
        keywords: &[
            "equipment",
            "gear",
            "vehicle",
            "weapon",
            "batter",
            "maintenance",
            "supply",
        ],
    },
    CategoryDef {
        name: "Training Gaps",
        keywords: &["training", "drill", "skill", "proficien", "unfamiliar", "practice"],
    },
    CategoryDef {
        name: "Leadership Challenges",
        keywords: &["leader", "command", "decision", "accountability"],
    },
    CategoryDef {
        name: "Time Management",
        keywords: &["late", "delay", "schedule", "slow", "time"],
    },
];
const IMPROVE_DEFAULT: &str = "General Issues";

const ACTION_CATEGORIES: &[CategoryDef] = &[
    CategoryDef {
        name: "Communication",
        keywords: &["communication", "radio", "comms", "pace plan", "signal"],
    },
    CategoryDef {
        name: "Training",
        keywords: &["training", "train", "drill", "practice", "rehearse", "class"],
    },
    CategoryDef {
        name: "Equipment",
        keywords: &[
            "equipment",
            "gear",
            "vehicle",
            "weapon",
            "maintenance",
            "batter",
            "supply",
            "inventory",
        ],
    },
    CategoryDef {
        name: "Planning",
        keywords: &["plan", "timeline", "schedule", "preparation", "brief"],
    },
    CategoryDef {
        name: "Leadership",
        keywords: &["leader", "mentor", "counsel", "accountability", "delegat"],
    },
    CategoryDef {
        name: "Safety",
        keywords: &["safety", "risk", "injur", "medical", "hydration", "hazard"],
    },
];
const ACTION_DEFAULT: &str = "Process Improvements";

/// One named keyword set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new<S: AsRef<str>>(name: impl Into<String>, keywords: &[S]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords
                .iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// `lowered` must already be lowercase.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Ordered category list for one bucket plus the catch-all category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketConfig {
    pub bucket: Bucket,
    pub categories: Vec<CategoryRule>,
    pub default_category: String,
}

impl BucketConfig {
    pub fn new(bucket: Bucket, default_category: impl Into<String>) -> Self {
        Self {
            bucket,
            categories: Vec::new(),
            default_category: default_category.into(),
        }
    }

    /// Append a category after the existing ones.
    pub fn with_category<S: AsRef<str>>(mut self, name: impl Into<String>, keywords: &[S]) -> Self {
        self.categories.push(CategoryRule::new(name, keywords));
        self
    }

    pub fn sustain() -> Self {
        Self::from_registry(Bucket::Sustain, SUSTAIN_CATEGORIES, SUSTAIN_DEFAULT)
    }

    pub fn improve() -> Self {
        Self::from_registry(Bucket::Improve, IMPROVE_CATEGORIES, IMPROVE_DEFAULT)
    }

    pub fn action() -> Self {
        Self::from_registry(Bucket::Action, ACTION_CATEGORIES, ACTION_DEFAULT)
    }

    pub fn for_bucket(bucket: Bucket) -> Self {
        match bucket {
            Bucket::Sustain => Self::sustain(),
            Bucket::Improve => Self::improve(),
            Bucket::Action => Self::action(),
        }
    }

    fn from_registry(bucket: Bucket, defs: &[CategoryDef], default_category: &str) -> Self {
        defs.iter().fold(Self::new(bucket, default_category), |cfg, def| {
            cfg.with_category(def.name, def.keywords)
        })
    }

    /// Name of the first matching category, if any.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.categories
            .iter()
            .find(|c| c.matches(&lowered))
            .map(|c| c.name.as_str())
    }

    /// Category names in evaluation order, default last.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories
            .iter()
            .map(|c| c.name.as_str())
            .chain(std::iter::once(self.default_category.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registries_have_six_categories() {
        for bucket in Bucket::ALL {
            let cfg = BucketConfig::for_bucket(bucket);
            assert_eq!(cfg.categories.len(), 6, "{}", bucket);
            assert_eq!(cfg.bucket, bucket);
        }
    }

    #[test]
    fn test_first_match_wins_over_later_categories() {
        let cfg = BucketConfig::improve();
        // Mentions both radio (Communication) and batteries (Equipment)
        assert_eq!(
            cfg.first_match("Radio batteries died before the second phase"),
            Some("Communication Problems")
        );
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let cfg = BucketConfig::sustain();
        assert_eq!(cfg.first_match("SECURITY was tight"), Some("Tactics"));
    }

    #[test]
    fn test_no_match() {
        let cfg = BucketConfig::improve();
        assert_eq!(cfg.first_match("Morale dipped after midnight"), None);
    }

    #[test]
    fn test_category_names_end_with_default() {
        let cfg = BucketConfig::action();
        let names = cfg.category_names();
        assert_eq!(names.first(), Some(&"Communication"));
        assert_eq!(names.last(), Some(&"Process Improvements"));
    }

    #[test]
    fn test_custom_config_keywords_are_lowercased() {
        let cfg = BucketConfig::new(Bucket::Sustain, "Other").with_category("Fires", &["ARTY", "Mortar"]);
        assert_eq!(cfg.first_match("arty was on target"), Some("Fires"));
        assert_eq!(cfg.first_match("MORTAR support"), Some("Fires"));
    }
}
