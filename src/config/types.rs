//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/aarlens/) and project (.aarlens/) level configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::constants::{access, insights, storage};
use crate::types::{AarError, Echelon, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Access resolution settings
    pub access: AccessConfig,

    /// Role → echelon policy overrides
    pub hierarchy: HierarchyConfig,

    /// Insight scoring settings
    pub insights: InsightsConfig,

    /// Persistence settings
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            access: AccessConfig::default(),
            hierarchy: HierarchyConfig::default(),
            insights: InsightsConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `AarError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.access.system_admin_username.trim().is_empty() {
            return Err(AarError::Config(
                "access.system_admin_username must not be empty".to_string(),
            ));
        }

        let i = &self.insights;
        if i.min_aars == 0 {
            return Err(AarError::Config(
                "insights.min_aars must be greater than 0".to_string(),
            ));
        }
        if i.top_n == 0 {
            return Err(AarError::Config(
                "insights.top_n must be greater than 0".to_string(),
            ));
        }
        if i.sentence_min_len > i.sentence_max_len {
            return Err(AarError::Config(format!(
                "insights.sentence_min_len ({}) exceeds sentence_max_len ({})",
                i.sentence_min_len, i.sentence_max_len
            )));
        }

        for (role, echelons) in &self.hierarchy.policy {
            if echelons.contains(&Echelon::Unknown) {
                return Err(AarError::Config(format!(
                    "hierarchy.policy.{}: unknown echelon in list",
                    role
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Access
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Reserved username that, with the Admin role, sees everything
    pub system_admin_username: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            system_admin_username: access::DEFAULT_SYSTEM_ADMIN_USERNAME.to_string(),
        }
    }
}

// =============================================================================
// Hierarchy Policy
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Per-role replacement of the built-in echelon set, keyed by role name
    /// (e.g. `"Squad Leader" = ["team", "squad"]`).
    pub policy: BTreeMap<String, Vec<Echelon>>,
}

// =============================================================================
// Insights
// =============================================================================

/// What the recommendation priority share is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PriorityBasis {
    /// `|category| / |category|`: every non-empty category scores High.
    /// Reproduces historical reports.
    #[default]
    CategorySize,
    /// `|category| / |bucket|`, the same share trends and friction use
    BucketShare,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Minimum AARs before categorization runs
    pub min_aars: usize,
    /// Entries kept per report section
    pub top_n: usize,
    /// Sentences quoted per description
    pub max_examples: usize,
    /// Preferred sentence length window
    pub sentence_min_len: usize,
    pub sentence_max_len: usize,
    /// Seed for sentence sampling
    pub sample_seed: u64,
    pub priority_basis: PriorityBasis,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            min_aars: insights::MIN_AARS_FOR_ANALYSIS,
            top_n: insights::TOP_N,
            max_examples: insights::MAX_EXAMPLES,
            sentence_min_len: insights::SENTENCE_MIN_LEN,
            sentence_max_len: insights::SENTENCE_MAX_LEN,
            sample_seed: insights::DEFAULT_SAMPLE_SEED,
            priority_basis: PriorityBasis::default(),
        }
    }
}

// =============================================================================
// Storage
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(storage::PROJECT_DIR).join(storage::DATABASE_FILE),
        }
    }
}
