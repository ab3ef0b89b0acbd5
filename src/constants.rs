//! Global Constants
//!
//! Centralized constants for access resolution and insight scoring.
//! All magic numbers should be defined here with documentation.

/// Access resolution constants
pub mod access {
    /// Username reserved for the system administrator. Combined with the
    /// Admin role it grants global visibility.
    pub const DEFAULT_SYSTEM_ADMIN_USERNAME: &str = "admin";

    /// Length of generated unit referral codes
    pub const REFERRAL_CODE_LEN: usize = 8;

    /// Highest echelon whose direct children count as lateral peers of one
    /// another. Sibling companies under a battalion stay separate.
    pub const LATERAL_PEER_CEILING: crate::types::Echelon = crate::types::Echelon::Company;
}

/// Insight scoring thresholds. Shares are compared with strict `>`.
pub mod thresholds {
    /// Trend severity
    pub const TREND_HIGH: f64 = 0.7;
    pub const TREND_MEDIUM: f64 = 0.3;

    /// Friction impact
    pub const FRICTION_HIGH: f64 = 0.5;
    pub const FRICTION_MEDIUM: f64 = 0.2;

    /// Recommendation priority
    pub const PRIORITY_HIGH: f64 = 0.6;
    pub const PRIORITY_MEDIUM: f64 = 0.3;
}

/// Insight report shaping
pub mod insights {
    /// Below this many AARs a report carries only the insufficient-data trend
    pub const MIN_AARS_FOR_ANALYSIS: usize = 3;

    /// Category name of the insufficient-data trend
    pub const INSUFFICIENT_DATA_CATEGORY: &str = "Insufficient Data";

    /// Entries kept per report section
    pub const TOP_N: usize = 3;

    /// Representative sentences quoted per description
    pub const MAX_EXAMPLES: usize = 3;

    /// Preferred sentence length window (characters, inclusive)
    pub const SENTENCE_MIN_LEN: usize = 10;
    pub const SENTENCE_MAX_LEN: usize = 100;

    /// Default RNG seed for sentence sampling
    pub const DEFAULT_SAMPLE_SEED: u64 = 0x5EED;
}

/// Storage constants
pub mod storage {
    /// Project data directory
    pub const PROJECT_DIR: &str = ".aarlens";

    /// Database file inside the project directory
    pub const DATABASE_FILE: &str = "aarlens.db";

    /// Environment variable prefix for configuration overrides
    pub const ENV_PREFIX: &str = "AARLENS_";
}
