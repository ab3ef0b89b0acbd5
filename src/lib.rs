//! aarlens - After Action Review access control and insights
//!
//! Resolves which units, users and AARs a member of a military unit
//! hierarchy may see, and turns the visible AARs into a deterministic
//! insight report (trends, friction points, recommendations).
//!
//! ## Quick Start
//!
//! ```ignore
//! use aarlens::{AccessAggregator, Database, HierarchyPolicy, InsightAnalyzer, RuleBasedAnalyzer};
//!
//! let db = Database::open(".aarlens/aarlens.db")?;
//! db.initialize()?;
//! let policy = HierarchyPolicy::builtin();
//! let aars = AccessAggregator::new(&db, &policy).accessible_aars(user_id)?;
//! let report = RuleBasedAnalyzer::default().analyze(&aars);
//! ```
//!
//! ## Modules
//!
//! - [`hierarchy`]: unit tree, role policy and access resolution
//! - [`insights`]: keyword classification, sentence sampling and scoring
//! - [`storage`]: SQLite persistence with connection pooling
//! - [`config`]: layered configuration
//! - [`cli`]: command implementations for the `aarlens` binary

pub mod cli;
pub mod config;
pub mod constants;
pub mod hierarchy;
pub mod insights;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, InsightsConfig, PriorityBasis};

// Error Types
pub use types::error::{AarError, Result, ResultExt};

// Domain
pub use types::{
    Aar, AarItem, Bucket, Echelon, InsightReport, Level, Role, TrainingEvent, Unit, UnitId, User,
    UserId,
};

// Storage
pub use storage::{Database, OrgDirectory, OrgStore, PoolConfig, SharedDatabase};

// =============================================================================
// Engine Re-exports
// =============================================================================

pub use hierarchy::{AccessAggregator, AccessResolver, HierarchyPolicy, UnitTree};
pub use insights::{InsightAnalyzer, RuleBasedAnalyzer};
