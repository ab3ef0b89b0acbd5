//! Hierarchical Access Resolution
//!
//! - [`tree`]: read-only unit forest
//! - [`policy`]: role → visible echelons table
//! - [`resolver`]: per-unit access decision
//! - [`aggregator`]: accessible units, users and AARs for a caller
//!
//! Everything here is synchronous and reads only immutable snapshots, so
//! any number of requests can resolve access concurrently without locking.

pub mod aggregator;
pub mod policy;
pub mod resolver;
pub mod tree;

pub use aggregator::AccessAggregator;
pub use policy::HierarchyPolicy;
pub use resolver::AccessResolver;
pub use tree::UnitTree;
