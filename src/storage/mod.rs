pub mod database;
pub mod directory;
pub mod fixture;
pub mod org_store;

pub use database::{Database, PoolConfig, SharedDatabase};
pub use directory::{MemoryDirectory, OrgDirectory};
pub use fixture::{Fixture, FixtureAssignment, ImportSummary, Participation};
pub use org_store::{OrgStore, StoreStats};
