//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, ConfigLoader};
use crate::constants::storage::PROJECT_DIR;
use crate::hierarchy::HierarchyPolicy;
use crate::storage::{Database, OrgStore, SharedDatabase};
use crate::types::{AarError, Result, User};

/// Command execution context
///
/// Loaded once per command: validated config, opened database and the
/// effective hierarchy policy.
#[derive(Clone)]
pub struct CommandContext {
    /// Shared database handle
    pub db: SharedDatabase,
    /// Loaded configuration
    pub config: Config,
    /// Built-in policy with config overrides applied
    pub policy: Arc<HierarchyPolicy>,
}

impl CommandContext {
    /// Validates initialization, loads config, and opens the database.
    pub fn load() -> Result<Self> {
        require_initialized()?;
        let config = ConfigLoader::load()?;
        let db = open_database(&config.storage.database_path)?;
        let policy = HierarchyPolicy::from_config(&config.hierarchy);

        Ok(Self {
            db: Arc::new(db),
            config,
            policy: Arc::new(policy),
        })
    }

    pub fn store(&self) -> OrgStore<'_> {
        OrgStore::new(&self.db)
    }

    pub fn admin_username(&self) -> &str {
        &self.config.access.system_admin_username
    }

    /// Resolve `--user`: a numeric id or a username.
    pub fn resolve_user(&self, reference: &str) -> Result<User> {
        let store = self.store();
        let found = match reference.parse::<i64>() {
            Ok(id) => store.user(id)?,
            Err(_) => store.user_by_username(reference)?,
        };

        found.ok_or_else(|| AarError::not_found("user", reference))
    }
}

/// Require the project directory to exist.
pub fn require_initialized() -> Result<PathBuf> {
    let dir = Path::new(PROJECT_DIR);

    if !dir.exists() {
        return Err(AarError::NotInitialized);
    }

    Ok(dir.to_path_buf())
}

pub fn is_initialized() -> bool {
    Path::new(PROJECT_DIR).exists()
}

/// Open an existing database; a missing file means `init` never ran.
pub fn open_database(path: &Path) -> Result<Database> {
    if !path.exists() {
        return Err(AarError::NotInitialized);
    }

    let db = Database::open(path)?;
    // Brings older files up to the current schema
    db.initialize()?;
    Ok(db)
}

/// Create and initialize the database, creating parent directories.
pub fn create_database(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::open(path)?;
    db.initialize()?;

    Ok(db)
}
