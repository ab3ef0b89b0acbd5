//! Init Command
//!
//! Initialize aarlens in the current directory.

use crate::cli::ui::Output;
use crate::cli::util::{create_database, is_initialized};
use crate::config::ConfigLoader;
use crate::storage::OrgStore;
use crate::types::{AarError, Result, Role};

pub fn run(force: bool) -> Result<()> {
    if is_initialized() && !force {
        return Err(AarError::Config(
            "Already initialized. Use --force to re-run initialization.".to_string(),
        ));
    }

    let project_dir = ConfigLoader::init_project()?;

    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    let config = ConfigLoader::load()?;
    let db = create_database(&config.storage.database_path)?;

    // The reserved administrator must exist before anyone can import data
    let store = OrgStore::new(&db);
    let admin = &config.access.system_admin_username;
    let created_admin = if store.user_by_username(admin)?.is_none() {
        store.create_user(admin, Role::Admin)?;
        true
    } else {
        false
    };

    let out = Output::new();
    out.success(&format!("Initialized aarlens in {}/", project_dir.display()));
    out.field("Database", config.storage.database_path.display());
    if created_admin {
        out.field("Admin", admin);
    }
    println!();
    println!("Next steps:");
    println!("  1. Run 'aarlens import <fixture.json>' to load units, users and AARs");
    println!("  2. Run 'aarlens insights --user <name>' to generate a report");

    Ok(())
}
