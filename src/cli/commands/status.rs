//! Status Command
//!
//! Display project status.

use crate::cli::ui::Output;
use crate::cli::util::{is_initialized, open_database};
use crate::config::ConfigLoader;
use crate::storage::OrgStore;
use crate::types::Result;

pub fn run(format: &str) -> Result<()> {
    let json_output = format == "json";

    if !is_initialized() {
        if json_output {
            println!("{{\"status\": \"not_initialized\"}}");
        } else {
            println!("aarlens Status");
            println!("══════════════════════════════════════");
            println!("Not initialized. Run 'aarlens init' first.");
        }
        // Informational: not an error
        return Ok(());
    }

    let config = ConfigLoader::load()?;
    let db = open_database(&config.storage.database_path)?;
    let stats = OrgStore::new(&db).stats()?;
    let schema_version = db.version()?;

    if json_output {
        let status = serde_json::json!({
            "status": "initialized",
            "database": config.storage.database_path,
            "schema_version": schema_version,
            "counts": {
                "units": stats.units,
                "users": stats.users,
                "events": stats.events,
                "aars": stats.aars
            },
            "priority_basis": config.insights.priority_basis,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        let out = Output::new();
        println!("aarlens Status");
        println!("══════════════════════════════════════");
        out.field("Database", config.storage.database_path.display());
        out.field("Schema", schema_version);
        println!();
        out.field("Units", stats.units);
        out.field("Users", stats.users);
        out.field("Events", stats.events);
        out.field("AARs", stats.aars);
    }

    Ok(())
}
